//! Fluent builders for constructing [`crate::ast`] trees directly, standing
//! in for a real front end in tests. Every builder method consumes and
//! returns `Self` so a fixture reads top to bottom as the module's own
//! declaration order would.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::ast::{
    CaseBranch, ContinuousAssign, DefinitionId, EdgeKind, ElaboratedBody, ElaboratedInstance, Expr, ExprKind,
    LValue, LValueSlice, LiteralExpr, MemoryInitDecl, MemoryInitKind, ParamBinding, PortConnection,
    PortConnectionKind, PortDecl, PortDirection, ProcKind, ProcessDecl, RegisterInitDecl, SignalDecl, SignalKind,
    SourceLoc, Stmt, UnaryOp, BinaryOp, UnpackedDim, ValueType,
};

/// Hands out a fresh [`DefinitionId`] per call; fixtures that instantiate
/// the same child module twice should reuse the first call's id instead of
/// calling this again; see e.g. [`crate::testing::fixtures`].
pub fn fresh_definition_id() -> DefinitionId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    DefinitionId(NEXT.fetch_add(1, Ordering::Relaxed))
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

#[must_use]
pub fn lit(text: impl Into<String>) -> Expr {
    Expr::new(ExprKind::Literal(LiteralExpr { text: text.into() }), SourceLoc::unknown())
}

#[must_use]
pub fn sig(name: impl Into<String>) -> Expr {
    Expr::new(ExprKind::Ref(name.into()), SourceLoc::unknown())
}

#[must_use]
pub fn hier(path: impl Into<String>) -> Expr {
    Expr::new(ExprKind::HierRef(path.into()), SourceLoc::unknown())
}

#[must_use]
pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::new(ExprKind::Unary(op, Box::new(operand)), SourceLoc::unknown())
}

#[must_use]
pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), SourceLoc::unknown())
}

#[must_use]
pub fn ternary(cond: Expr, then_val: Expr, else_val: Expr) -> Expr {
    Expr::new(
        ExprKind::Ternary(Box::new(cond), Box::new(then_val), Box::new(else_val)),
        SourceLoc::unknown(),
    )
}

#[must_use]
pub fn concat(parts: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Concat(parts), SourceLoc::unknown())
}

#[must_use]
pub fn replicate(count: Expr, value: Expr) -> Expr {
    Expr::new(ExprKind::Replicate(Box::new(count), Box::new(value)), SourceLoc::unknown())
}

#[must_use]
pub fn bit_select(base: Expr, index: Expr) -> Expr {
    Expr::new(
        ExprKind::BitSelect { base: Box::new(base), index: Box::new(index) },
        SourceLoc::unknown(),
    )
}

#[must_use]
pub fn part_select(base: Expr, left: Expr, right: Expr) -> Expr {
    Expr::new(
        ExprKind::PartSelect { base: Box::new(base), left: Box::new(left), right: Box::new(right) },
        SourceLoc::unknown(),
    )
}

#[must_use]
pub fn member_select(base: Expr, member: impl Into<String>) -> Expr {
    Expr::new(
        ExprKind::MemberSelect { base: Box::new(base), member: member.into() },
        SourceLoc::unknown(),
    )
}

#[must_use]
pub fn system_call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::SystemCall { name: name.into(), args }, SourceLoc::unknown())
}

// ---------------------------------------------------------------------
// LValues and statements
// ---------------------------------------------------------------------

#[must_use]
pub fn lv(name: impl Into<String>) -> LValue {
    LValue { base: name.into(), slices: Vec::new(), loc: SourceLoc::unknown() }
}

#[must_use]
pub fn lv_bit(name: impl Into<String>, index: Expr) -> LValue {
    LValue { base: name.into(), slices: vec![LValueSlice::BitSelect(index)], loc: SourceLoc::unknown() }
}

#[must_use]
pub fn lv_part(name: impl Into<String>, left: Expr, right: Expr) -> LValue {
    LValue { base: name.into(), slices: vec![LValueSlice::PartSelect { left, right }], loc: SourceLoc::unknown() }
}

#[must_use]
pub fn lv_member(name: impl Into<String>, member: impl Into<String>) -> LValue {
    LValue { base: name.into(), slices: vec![LValueSlice::MemberSelect(member.into())], loc: SourceLoc::unknown() }
}

#[must_use]
pub fn lv_indexed(name: impl Into<String>, base_index: Expr, width: u32, indexed_up: bool) -> LValue {
    LValue {
        base: name.into(),
        slices: vec![LValueSlice::IndexedPartSelect { base_index, width, indexed_up }],
        loc: SourceLoc::unknown(),
    }
}

/// `while`/`do-while`/`forever` stand-in: the lowerer rejects every
/// [`Stmt::UnboundedLoop`] outright regardless of which source construct
/// produced it (see `ast::Stmt::UnboundedLoop`'s doc comment).
#[must_use]
pub fn unbounded_loop() -> Stmt {
    Stmt::UnboundedLoop { loc: SourceLoc::unknown() }
}

/// `if (... matches ...)` stand-in: always rejected by the lowerer, same
/// as [`unbounded_loop`].
#[must_use]
pub fn pattern_if() -> Stmt {
    Stmt::PatternIf { loc: SourceLoc::unknown() }
}

/// `case (...) matches ...` stand-in: always rejected by the lowerer, same
/// as [`unbounded_loop`].
#[must_use]
pub fn pattern_case() -> Stmt {
    Stmt::PatternCase { loc: SourceLoc::unknown() }
}

#[must_use]
pub fn assign_blocking(target: LValue, value: Expr) -> Stmt {
    Stmt::Assign { blocking: true, target, value, loc: SourceLoc::unknown() }
}

#[must_use]
pub fn assign_non_blocking(target: LValue, value: Expr) -> Stmt {
    Stmt::Assign { blocking: false, target, value, loc: SourceLoc::unknown() }
}

#[must_use]
pub fn if_stmt(cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Stmt {
    Stmt::If { cond, then_branch, else_branch, loc: SourceLoc::unknown() }
}

#[must_use]
pub fn case_stmt(selector: Expr, branches: Vec<CaseBranch>, default: Option<Vec<Stmt>>) -> Stmt {
    Stmt::Case { selector, branches, default, loc: SourceLoc::unknown() }
}

#[must_use]
pub fn case_branch(labels: Vec<Expr>, body: Vec<Stmt>) -> CaseBranch {
    CaseBranch { labels, body }
}

#[must_use]
pub fn system_task_call(name: impl Into<String>, args: Vec<Expr>) -> Stmt {
    Stmt::SystemTaskCall { name: name.into(), args, loc: SourceLoc::unknown() }
}

#[must_use]
pub fn dpi_call(
    target_import: impl Into<String>,
    in_args: Vec<Expr>,
    out_targets: Vec<LValue>,
    result_target: Option<LValue>,
) -> Stmt {
    Stmt::DpiCall {
        target_import: target_import.into(),
        in_args,
        out_targets,
        result_target,
        loc: SourceLoc::unknown(),
    }
}

// ---------------------------------------------------------------------
// Module / instance builders
// ---------------------------------------------------------------------

/// Builds one [`ElaboratedBody`] declaration-by-declaration.
#[derive(Default)]
pub struct ModuleBuilder {
    name: String,
    ports: Vec<PortDecl>,
    signals: Vec<SignalDecl>,
    child_instances: Vec<Arc<ElaboratedInstance>>,
    processes: Vec<ProcessDecl>,
    continuous_assigns: Vec<ContinuousAssign>,
    dpi_imports: Vec<crate::ast::DpiImportDecl>,
    register_inits: Vec<RegisterInitDecl>,
    memory_inits: Vec<MemoryInitDecl>,
}

impl ModuleBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    #[must_use]
    pub fn port(mut self, name: impl Into<String>, direction: PortDirection, width: i32, is_signed: bool) -> Self {
        self.ports.push(PortDecl {
            name: name.into(),
            direction,
            width,
            is_signed,
            value_type: ValueType::Logic,
            loc: SourceLoc::unknown(),
        });
        self
    }

    #[must_use]
    pub fn input(self, name: impl Into<String>, width: i32, is_signed: bool) -> Self {
        self.port(name, PortDirection::Input, width, is_signed)
    }

    #[must_use]
    pub fn output(self, name: impl Into<String>, width: i32, is_signed: bool) -> Self {
        self.port(name, PortDirection::Output, width, is_signed)
    }

    #[must_use]
    pub fn inout(self, name: impl Into<String>, width: i32, is_signed: bool) -> Self {
        self.port(name, PortDirection::Inout, width, is_signed)
    }

    fn signal(mut self, name: impl Into<String>, kind: SignalKind, width: i32, is_signed: bool) -> Self {
        self.signals.push(SignalDecl {
            name: name.into(),
            kind,
            width,
            is_signed,
            value_type: ValueType::Logic,
            memory_rows: 0,
            unpacked_dims: Vec::new(),
            loc: SourceLoc::unknown(),
        });
        self
    }

    #[must_use]
    pub fn net(self, name: impl Into<String>, width: i32, is_signed: bool) -> Self {
        self.signal(name, SignalKind::Net, width, is_signed)
    }

    #[must_use]
    pub fn variable(self, name: impl Into<String>, width: i32, is_signed: bool) -> Self {
        self.signal(name, SignalKind::Variable, width, is_signed)
    }

    #[must_use]
    pub fn memory(mut self, name: impl Into<String>, width: i32, rows: i64) -> Self {
        self.signals.push(SignalDecl {
            name: name.into(),
            kind: SignalKind::Memory,
            width,
            is_signed: false,
            value_type: ValueType::Logic,
            memory_rows: rows,
            unpacked_dims: vec![UnpackedDim { extent: rows }],
            loc: SourceLoc::unknown(),
        });
        self
    }

    #[must_use]
    pub fn process(mut self, kind: ProcKind, event_edges: Vec<(EdgeKind, Expr)>, body: Vec<Stmt>) -> Self {
        self.processes.push(ProcessDecl { kind, event_edges, body, loc: SourceLoc::unknown() });
        self
    }

    #[must_use]
    pub fn always_comb(self, body: Vec<Stmt>) -> Self {
        self.process(ProcKind::AlwaysComb, Vec::new(), body)
    }

    #[must_use]
    pub fn always_latch(self, body: Vec<Stmt>) -> Self {
        self.process(ProcKind::AlwaysLatch, Vec::new(), body)
    }

    #[must_use]
    pub fn always_ff(self, edges: Vec<(EdgeKind, Expr)>, body: Vec<Stmt>) -> Self {
        self.process(ProcKind::AlwaysFF, edges, body)
    }

    #[must_use]
    pub fn initial(self, body: Vec<Stmt>) -> Self {
        self.process(ProcKind::Initial, Vec::new(), body)
    }

    #[must_use]
    pub fn assign(mut self, target: impl Into<String>, value: Expr) -> Self {
        self.continuous_assigns.push(ContinuousAssign { target: lv(target), value, loc: SourceLoc::unknown() });
        self
    }

    #[must_use]
    pub fn assign_lv(mut self, target: LValue, value: Expr) -> Self {
        self.continuous_assigns.push(ContinuousAssign { target, value, loc: SourceLoc::unknown() });
        self
    }

    #[must_use]
    pub fn register_init(mut self, target: impl Into<String>, init_value: impl Into<String>) -> Self {
        self.register_inits.push(RegisterInitDecl {
            target: target.into(),
            init_value: init_value.into(),
            loc: SourceLoc::unknown(),
        });
        self
    }

    #[must_use]
    pub fn memory_init_literal(mut self, memory: impl Into<String>, init_value: impl Into<String>) -> Self {
        self.memory_inits.push(MemoryInitDecl {
            memory: memory.into(),
            kind: MemoryInitKind::Literal,
            file: String::new(),
            init_value: init_value.into(),
            start: 0,
            len: 0,
            loc: SourceLoc::unknown(),
        });
        self
    }

    #[must_use]
    pub fn dpi_import(mut self, decl: crate::ast::DpiImportDecl) -> Self {
        self.dpi_imports.push(decl);
        self
    }

    #[must_use]
    pub fn instance(mut self, instance: ElaboratedInstance) -> Self {
        self.child_instances.push(Arc::new(instance));
        self
    }

    #[must_use]
    pub fn build(self) -> ElaboratedBody {
        ElaboratedBody {
            module_name: self.name,
            ports: self.ports,
            signals: self.signals,
            child_instances: self.child_instances,
            processes: self.processes,
            continuous_assigns: self.continuous_assigns,
            dpi_imports: self.dpi_imports,
            register_inits: self.register_inits,
            memory_inits: self.memory_inits,
            loc: SourceLoc::unknown(),
        }
    }

    #[must_use]
    pub fn build_arc(self) -> Arc<ElaboratedBody> {
        Arc::new(self.build())
    }
}

/// Builds one [`ElaboratedInstance`] — a child instantiation inside a
/// [`ModuleBuilder`], or a top-level instance for [`crate::ast::ElaboratedRoot`].
pub struct InstanceBuilder {
    instance_name: String,
    definition: DefinitionId,
    is_blackbox: bool,
    parameters: Vec<ParamBinding>,
    port_connections: Vec<PortConnection>,
    body: Arc<ElaboratedBody>,
}

impl InstanceBuilder {
    #[must_use]
    pub fn new(instance_name: impl Into<String>, definition: DefinitionId, body: Arc<ElaboratedBody>) -> Self {
        Self {
            instance_name: instance_name.into(),
            definition,
            is_blackbox: false,
            parameters: Vec::new(),
            port_connections: Vec::new(),
            body,
        }
    }

    #[must_use]
    pub fn blackbox(mut self) -> Self {
        self.is_blackbox = true;
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(ParamBinding { name: name.into(), value: value.into() });
        self
    }

    fn connect(mut self, port_name: impl Into<String>, kind: PortConnectionKind) -> Self {
        self.port_connections.push(PortConnection { port_name: port_name.into(), kind, loc: SourceLoc::unknown() });
        self
    }

    #[must_use]
    pub fn connect_input(self, port_name: impl Into<String>, value: Expr) -> Self {
        self.connect(port_name, PortConnectionKind::Input(value))
    }

    #[must_use]
    pub fn connect_output(self, port_name: impl Into<String>, signal: impl Into<String>) -> Self {
        self.connect(port_name, PortConnectionKind::Output(signal.into()))
    }

    #[must_use]
    pub fn connect_inout(self, port_name: impl Into<String>, signal: impl Into<String>) -> Self {
        self.connect(port_name, PortConnectionKind::Inout(signal.into()))
    }

    #[must_use]
    pub fn unconnected(self, port_name: impl Into<String>) -> Self {
        self.connect(port_name, PortConnectionKind::Unconnected)
    }

    #[must_use]
    pub fn build(self) -> ElaboratedInstance {
        ElaboratedInstance {
            instance_name: self.instance_name,
            definition: self.definition,
            is_blackbox: self.is_blackbox,
            parameters: self.parameters,
            port_connections: self.port_connections,
            body: self.body,
        }
    }

    #[must_use]
    pub fn build_arc(self) -> Arc<ElaboratedInstance> {
        Arc::new(self.build())
    }
}
