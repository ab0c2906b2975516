//! The elaborated front-end tree this crate consumes.
//!
//! The real front end (parser, elaborator, constant folder) is an external
//! collaborator and is not part of this crate. These types are the contract
//! it is expected to hand us: a fully elaborated, immutable instance
//! hierarchy with evaluated parameters, resolved symbols, and source
//! locations already attached. [`crate::testing`] provides a builder that
//! constructs trees of these types directly, standing in for a real parser
//! in tests and demos.
//!
//! The tree is built from plain, `Arc`-shared data rather than trait
//! objects: it is read-only for the duration of a single [`crate::driver`]
//! call, and plain owned data shares cheaply and safely across the worker
//! pool without the lifetime gymnastics a borrowed AST would require.

use std::sync::Arc;

/// A location in the original source text, carried through for diagnostics
/// and for any downstream back end that re-emits source-mapped output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceLoc {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceLoc {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Stable per-definition identity used for [`crate::plan::PlanKey`] keying.
/// The front end guarantees two instances of the same textual module
/// definition share the same `DefinitionId`, and that distinct definitions
/// never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionId(pub u64);

/// The root of an elaborated compilation: one or more top-level instances.
#[derive(Debug, Clone)]
pub struct ElaboratedRoot {
    pub top_instances: Vec<Arc<ElaboratedInstance>>,
}

#[derive(Debug, Clone)]
pub struct ParamBinding {
    pub name: String,
    /// Already-evaluated, canonical textual value (e.g. `"8"`, `"1'b1"`).
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ElaboratedInstance {
    pub instance_name: String,
    pub definition: DefinitionId,
    pub is_blackbox: bool,
    pub parameters: Vec<ParamBinding>,
    pub port_connections: Vec<PortConnection>,
    pub body: Arc<ElaboratedBody>,
}

/// How one of the instantiated module's ports is wired at the call site,
/// in terms of the *instantiating* module's own symbols/expressions.
#[derive(Debug, Clone)]
pub enum PortConnectionKind {
    /// An expression in the parent scope drives this input port.
    Input(Expr),
    /// A parent-scope signal name receives this output port's value.
    Output(String),
    /// A parent-scope signal name is wired to this inout port.
    Inout(String),
    Unconnected,
}

#[derive(Debug, Clone)]
pub struct PortConnection {
    pub port_name: String,
    pub kind: PortConnectionKind,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Logic,
    Bit,
    Integer,
    Real,
    Event,
    Time,
    String,
}

#[derive(Debug, Clone)]
pub struct PortDecl {
    pub name: String,
    pub direction: PortDirection,
    pub width: i32,
    pub is_signed: bool,
    pub value_type: ValueType,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Net,
    Variable,
    Memory,
}

#[derive(Debug, Clone, Copy)]
pub struct UnpackedDim {
    pub extent: i64,
}

#[derive(Debug, Clone)]
pub struct SignalDecl {
    pub name: String,
    pub kind: SignalKind,
    pub width: i32,
    pub is_signed: bool,
    pub value_type: ValueType,
    /// Number of rows, for `SignalKind::Memory`; `0` otherwise.
    pub memory_rows: i64,
    pub unpacked_dims: Vec<UnpackedDim>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcKind {
    Initial,
    Final,
    AlwaysComb,
    AlwaysLatch,
    AlwaysFF,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Posedge,
    Negedge,
}

#[derive(Debug, Clone)]
pub struct ProcessDecl {
    pub kind: ProcKind,
    pub event_edges: Vec<(EdgeKind, Expr)>,
    pub body: Vec<Stmt>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct ContinuousAssign {
    pub target: LValue,
    pub value: Expr,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct DpiImportDecl {
    pub symbol: String,
    pub args_direction: Vec<String>,
    pub args_width: Vec<i64>,
    pub args_name: Vec<String>,
    pub args_signed: Vec<bool>,
    pub args_type: Vec<String>,
    pub has_return: bool,
    pub return_width: i64,
    pub return_signed: bool,
    pub return_type: String,
}

/// Initializer attached to a declared register/variable (`= <literal>` on
/// the declaration, or a procedural `initial` assignment the front end
/// recognizes as a pure reset value). Kept as raw text; the core never
/// evaluates it (see the `$random` open question in `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct RegisterInitDecl {
    pub target: String,
    pub init_value: String,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryInitKind {
    Literal,
    ReadMemH,
    ReadMemB,
}

#[derive(Debug, Clone)]
pub struct MemoryInitDecl {
    pub memory: String,
    pub kind: MemoryInitKind,
    pub file: String,
    pub init_value: String,
    pub start: i64,
    pub len: i64,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct ElaboratedBody {
    pub module_name: String,
    pub ports: Vec<PortDecl>,
    pub signals: Vec<SignalDecl>,
    pub child_instances: Vec<Arc<ElaboratedInstance>>,
    pub processes: Vec<ProcessDecl>,
    pub continuous_assigns: Vec<ContinuousAssign>,
    pub dpi_imports: Vec<DpiImportDecl>,
    pub register_inits: Vec<RegisterInitDecl>,
    pub memory_inits: Vec<MemoryInitDecl>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    ReduceAnd,
    ReduceOr,
    ReduceXor,
    ReduceNand,
    ReduceNor,
    ReduceXnor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    LogicalAnd,
    LogicalOr,
    Shl,
    Shr,
    AShr,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A literal retains its full source text (`"8'hAB"`) so the lowerer can
/// parse width/sign/radix exactly as the front end saw it.
#[derive(Debug, Clone)]
pub struct LiteralExpr {
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(LiteralExpr),
    Ref(String),
    HierRef(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Concat(Vec<Expr>),
    Replicate(Box<Expr>, Box<Expr>),
    BitSelect { base: Box<Expr>, index: Box<Expr> },
    PartSelect { base: Box<Expr>, left: Box<Expr>, right: Box<Expr> },
    IndexedPartSelect { base: Box<Expr>, base_index: Box<Expr>, width: u32, indexed_up: bool },
    MemberSelect { base: Box<Expr>, member: String },
    SystemCall { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: SourceLoc,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: SourceLoc) -> Self {
        Self { kind, loc }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(ExprKind::Literal(LiteralExpr { text: text.into() }), SourceLoc::unknown())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ref(name.into()), SourceLoc::unknown())
    }
}

/// The assignable surface a [`Stmt::Assign`] or `ContinuousAssign` targets.
/// Slices are expressions so dynamic (variable) indices lower naturally.
#[derive(Debug, Clone)]
pub struct LValue {
    pub base: String,
    pub slices: Vec<LValueSlice>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub enum LValueSlice {
    BitSelect(Expr),
    PartSelect { left: Expr, right: Expr },
    IndexedPartSelect { base_index: Expr, width: u32, indexed_up: bool },
    MemberSelect(String),
}

#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        loc: SourceLoc,
    },
    Case {
        selector: Expr,
        branches: Vec<CaseBranch>,
        default: Option<Vec<Stmt>>,
        loc: SourceLoc,
    },
    Assign {
        blocking: bool,
        target: LValue,
        value: Expr,
        loc: SourceLoc,
    },
    /// Unrollable only when `init`/`bound`/`step` are compile-time constant
    /// with respect to already-bound parameters; otherwise the lowerer
    /// rejects it with a `Todo` diagnostic.
    For {
        var: String,
        init: Expr,
        bound: Expr,
        ascending: bool,
        step: Expr,
        body: Vec<Stmt>,
        loc: SourceLoc,
    },
    /// `while`/`do-while`/`forever` — always unsupported; retained as a
    /// distinct variant purely so the lowerer can name the construct in its
    /// diagnostic rather than collapsing to a generic "unknown statement".
    UnboundedLoop {
        loc: SourceLoc,
    },
    /// `if (... matches ...)` — SystemVerilog pattern-matching conditional.
    /// Always unsupported, same reasoning as `UnboundedLoop`.
    PatternIf {
        loc: SourceLoc,
    },
    /// `case (...) matches ...` — SystemVerilog pattern-matching case.
    /// Always unsupported, same reasoning as `UnboundedLoop`.
    PatternCase {
        loc: SourceLoc,
    },
    EventControl {
        edges: Vec<(EdgeKind, Expr)>,
        body: Vec<Stmt>,
        loc: SourceLoc,
    },
    SystemTaskCall {
        name: String,
        args: Vec<Expr>,
        loc: SourceLoc,
    },
    DpiCall {
        target_import: String,
        in_args: Vec<Expr>,
        out_targets: Vec<LValue>,
        result_target: Option<LValue>,
        loc: SourceLoc,
    },
    Block {
        body: Vec<Stmt>,
    },
}
