//! The Statement Lowerer (§4.4): walks one module body's processes and
//! continuous assigns, turning procedural control flow into a flat list of
//! guarded [`WriteIntent`]s plus an arena of pre-SSA [`ExprNode`]s. This is
//! the largest stage of the pipeline — everything downstream (the
//! Write-Back Resolver, the Graph Assembler) operates on its output rather
//! than walking the original AST again.
//!
//! Guards compose the way a priority-encoded `if`/`case` chain would: an
//! `if` pushes its condition (and the negation, for the else arm) onto a
//! stack that every nested write ANDs itself against; a `case` does the
//! same per branch, ORing multiple labels together and synthesizing the
//! default arm's guard as the negation of every other branch's.

use crate::ast::{
    BinaryOp, CaseBranch, ContinuousAssign, DpiImportDecl, ElaboratedInstance, ElaboratedBody, Expr,
    ExprKind, LValue, LValueSlice, PortConnectionKind, ProcKind as AstProcKind, ProcessDecl,
    SourceLoc, Stmt, UnaryOp,
};
use crate::diagnostics::Diagnostics;
use crate::plan::{
    ControlDomain, DpiCallStmt, DpiImportInfo, EventEdge, ExprNode, ExprNodeId, ExprNodeKind,
    InstanceConnection, LoweredStmt, LoweringPlan, MemoryInit, MemoryInitKind as PlanMemoryInitKind,
    MemoryReadPort, MemoryWritePort, ModulePlan, ProcKind, RegisterInit, SignalKind, SystemTaskStmt,
    WriteIntent, WriteSlice,
};
use crate::rhg::OperationKind;

pub fn lower_module(
    plan: &mut ModulePlan,
    body: &ElaboratedBody,
    diagnostics: &Diagnostics,
    max_loop_iterations: u32,
) -> LoweringPlan {
    let mut lowerer = Lowerer {
        plan,
        diagnostics,
        lowering: LoweringPlan::new(),
        max_loop_iterations,
        temp_counter: 0,
        domain: ControlDomain::Unknown,
        proc_kind: ProcKind::Unknown,
        event_edges: Vec::new(),
        event_operands: Vec::new(),
        guard_stack: Vec::new(),
        exhaustive_stack: Vec::new(),
    };

    lowerer.collect_register_inits(body);
    lowerer.collect_memory_inits(body);
    lowerer.collect_dpi_imports(body);

    for assign in &body.continuous_assigns {
        lowerer.lower_continuous_assign(assign);
    }
    for process in &body.processes {
        lowerer.lower_process(process);
    }
    for inst in &body.child_instances {
        lowerer.lower_instance_connections(inst);
    }

    let Lowerer { lowering, .. } = lowerer;
    lowering
}

struct Lowerer<'a> {
    plan: &'a mut ModulePlan,
    diagnostics: &'a Diagnostics,
    lowering: LoweringPlan,
    max_loop_iterations: u32,
    temp_counter: u32,
    domain: ControlDomain,
    proc_kind: ProcKind,
    event_edges: Vec<EventEdge>,
    event_operands: Vec<ExprNodeId>,
    guard_stack: Vec<ExprNodeId>,
    exhaustive_stack: Vec<bool>,
}

impl<'a> Lowerer<'a> {
    fn collect_register_inits(&mut self, body: &ElaboratedBody) {
        for init in &body.register_inits {
            let reg = self.plan.symbol_table.intern(&init.target);
            self.lowering.register_inits.push(RegisterInit {
                reg,
                init_value: init.init_value.clone(),
                loc: init.loc,
            });
        }
    }

    fn collect_memory_inits(&mut self, body: &ElaboratedBody) {
        for init in &body.memory_inits {
            let memory = self.plan.symbol_table.intern(&init.memory);
            let kind = match init.kind {
                crate::ast::MemoryInitKind::Literal => PlanMemoryInitKind::Literal,
                crate::ast::MemoryInitKind::ReadMemH => PlanMemoryInitKind::ReadMemH,
                crate::ast::MemoryInitKind::ReadMemB => PlanMemoryInitKind::ReadMemB,
            };
            self.lowering.memory_inits.push(MemoryInit {
                memory,
                kind,
                file: init.file.clone(),
                init_value: init.init_value.clone(),
                start: init.start,
                len: init.len,
                loc: init.loc,
            });
        }
    }

    fn collect_dpi_imports(&mut self, body: &ElaboratedBody) {
        for import in &body.dpi_imports {
            self.lowering.dpi_imports.push(dpi_import_info(import));
        }
    }

    fn lower_continuous_assign(&mut self, assign: &ContinuousAssign) {
        self.domain = ControlDomain::Combinational;
        self.proc_kind = ProcKind::Always;
        self.event_edges.clear();
        self.event_operands.clear();
        self.guard_stack.clear();
        self.exhaustive_stack.clear();
        self.exhaustive_stack.push(true);
        self.emit_assign(&assign.target, &assign.value, false, assign.loc);
    }

    fn lower_process(&mut self, process: &ProcessDecl) {
        self.proc_kind = process.kind.into();
        self.event_edges = process
            .event_edges
            .iter()
            .map(|(edge, _)| (*edge).into())
            .collect();
        self.event_operands = process
            .event_edges
            .iter()
            .map(|(_, expr)| self.lower_expr_standalone(expr))
            .collect();
        self.guard_stack.clear();
        self.exhaustive_stack.clear();

        match process.kind {
            AstProcKind::Initial | AstProcKind::Final => {
                self.domain = ControlDomain::Unknown;
                self.walk_side_effects_only(&process.body);
            }
            AstProcKind::AlwaysComb => {
                self.domain = ControlDomain::Combinational;
                self.exhaustive_stack.push(true);
                self.lower_stmts(&process.body);
            }
            AstProcKind::AlwaysLatch => {
                self.domain = ControlDomain::Latch;
                self.exhaustive_stack.push(false);
                self.lower_stmts(&process.body);
            }
            AstProcKind::AlwaysFF => {
                self.domain = ControlDomain::Sequential;
                self.exhaustive_stack.push(true);
                self.lower_stmts(&process.body);
            }
            AstProcKind::Always => {
                self.domain = if self.event_edges.is_empty() {
                    ControlDomain::Combinational
                } else {
                    ControlDomain::Sequential
                };
                self.exhaustive_stack.push(self.domain != ControlDomain::Latch);
                self.lower_stmts(&process.body);
            }
        }
    }

    /// `initial`/`final` blocks never contribute write-back entries — the
    /// front end already extracts reset-value assignments into
    /// `register_inits`/`memory_inits` (see `ast::ElaboratedBody`'s doc
    /// comment). What's left to lower here is `$display`/`$finish`/DPI
    /// calls fired for simulation side effects.
    fn walk_side_effects_only(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            match stmt {
                Stmt::SystemTaskCall { name, args, loc } => self.emit_system_task(name, args, *loc),
                Stmt::DpiCall {
                    target_import,
                    in_args,
                    out_targets,
                    result_target,
                    loc,
                } => self.emit_dpi_call(target_import, in_args, out_targets, result_target, *loc),
                Stmt::Block { body } => self.walk_side_effects_only(body),
                Stmt::If { then_branch, else_branch, .. } => {
                    self.walk_side_effects_only(then_branch);
                    self.walk_side_effects_only(else_branch);
                }
                Stmt::Case { branches, default, .. } => {
                    for branch in branches {
                        self.walk_side_effects_only(&branch.body);
                    }
                    if let Some(default) = default {
                        self.walk_side_effects_only(default);
                    }
                }
                Stmt::EventControl { body, .. } => self.walk_side_effects_only(body),
                _ => {}
            }
        }
    }

    fn lower_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If { cond, then_branch, else_branch, loc } => self.lower_if(cond, then_branch, else_branch, *loc),
            Stmt::Case { selector, branches, default, loc } => self.lower_case(selector, branches, default, *loc),
            Stmt::Assign { blocking, target, value, loc } => self.emit_assign(target, value, !*blocking, *loc),
            Stmt::For { var, init, bound, ascending, step, body, loc } => {
                self.lower_for(var, init, bound, *ascending, step, body, *loc)
            }
            Stmt::UnboundedLoop { loc } => {
                self.diagnostics
                    .error_at(*loc, "lowerer", "unbounded loop (while/do-while/forever) is not supported");
            }
            Stmt::PatternIf { loc } => {
                self.diagnostics
                    .error_at(*loc, "lowerer", "pattern-matching 'if' statements are not supported");
            }
            Stmt::PatternCase { loc } => {
                self.diagnostics
                    .error_at(*loc, "lowerer", "pattern-matching 'case' statements are not supported");
            }
            Stmt::EventControl { edges, body, .. } => {
                let extra_edges: Vec<EventEdge> = edges.iter().map(|(e, _)| (*e).into()).collect();
                let extra_operands: Vec<ExprNodeId> =
                    edges.iter().map(|(_, e)| self.lower_expr_standalone(e)).collect();
                self.event_edges.extend(extra_edges);
                self.event_operands.extend(extra_operands);
                self.lower_stmts(body);
            }
            Stmt::SystemTaskCall { name, args, loc } => self.emit_system_task(name, args, *loc),
            Stmt::DpiCall { target_import, in_args, out_targets, result_target, loc } => {
                self.emit_dpi_call(target_import, in_args, out_targets, result_target, *loc)
            }
            Stmt::Block { body } => self.lower_stmts(body),
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_branch: &[Stmt], else_branch: &[Stmt], loc: SourceLoc) {
        let cond_node = self.lower_expr(cond);
        let has_else = !else_branch.is_empty();

        self.guard_stack.push(cond_node);
        self.exhaustive_stack.push(has_else);
        self.lower_stmts(then_branch);
        self.exhaustive_stack.pop();
        self.guard_stack.pop();

        let negated = self.not_node(cond_node, loc);
        self.guard_stack.push(negated);
        self.exhaustive_stack.push(has_else);
        self.lower_stmts(else_branch);
        self.exhaustive_stack.pop();
        self.guard_stack.pop();
    }

    fn lower_case(&mut self, selector: &Expr, branches: &[CaseBranch], default: &Option<Vec<Stmt>>, loc: SourceLoc) {
        let selector_node = self.lower_expr(selector);
        let exhaustive = default.is_some();
        let mut all_branch_conds = Vec::with_capacity(branches.len());

        for branch in branches {
            let mut label_conds = Vec::with_capacity(branch.labels.len());
            for label in &branch.labels {
                let label_node = self.lower_expr(label);
                label_conds.push(self.eq_node(selector_node, label_node, loc));
            }
            let branch_cond = self.or_all(&label_conds, loc);
            all_branch_conds.push(branch_cond);

            self.guard_stack.push(branch_cond);
            self.exhaustive_stack.push(exhaustive);
            self.lower_stmts(&branch.body);
            self.exhaustive_stack.pop();
            self.guard_stack.pop();
        }

        if let Some(default_body) = default {
            let any_branch = self.or_all(&all_branch_conds, loc);
            let default_cond = self.not_node(any_branch, loc);
            self.guard_stack.push(default_cond);
            self.exhaustive_stack.push(true);
            self.lower_stmts(default_body);
            self.exhaustive_stack.pop();
            self.guard_stack.pop();
        }
    }

    fn lower_for(
        &mut self,
        var: &str,
        init: &Expr,
        bound: &Expr,
        ascending: bool,
        step: &Expr,
        body: &[Stmt],
        loc: SourceLoc,
    ) {
        let (Some(init_val), Some(bound_val), Some(step_val)) =
            (eval_const(init), eval_const(bound), eval_const(step))
        else {
            self.diagnostics
                .todo_at(loc, "lowerer", "for-loop bounds are not compile-time constant, skipping");
            return;
        };
        if step_val == 0 {
            self.diagnostics.error_at(loc, "lowerer", "for-loop step evaluates to zero");
            return;
        }

        let mut iterations = 0u32;
        let mut i = init_val;
        loop {
            let done = if ascending { i >= bound_val } else { i <= bound_val };
            if done {
                break;
            }
            if iterations >= self.max_loop_iterations {
                self.diagnostics.error_at(
                    loc,
                    "lowerer",
                    format!("for-loop exceeded the {} iteration cap", self.max_loop_iterations),
                );
                break;
            }
            let unrolled: Vec<Stmt> = body.iter().map(|s| subst_stmt(s, var, i)).collect();
            self.lower_stmts(&unrolled);
            iterations += 1;
            i += if ascending { step_val } else { -step_val };
        }
    }

    fn emit_assign(&mut self, target: &LValue, value: &Expr, is_non_blocking: bool, loc: SourceLoc) {
        if self.is_memory_target(&target.base) {
            self.emit_memory_write(target, value, loc);
            return;
        }

        let target_symbol = self.plan.symbol_table.intern(&target.base);
        let slices: Vec<WriteSlice> = target.slices.iter().map(|s| self.lower_write_slice(s)).collect();
        let value_node = self.lower_expr(value);
        let guard = self.combine_guard(loc);
        let covers_all_two_state = self.exhaustive_stack.last().copied().unwrap_or(false) && slices.is_empty();

        self.lowering.writes.push(WriteIntent {
            target: target_symbol,
            slices,
            value: value_node,
            guard,
            domain: self.domain,
            is_non_blocking,
            covers_all_two_state,
            is_xmr: false,
            xmr_path: String::new(),
            loc,
        });

        let stmt = LoweredStmt::for_write(
            self.lowering.writes.last().unwrap().clone(),
            self.proc_kind,
            loc,
        )
        .with_event_control(self.event_edges.clone(), self.event_operands.clone());
        self.lowering.lowered_stmts.push(stmt);
    }

    fn emit_memory_write(&mut self, target: &LValue, value: &Expr, loc: SourceLoc) {
        let memory = self.plan.symbol_table.intern(&target.base);
        let Some(LValueSlice::BitSelect(addr_expr)) = target.slices.first() else {
            self.diagnostics
                .error_at(loc, "lowerer", "memory write requires a single row-address index");
            return;
        };
        let address = self.lower_expr(addr_expr);
        let data = self.lower_expr(value);
        let is_masked = target.slices.len() > 1;
        let mask = if is_masked {
            self.diagnostics.todo_at(
                loc,
                "lowerer",
                "sub-row memory write masking is not yet synthesized, writing the full row",
            );
            ExprNodeId::invalid()
        } else {
            ExprNodeId::invalid()
        };
        let update_cond = self.combine_guard(loc);
        self.lowering.memory_writes.push(MemoryWritePort {
            memory,
            address,
            data,
            mask,
            update_cond,
            is_masked,
            event_edges: self.event_edges.clone(),
            event_operands: self.event_operands.clone(),
            loc,
        });
    }

    fn emit_system_task(&mut self, name: &str, args: &[Expr], loc: SourceLoc) {
        let arg_nodes = args.iter().map(|a| self.lower_expr(a)).collect();
        let update_cond = self.combine_guard(loc);
        let mut stmt = LoweredStmt::for_system_task(
            SystemTaskStmt { name: name.to_string(), args: arg_nodes },
            self.proc_kind,
            loc,
        )
        .with_event_control(self.event_edges.clone(), self.event_operands.clone());
        stmt.update_cond = update_cond;
        self.lowering.lowered_stmts.push(stmt);
    }

    fn emit_dpi_call(
        &mut self,
        target_import: &str,
        in_args: &[Expr],
        out_targets: &[LValue],
        result_target: &Option<LValue>,
        loc: SourceLoc,
    ) {
        let in_arg_nodes = in_args.iter().map(|a| self.lower_expr(a)).collect();
        let mut results = Vec::new();
        for out in out_targets {
            if !out.slices.is_empty() {
                self.diagnostics
                    .todo_at(loc, "lowerer", "DPI output argument slicing is not supported, using the full signal");
            }
            results.push(self.plan.symbol_table.intern(&out.base));
        }
        let has_return = result_target.is_some();
        if let Some(result) = result_target {
            results.push(self.plan.symbol_table.intern(&result.base));
        }
        let update_cond = self.combine_guard(loc);
        let call = DpiCallStmt {
            target_import_symbol: target_import.to_string(),
            in_arg_names: Vec::new(),
            out_arg_names: Vec::new(),
            in_args: in_arg_nodes,
            results,
            has_return,
        };
        let mut stmt =
            LoweredStmt::for_dpi_call(call, self.proc_kind, loc).with_event_control(self.event_edges.clone(), self.event_operands.clone());
        stmt.update_cond = update_cond;
        self.lowering.lowered_stmts.push(stmt);
    }

    /// Port-connection expressions live in this module's own scope, outside
    /// any procedural guard, so they're lowered with an empty guard stack
    /// the same way event-control operands are.
    fn lower_instance_connections(&mut self, inst: &ElaboratedInstance) {
        let saved_guard = std::mem::take(&mut self.guard_stack);
        let mut conn = InstanceConnection::default();
        for pc in &inst.port_connections {
            match &pc.kind {
                PortConnectionKind::Input(expr) => {
                    let value = self.lower_expr(expr);
                    conn.input_values.push((pc.port_name.clone(), value));
                }
                PortConnectionKind::Output(name) => {
                    let target = self.plan.symbol_table.intern(name);
                    conn.output_targets.push((pc.port_name.clone(), target));
                }
                PortConnectionKind::Inout(name) => {
                    let target = self.plan.symbol_table.intern(name);
                    conn.inout_targets.push((pc.port_name.clone(), target));
                }
                PortConnectionKind::Unconnected => {}
            }
        }
        self.guard_stack = saved_guard;
        self.lowering.instance_connections.push(conn);
    }

    fn is_memory_target(&self, name: &str) -> bool {
        self.plan
            .find_signal_by_name(name)
            .map(|s| s.kind == SignalKind::Memory)
            .unwrap_or(false)
    }

    fn lower_write_slice(&mut self, slice: &LValueSlice) -> WriteSlice {
        match slice {
            LValueSlice::BitSelect(e) => {
                let idx = self.lower_expr(e);
                WriteSlice::bit_select(idx, e.loc)
            }
            LValueSlice::PartSelect { left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                WriteSlice::range_select(l, r, left.loc)
            }
            LValueSlice::IndexedPartSelect { base_index, width, indexed_up } => {
                let idx = self.lower_expr(base_index);
                let width_node = self.const_node(width.to_string(), base_index.loc);
                WriteSlice::indexed_part_select(idx, (width_node, width_node), *indexed_up, base_index.loc)
            }
            LValueSlice::MemberSelect(name) => {
                let member = self.plan.symbol_table.intern(name);
                WriteSlice::member_select(member, SourceLoc::unknown())
            }
        }
    }

    /// Used for event-control operands (`@(posedge clk)`), which are lowered
    /// outside the write guard stack since they describe the process's
    /// ambient timing, not a conditional update.
    fn lower_expr_standalone(&mut self, expr: &Expr) -> ExprNodeId {
        let saved = std::mem::take(&mut self.guard_stack);
        let node = self.lower_expr(expr);
        self.guard_stack = saved;
        node
    }

    fn lower_expr(&mut self, expr: &Expr) -> ExprNodeId {
        match &expr.kind {
            ExprKind::Literal(lit) => self.const_node(lit.text.clone(), expr.loc),
            ExprKind::Ref(name) => {
                if self.is_memory_target(name) {
                    self.diagnostics.error_at(
                        expr.loc,
                        "lowerer",
                        format!("memory '{name}' read without an address index"),
                    );
                }
                let sym = self.plan.symbol_table.intern(name);
                self.push_with_temp(ExprNode::symbol(sym, expr.loc))
            }
            ExprKind::HierRef(path) => self.push_with_temp(ExprNode::xmr_read(path.clone(), expr.loc)),
            ExprKind::Unary(op, inner) => {
                let operand = self.lower_expr(inner);
                let kind = unary_op_kind(*op);
                self.push_with_temp(ExprNode::operation(kind, vec![operand], expr.loc))
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let l = self.lower_expr(lhs);
                let r = self.lower_expr(rhs);
                let kind = binary_op_kind(*op);
                self.push_with_temp(ExprNode::operation(kind, vec![l, r], expr.loc))
            }
            ExprKind::Ternary(cond, then_val, else_val) => {
                let c = self.lower_expr(cond);
                let t = self.lower_expr(then_val);
                let e = self.lower_expr(else_val);
                self.push_with_temp(ExprNode::operation(OperationKind::Mux, vec![c, t, e], expr.loc))
            }
            ExprKind::Concat(parts) => {
                let operands = parts.iter().map(|p| self.lower_expr(p)).collect();
                self.push_with_temp(ExprNode::operation(OperationKind::Concat, operands, expr.loc))
            }
            ExprKind::Replicate(count, value) => {
                let c = self.lower_expr(count);
                let v = self.lower_expr(value);
                self.push_with_temp(ExprNode::operation(OperationKind::Replicate, vec![c, v], expr.loc))
            }
            ExprKind::BitSelect { base, index } => {
                if let ExprKind::Ref(name) = &base.kind {
                    if self.is_memory_target(name) {
                        return self.lower_memory_read(name, index, expr.loc);
                    }
                }
                let b = self.lower_expr(base);
                let i = self.lower_expr(index);
                let kind = if matches!(index.kind, ExprKind::Literal(_)) {
                    OperationKind::SliceStatic
                } else {
                    OperationKind::SliceDynamic
                };
                self.push_with_temp(ExprNode::operation(kind, vec![b, i], expr.loc))
            }
            ExprKind::PartSelect { base, left, right } => {
                let b = self.lower_expr(base);
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let kind = if matches!(left.kind, ExprKind::Literal(_)) && matches!(right.kind, ExprKind::Literal(_)) {
                    OperationKind::SliceStatic
                } else {
                    OperationKind::SliceDynamic
                };
                self.push_with_temp(ExprNode::operation(kind, vec![b, l, r], expr.loc))
            }
            ExprKind::IndexedPartSelect { base, base_index, width, indexed_up: _ } => {
                let b = self.lower_expr(base);
                let i = self.lower_expr(base_index);
                let w = self.const_node(width.to_string(), expr.loc);
                let kind = if matches!(base_index.kind, ExprKind::Literal(_)) {
                    OperationKind::SliceStatic
                } else {
                    OperationKind::SliceDynamic
                };
                self.push_with_temp(ExprNode::operation(kind, vec![b, i, w], expr.loc))
            }
            ExprKind::MemberSelect { base, member } => {
                let b = self.lower_expr(base);
                let mut node = ExprNode::operation(OperationKind::MemberSelect, vec![b], expr.loc);
                node.literal = member.clone();
                self.push_with_temp(node)
            }
            ExprKind::SystemCall { name, args } => {
                let operands = args.iter().map(|a| self.lower_expr(a)).collect();
                let mut node = ExprNode::operation(OperationKind::SystemTask, operands, expr.loc);
                node.system_name = name.clone();
                node.has_side_effects = true;
                self.push_with_temp(node)
            }
        }
    }

    fn lower_memory_read(&mut self, name: &str, index: &Expr, loc: SourceLoc) -> ExprNodeId {
        let memory = self.plan.symbol_table.intern(name);
        let address = self.lower_expr(index);
        let is_sync = self.domain == ControlDomain::Sequential && !self.event_edges.is_empty();
        let update_cond = self.combine_guard(loc);
        self.lowering.memory_reads.push(MemoryReadPort {
            memory,
            address,
            is_sync,
            update_cond,
            event_edges: self.event_edges.clone(),
            event_operands: self.event_operands.clone(),
            loc,
        });
        self.push_with_temp(ExprNode::operation(OperationKind::MemoryReadPort, vec![address], loc))
    }

    fn push_with_temp(&mut self, mut node: ExprNode) -> ExprNodeId {
        if node.kind != ExprNodeKind::Symbol {
            let name = format!("$lower{}", self.temp_counter);
            self.temp_counter += 1;
            node.temp_symbol = self.plan.symbol_table.intern(&name);
        }
        self.lowering.push_node(node)
    }

    fn const_node(&mut self, text: impl Into<String>, loc: SourceLoc) -> ExprNodeId {
        self.push_with_temp(ExprNode::constant(text, loc))
    }

    fn not_node(&mut self, node: ExprNodeId, loc: SourceLoc) -> ExprNodeId {
        self.push_with_temp(ExprNode::operation(OperationKind::Not, vec![node], loc))
    }

    fn eq_node(&mut self, a: ExprNodeId, b: ExprNodeId, loc: SourceLoc) -> ExprNodeId {
        self.push_with_temp(ExprNode::operation(OperationKind::Eq, vec![a, b], loc))
    }

    fn or_all(&mut self, nodes: &[ExprNodeId], loc: SourceLoc) -> ExprNodeId {
        let mut iter = nodes.iter().copied();
        let Some(mut acc) = iter.next() else {
            return self.const_node("0", loc);
        };
        for n in iter {
            acc = self.push_with_temp(ExprNode::operation(OperationKind::Or, vec![acc, n], loc));
        }
        acc
    }

    fn combine_guard(&mut self, loc: SourceLoc) -> ExprNodeId {
        if self.guard_stack.is_empty() {
            return self.const_node("1", loc);
        }
        let mut iter = self.guard_stack.clone().into_iter();
        let mut acc = iter.next().unwrap();
        for g in iter {
            acc = self.push_with_temp(ExprNode::operation(OperationKind::And, vec![acc, g], loc));
        }
        acc
    }
}

fn unary_op_kind(op: UnaryOp) -> OperationKind {
    match op {
        UnaryOp::Neg => OperationKind::Neg,
        UnaryOp::Not | UnaryOp::BitNot => OperationKind::Not,
        UnaryOp::ReduceAnd => OperationKind::ReduceAnd,
        UnaryOp::ReduceOr => OperationKind::ReduceOr,
        UnaryOp::ReduceXor => OperationKind::ReduceXor,
        UnaryOp::ReduceNand => OperationKind::ReduceNand,
        UnaryOp::ReduceNor => OperationKind::ReduceNor,
        UnaryOp::ReduceXnor => OperationKind::ReduceXnor,
    }
}

fn binary_op_kind(op: BinaryOp) -> OperationKind {
    match op {
        BinaryOp::Add => OperationKind::Add,
        BinaryOp::Sub => OperationKind::Sub,
        BinaryOp::Mul => OperationKind::Mul,
        BinaryOp::Div => OperationKind::Div,
        BinaryOp::Mod => OperationKind::Mod,
        BinaryOp::And | BinaryOp::LogicalAnd => OperationKind::And,
        BinaryOp::Or | BinaryOp::LogicalOr => OperationKind::Or,
        BinaryOp::Xor => OperationKind::Xor,
        BinaryOp::Shl => OperationKind::Shl,
        BinaryOp::Shr => OperationKind::Shr,
        BinaryOp::AShr => OperationKind::AShr,
        BinaryOp::Eq => OperationKind::Eq,
        BinaryOp::Neq => OperationKind::Neq,
        BinaryOp::Lt => OperationKind::Lt,
        BinaryOp::Lte => OperationKind::Lte,
        BinaryOp::Gt => OperationKind::Gt,
        BinaryOp::Gte => OperationKind::Gte,
    }
}

fn dpi_import_info(decl: &DpiImportDecl) -> DpiImportInfo {
    DpiImportInfo {
        symbol: decl.symbol.clone(),
        args_direction: decl.args_direction.clone(),
        args_width: decl.args_width.clone(),
        args_name: decl.args_name.clone(),
        args_signed: decl.args_signed.clone(),
        args_type: decl.args_type.clone(),
        has_return: decl.has_return,
        return_width: decl.return_width,
        return_signed: decl.return_signed,
        return_type: decl.return_type.clone(),
    }
}

/// Parses a SystemVerilog-style sized literal (`8'hAB`, `4'b1010`) or a
/// bare decimal integer. Used only to fold `for`-loop bounds at lowering
/// time — general expression constants are left for a future constant-fold
/// pass over the `ExprNode` arena.
pub(crate) fn parse_sv_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(tick) = cleaned.find('\'') {
        let (_, rest) = cleaned.split_at(tick);
        let mut chars = rest[1..].chars();
        let mut radix_char = chars.next()?;
        if radix_char == 's' || radix_char == 'S' {
            radix_char = chars.next()?;
        }
        let digits: String = chars.collect();
        let radix = match radix_char.to_ascii_lowercase() {
            'h' => 16,
            'o' => 8,
            'b' => 2,
            'd' => 10,
            _ => return None,
        };
        i64::from_str_radix(&digits, radix).ok()
    } else {
        cleaned.parse::<i64>().ok()
    }
}

fn eval_const(expr: &Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::Literal(lit) => parse_sv_literal(&lit.text),
        ExprKind::Unary(UnaryOp::Neg, inner) => eval_const(inner).map(|v| -v),
        ExprKind::Binary(op, lhs, rhs) => {
            let l = eval_const(lhs)?;
            let r = eval_const(rhs)?;
            match op {
                BinaryOp::Add => Some(l + r),
                BinaryOp::Sub => Some(l - r),
                BinaryOp::Mul => Some(l * r),
                BinaryOp::Div if r != 0 => Some(l / r),
                BinaryOp::Mod if r != 0 => Some(l % r),
                _ => None,
            }
        }
        _ => None,
    }
}

fn subst_expr(expr: &Expr, var: &str, value: i64) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Literal(lit) => ExprKind::Literal(lit.clone()),
        ExprKind::Ref(name) if name == var => ExprKind::Literal(crate::ast::LiteralExpr { text: value.to_string() }),
        ExprKind::Ref(name) => ExprKind::Ref(name.clone()),
        ExprKind::HierRef(path) => ExprKind::HierRef(path.clone()),
        ExprKind::Unary(op, inner) => ExprKind::Unary(*op, Box::new(subst_expr(inner, var, value))),
        ExprKind::Binary(op, lhs, rhs) => {
            ExprKind::Binary(*op, Box::new(subst_expr(lhs, var, value)), Box::new(subst_expr(rhs, var, value)))
        }
        ExprKind::Ternary(c, t, e) => ExprKind::Ternary(
            Box::new(subst_expr(c, var, value)),
            Box::new(subst_expr(t, var, value)),
            Box::new(subst_expr(e, var, value)),
        ),
        ExprKind::Concat(parts) => ExprKind::Concat(parts.iter().map(|p| subst_expr(p, var, value)).collect()),
        ExprKind::Replicate(count, v) => {
            ExprKind::Replicate(Box::new(subst_expr(count, var, value)), Box::new(subst_expr(v, var, value)))
        }
        ExprKind::BitSelect { base, index } => ExprKind::BitSelect {
            base: Box::new(subst_expr(base, var, value)),
            index: Box::new(subst_expr(index, var, value)),
        },
        ExprKind::PartSelect { base, left, right } => ExprKind::PartSelect {
            base: Box::new(subst_expr(base, var, value)),
            left: Box::new(subst_expr(left, var, value)),
            right: Box::new(subst_expr(right, var, value)),
        },
        ExprKind::IndexedPartSelect { base, base_index, width, indexed_up } => ExprKind::IndexedPartSelect {
            base: Box::new(subst_expr(base, var, value)),
            base_index: Box::new(subst_expr(base_index, var, value)),
            width: *width,
            indexed_up: *indexed_up,
        },
        ExprKind::MemberSelect { base, member } => {
            ExprKind::MemberSelect { base: Box::new(subst_expr(base, var, value)), member: member.clone() }
        }
        ExprKind::SystemCall { name, args } => {
            ExprKind::SystemCall { name: name.clone(), args: args.iter().map(|a| subst_expr(a, var, value)).collect() }
        }
    };
    Expr::new(kind, expr.loc)
}

fn subst_lvalue(lv: &LValue, var: &str, value: i64) -> LValue {
    LValue {
        base: lv.base.clone(),
        slices: lv
            .slices
            .iter()
            .map(|s| match s {
                LValueSlice::BitSelect(e) => LValueSlice::BitSelect(subst_expr(e, var, value)),
                LValueSlice::PartSelect { left, right } => LValueSlice::PartSelect {
                    left: subst_expr(left, var, value),
                    right: subst_expr(right, var, value),
                },
                LValueSlice::IndexedPartSelect { base_index, width, indexed_up } => LValueSlice::IndexedPartSelect {
                    base_index: subst_expr(base_index, var, value),
                    width: *width,
                    indexed_up: *indexed_up,
                },
                LValueSlice::MemberSelect(m) => LValueSlice::MemberSelect(m.clone()),
            })
            .collect(),
        loc: lv.loc,
    }
}

fn subst_stmt(stmt: &Stmt, var: &str, value: i64) -> Stmt {
    match stmt {
        Stmt::If { cond, then_branch, else_branch, loc } => Stmt::If {
            cond: subst_expr(cond, var, value),
            then_branch: then_branch.iter().map(|s| subst_stmt(s, var, value)).collect(),
            else_branch: else_branch.iter().map(|s| subst_stmt(s, var, value)).collect(),
            loc: *loc,
        },
        Stmt::Case { selector, branches, default, loc } => Stmt::Case {
            selector: subst_expr(selector, var, value),
            branches: branches
                .iter()
                .map(|b| CaseBranch {
                    labels: b.labels.iter().map(|l| subst_expr(l, var, value)).collect(),
                    body: b.body.iter().map(|s| subst_stmt(s, var, value)).collect(),
                })
                .collect(),
            default: default
                .as_ref()
                .map(|d| d.iter().map(|s| subst_stmt(s, var, value)).collect()),
            loc: *loc,
        },
        Stmt::Assign { blocking, target, value: v, loc } => Stmt::Assign {
            blocking: *blocking,
            target: subst_lvalue(target, var, value),
            value: subst_expr(v, var, value),
            loc: *loc,
        },
        Stmt::For { var: inner_var, init, bound, ascending, step, body, loc } => Stmt::For {
            var: inner_var.clone(),
            init: subst_expr(init, var, value),
            bound: subst_expr(bound, var, value),
            ascending: *ascending,
            step: subst_expr(step, var, value),
            body: body.iter().map(|s| subst_stmt(s, var, value)).collect(),
            loc: *loc,
        },
        Stmt::UnboundedLoop { loc } => Stmt::UnboundedLoop { loc: *loc },
        Stmt::PatternIf { loc } => Stmt::PatternIf { loc: *loc },
        Stmt::PatternCase { loc } => Stmt::PatternCase { loc: *loc },
        Stmt::EventControl { edges, body, loc } => Stmt::EventControl {
            edges: edges.iter().map(|(e, expr)| (*e, subst_expr(expr, var, value))).collect(),
            body: body.iter().map(|s| subst_stmt(s, var, value)).collect(),
            loc: *loc,
        },
        Stmt::SystemTaskCall { name, args, loc } => Stmt::SystemTaskCall {
            name: name.clone(),
            args: args.iter().map(|a| subst_expr(a, var, value)).collect(),
            loc: *loc,
        },
        Stmt::DpiCall { target_import, in_args, out_targets, result_target, loc } => Stmt::DpiCall {
            target_import: target_import.clone(),
            in_args: in_args.iter().map(|a| subst_expr(a, var, value)).collect(),
            out_targets: out_targets.iter().map(|t| subst_lvalue(t, var, value)).collect(),
            result_target: result_target.as_ref().map(|t| subst_lvalue(t, var, value)),
            loc: *loc,
        },
        Stmt::Block { body } => Stmt::Block { body: body.iter().map(|s| subst_stmt(s, var, value)).collect() },
    }
}
