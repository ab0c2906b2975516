//! The Graph Assembler (§4.6): the pipeline's last stage. Turns one
//! module's planned, lowered, and write-back-resolved intermediates into a
//! [`Graph`] ready for [`crate::rhg::Netlist::publish`].
//!
//! Storage declarations go first, in their own pass, before the generic
//! [`ExprNode`] arena is walked: a `Sequential`/`Latch` write-back entry's
//! `next_value` tree reads its own target through a self-referential
//! `Symbol` node (see `write_back.rs`), so the register/latch read port
//! that node resolves to has to already exist by the time the arena walk
//! reaches it. [`LoweringPlan::push_node`] never reorders, and the lowerer
//! always lowers an operand before the node that references it, so a
//! single forward pass over `lowering.values` is otherwise enough to turn
//! every node into a [`crate::rhg::Value`] with its operands already
//! resolved.
//!
//! Instance/blackbox emission runs after that walk (its input-port
//! operands are ordinary `ExprNodeId`s already materialized) and writes
//! its output/inout results back into the net-value map the same way a
//! write-back `Assign` would, so anything reading that signal afterward
//! sees the instance's driven value. A read that textually precedes the
//! driving instance in this module (continuous assigns lower before
//! instance connections unconditionally, per `lowerer.rs`) binds to
//! whatever placeholder net value this pass already declared for it —
//! see DESIGN.md for why this crate doesn't attempt general forward-
//! reference resolution here.

use std::collections::{HashMap, HashSet};

use crate::ast::ValueType as AstValueType;
use crate::cache::PlanCache;
use crate::diagnostics::Diagnostics;
use crate::lowerer::parse_sv_literal;
use crate::plan::{
    ControlDomain, EventEdge, ExprNode, ExprNodeId, ExprNodeKind, InstanceConnection, InstanceInfo,
    LoweredStmtKind, LoweringPlan, ModulePlan, PlanKey, PlanSymbolId, PortDirection as PlanPortDirection,
    SignalInfo, SignalKind, WriteBackEntry, WriteBackPlan,
};
use crate::registry::InstanceRegistry;
use crate::rhg::{AttrMap, AttrValue, Graph, InoutPort, OperationKind, SymbolId, ValueId, ValueType};

/// The collaborators the assembler needs beyond the one module's own plan
/// triple: the cache to look up an already-lowered child's port order, and
/// the registry to agree on child graph names with whichever worker
/// assembles them.
pub struct AssemblerContext<'a> {
    pub plan_cache: &'a PlanCache,
    pub instance_registry: &'a InstanceRegistry,
    pub diagnostics: &'a Diagnostics,
}

pub fn assemble_graph(
    graph_name: &str,
    plan: &ModulePlan,
    lowering: &LoweringPlan,
    write_back: &WriteBackPlan,
    ctx: &AssemblerContext,
) -> Graph {
    let entries_by_target = write_back.entries.iter().map(|e| (e.target, e)).collect();
    let mut asm = Assembler {
        graph: Graph::new(graph_name),
        plan,
        lowering,
        write_back,
        ctx,
        symbol_values: HashMap::new(),
        node_values: vec![None; lowering.values.len()],
        net_oe_values: HashMap::new(),
        entries_by_target,
        declared: HashSet::new(),
    };
    asm.declare_storage();
    asm.materialize_values();
    asm.emit_write_backs();
    asm.emit_memory_writes();
    asm.emit_tasks();
    asm.emit_instances();
    asm.wire_ports();
    if let Err(message) = asm.graph.check_invariants() {
        ctx.diagnostics.error(format!("assembled graph '{graph_name}' fails invariant check: {message}"), "assembler");
    }
    asm.graph
}

struct Assembler<'a> {
    graph: Graph,
    plan: &'a ModulePlan,
    lowering: &'a LoweringPlan,
    write_back: &'a WriteBackPlan,
    ctx: &'a AssemblerContext<'a>,
    /// Current value for every net this module knows about, keyed by plan
    /// symbol. Overwritten in place when a later driver (an instance
    /// result, a DPI out-arg) supersedes whatever was here before.
    symbol_values: HashMap<PlanSymbolId, ValueId>,
    node_values: Vec<Option<ValueId>>,
    /// Lazily-allocated output-enable placeholder per net used as an
    /// instance's inout connection target; shared across every instance
    /// wired to the same net.
    net_oe_values: HashMap<PlanSymbolId, ValueId>,
    entries_by_target: HashMap<PlanSymbolId, &'a WriteBackEntry>,
    declared: HashSet<PlanSymbolId>,
}

fn rhg_value_type(vt: AstValueType) -> ValueType {
    match vt {
        AstValueType::Logic => ValueType::Logic,
        AstValueType::Bit => ValueType::Bit,
        AstValueType::Integer => ValueType::Integer,
        AstValueType::Real => ValueType::Real,
        AstValueType::Event => ValueType::Event,
        AstValueType::Time => ValueType::Time,
        AstValueType::String => ValueType::String,
    }
}

fn event_edge_str(edge: &EventEdge) -> String {
    match edge {
        EventEdge::Posedge => "posedge".to_string(),
        EventEdge::Negedge => "negedge".to_string(),
    }
}

/// Width/signedness prefix of a canonical literal (`"8'hFF"` -> `(8,
/// false)`); unsized literals default to a plain 32-bit value, matching
/// SystemVerilog's own default for an unsized integer literal.
fn literal_width_and_signed(text: &str) -> (u32, bool) {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    match cleaned.find('\'') {
        Some(tick) => {
            let width = cleaned[..tick].parse::<u32>().unwrap_or(32).max(1);
            let rest = &cleaned[tick + 1..];
            let is_signed = rest.starts_with('s') || rest.starts_with('S');
            (width, is_signed)
        }
        None => (32, false),
    }
}

fn const_of_node(lowering: &LoweringPlan, id: ExprNodeId) -> Option<i64> {
    if !id.valid() {
        return None;
    }
    let node = lowering.node(id);
    if node.kind != ExprNodeKind::Constant {
        return None;
    }
    parse_sv_literal(&node.literal)
}

impl<'a> Assembler<'a> {
    fn sym(&mut self, symbol: PlanSymbolId) -> SymbolId {
        let name = self.plan.symbol_table.text(symbol).to_string();
        self.graph.symbols.intern(&name)
    }

    fn value_of(&self, id: ExprNodeId) -> ValueId {
        self.node_values[id.index()].unwrap()
    }

    /// Overwrites the current driver of a net, and keeps an inout port's
    /// `.out` companion in sync when the bare port name is the target —
    /// an instance (or this module's own logic) driving the plain `io`
    /// name is really driving the port's out side.
    fn write_net(&mut self, target: PlanSymbolId, value: ValueId) {
        self.symbol_values.insert(target, value);
        if let Some(port) = self.plan.find_port_by_symbol(target) {
            if let Some(binding) = port.inout_binding {
                self.symbol_values.insert(binding.out_symbol, value);
            }
        }
    }

    fn resolve_symbol_read(&mut self, symbol: PlanSymbolId) -> ValueId {
        if let Some(v) = self.symbol_values.get(&symbol) {
            return *v;
        }
        let width = self.plan.symbol_width(symbol).unwrap_or(1).max(1) as u32;
        self.ctx.diagnostics.warning(
            format!("'{}' read before any driver was declared", self.plan.symbol_table.text(symbol)),
            "assembler",
        );
        let sym_id = self.sym(symbol);
        let v = self.graph.add_free_value(sym_id, width, false, ValueType::Logic, None);
        self.graph.declared_symbols.insert(sym_id);
        self.symbol_values.insert(symbol, v);
        v
    }

    fn unconnected_value(&mut self, width: u32, is_signed: bool, value_type: ValueType) -> ValueId {
        let sym = self.graph.symbols.intern("$unconnected");
        self.graph.add_free_value(sym, width.max(1), is_signed, value_type, None)
    }

    // ---- storage declaration pass ----

    fn declare_storage(&mut self) {
        for port in self.plan.ports.clone().iter() {
            match port.inout_binding {
                Some(binding) => {
                    self.ensure_declared(binding.in_symbol, port.width, port.is_signed, port.value_type);
                    self.ensure_declared(binding.out_symbol, port.width, port.is_signed, port.value_type);
                    self.ensure_declared(binding.oe_symbol, 1, false, AstValueType::Bit);
                    if self.entries_by_target.contains_key(&port.symbol) {
                        self.ensure_declared(port.symbol, port.width, port.is_signed, port.value_type);
                    } else {
                        let in_value = *self.symbol_values.get(&binding.in_symbol).unwrap();
                        self.symbol_values.insert(port.symbol, in_value);
                    }
                }
                None => {
                    self.ensure_declared(port.symbol, port.width, port.is_signed, port.value_type);
                }
            }
        }
        for signal in self.plan.signals.clone().iter() {
            if signal.kind == SignalKind::Memory {
                self.declare_memory(signal);
            } else {
                self.ensure_declared(signal.symbol, signal.width, signal.is_signed, signal.value_type);
            }
        }
    }

    fn ensure_declared(&mut self, symbol: PlanSymbolId, width: i32, is_signed: bool, value_type: AstValueType) {
        if self.declared.contains(&symbol) {
            return;
        }
        match self.entries_by_target.get(&symbol).map(|e| e.domain) {
            Some(ControlDomain::Sequential) => self.declare_register(symbol, width, is_signed, value_type),
            Some(ControlDomain::Latch) => self.declare_latch(symbol, width, is_signed, value_type),
            _ => self.declare_free(symbol, width, is_signed, value_type),
        }
    }

    fn declare_free(&mut self, symbol: PlanSymbolId, width: i32, is_signed: bool, value_type: AstValueType) {
        if self.declared.contains(&symbol) {
            return;
        }
        let sym_id = self.sym(symbol);
        let w = width.max(1) as u32;
        let v = self.graph.add_free_value(sym_id, w, is_signed, rhg_value_type(value_type), None);
        self.graph.declared_symbols.insert(sym_id);
        self.symbol_values.insert(symbol, v);
        self.declared.insert(symbol);
    }

    fn declare_register(&mut self, symbol: PlanSymbolId, width: i32, is_signed: bool, value_type: AstValueType) {
        if self.declared.contains(&symbol) {
            return;
        }
        let name = self.plan.symbol_table.text(symbol).to_string();
        let sym_id = self.graph.symbols.intern(&name);
        let w = width.max(1) as u32;

        let mut decl_attrs = AttrMap::new();
        decl_attrs.insert("width".into(), AttrValue::Int(w as i64));
        decl_attrs.insert("isSigned".into(), AttrValue::Bool(is_signed));
        if let Some(init) = self.lowering.register_inits.iter().find(|r| r.reg == symbol) {
            decl_attrs.insert("initValue".into(), AttrValue::Str(init.init_value.clone()));
        }
        self.graph.add_operation(sym_id, OperationKind::Register, vec![], vec![], decl_attrs, None);
        self.graph.declared_symbols.insert(sym_id);

        let mut read_attrs = AttrMap::new();
        read_attrs.insert("regSymbol".into(), AttrValue::Str(name));
        let op = self.graph.add_operation(
            sym_id,
            OperationKind::RegisterReadPort,
            vec![],
            vec![(sym_id, w, is_signed, rhg_value_type(value_type))],
            read_attrs,
            None,
        );
        let value = self.graph.operation(op).results[0];
        self.symbol_values.insert(symbol, value);
        self.declared.insert(symbol);
    }

    fn declare_latch(&mut self, symbol: PlanSymbolId, width: i32, is_signed: bool, value_type: AstValueType) {
        if self.declared.contains(&symbol) {
            return;
        }
        let name = self.plan.symbol_table.text(symbol).to_string();
        let sym_id = self.graph.symbols.intern(&name);
        let w = width.max(1) as u32;

        let mut decl_attrs = AttrMap::new();
        decl_attrs.insert("width".into(), AttrValue::Int(w as i64));
        decl_attrs.insert("isSigned".into(), AttrValue::Bool(is_signed));
        self.graph.add_operation(sym_id, OperationKind::Latch, vec![], vec![], decl_attrs, None);
        self.graph.declared_symbols.insert(sym_id);

        let mut read_attrs = AttrMap::new();
        read_attrs.insert("latchSymbol".into(), AttrValue::Str(name));
        let op = self.graph.add_operation(
            sym_id,
            OperationKind::LatchReadPort,
            vec![],
            vec![(sym_id, w, is_signed, rhg_value_type(value_type))],
            read_attrs,
            None,
        );
        let value = self.graph.operation(op).results[0];
        self.symbol_values.insert(symbol, value);
        self.declared.insert(symbol);
    }

    fn declare_memory(&mut self, signal: &SignalInfo) {
        if self.declared.contains(&signal.symbol) {
            return;
        }
        let name = self.plan.symbol_table.text(signal.symbol).to_string();
        let sym_id = self.graph.symbols.intern(&name);
        let w = signal.width.max(1) as u32;

        let mut attrs = AttrMap::new();
        attrs.insert("width".into(), AttrValue::Int(w as i64));
        attrs.insert("isSigned".into(), AttrValue::Bool(signal.is_signed));
        attrs.insert("rows".into(), AttrValue::Int(signal.memory_rows));
        if let Some(init) = self.lowering.memory_inits.iter().find(|m| m.memory == signal.symbol) {
            attrs.insert("initKind".into(), AttrValue::Str(format!("{:?}", init.kind)));
            attrs.insert("initFile".into(), AttrValue::Str(init.file.clone()));
            attrs.insert("initValue".into(), AttrValue::Str(init.init_value.clone()));
            attrs.insert("initStart".into(), AttrValue::Int(init.start));
            attrs.insert("initLen".into(), AttrValue::Int(init.len));
        }
        self.graph.add_operation(sym_id, OperationKind::Memory, vec![], vec![], attrs, None);
        self.graph.declared_symbols.insert(sym_id);
        self.declared.insert(signal.symbol);
    }

    // ---- expression arena walk ----

    fn materialize_values(&mut self) {
        let mut memory_read_idx = 0usize;
        for idx in 0..self.lowering.values.len() {
            let node = &self.lowering.values[idx];
            let value = match node.kind {
                ExprNodeKind::Invalid => continue,
                ExprNodeKind::Symbol => self.resolve_symbol_read(node.symbol),
                ExprNodeKind::Constant => self.emit_constant(node),
                ExprNodeKind::XmrRead => self.emit_xmr(node),
                ExprNodeKind::Operation if node.op == OperationKind::MemoryReadPort => {
                    let v = self.emit_memory_read_port(node, memory_read_idx);
                    memory_read_idx += 1;
                    v
                }
                ExprNodeKind::Operation => self.emit_operation(node),
            };
            self.node_values[idx] = Some(value);
        }
    }

    fn emit_constant(&mut self, node: &ExprNode) -> ValueId {
        let (width, is_signed) = literal_width_and_signed(&node.literal);
        let sym = self.sym(node.temp_symbol);
        let mut attrs = AttrMap::new();
        attrs.insert("literal".into(), AttrValue::Str(node.literal.clone()));
        let op = self.graph.add_operation(
            sym,
            OperationKind::Constant,
            vec![],
            vec![(sym, width, is_signed, ValueType::Logic)],
            attrs,
            Some(node.loc.clone()),
        );
        self.graph.operation(op).results[0]
    }

    fn emit_xmr(&mut self, node: &ExprNode) -> ValueId {
        self.ctx.diagnostics.warning(
            format!("cross-module reference '{}' is not resolved across graphs", node.xmr_path),
            "assembler",
        );
        let sym = self.sym(node.temp_symbol);
        let mut attrs = AttrMap::new();
        attrs.insert("path".into(), AttrValue::Str(node.xmr_path.clone()));
        let op = self.graph.add_operation(
            sym,
            OperationKind::XmrRead,
            vec![],
            vec![(sym, 32, false, ValueType::Logic)],
            attrs,
            Some(node.loc.clone()),
        );
        self.graph.operation(op).results[0]
    }

    fn emit_memory_read_port(&mut self, node: &ExprNode, read_idx: usize) -> ValueId {
        let address = self.value_of(node.operands[0]);
        let read = &self.lowering.memory_reads[read_idx];
        let memory_name = self.plan.symbol_table.text(read.memory).to_string();
        let (width, is_signed) = self
            .plan
            .find_signal_by_symbol(read.memory)
            .map(|s| (s.width.max(1) as u32, s.is_signed))
            .unwrap_or((1, false));

        let mut operands = vec![address];
        if read.is_sync {
            operands.push(self.value_of(read.update_cond));
            operands.extend(read.event_operands.iter().map(|o| self.value_of(*o)));
        }

        let mut attrs = AttrMap::new();
        attrs.insert("memorySymbol".into(), AttrValue::Str(memory_name));
        attrs.insert("isSync".into(), AttrValue::Bool(read.is_sync));
        if read.is_sync {
            attrs.insert("eventEdge".into(), AttrValue::StrList(read.event_edges.iter().map(event_edge_str).collect()));
        }

        let sym = self.sym(node.temp_symbol);
        let op = self.graph.add_operation(
            sym,
            OperationKind::MemoryReadPort,
            operands,
            vec![(sym, width, is_signed, ValueType::Logic)],
            attrs,
            Some(node.loc.clone()),
        );
        self.graph.operation(op).results[0]
    }

    fn emit_operation(&mut self, node: &ExprNode) -> ValueId {
        let operands: Vec<ValueId> = node.operands.iter().map(|o| self.value_of(*o)).collect();
        let (width, is_signed, value_type) = self.infer_shape(node, &operands);
        let sym = self.sym(node.temp_symbol);

        let mut attrs = AttrMap::new();
        if node.op == OperationKind::MemberSelect {
            attrs.insert("member".into(), AttrValue::Str(node.literal.clone()));
        }
        if matches!(node.op, OperationKind::SystemTask | OperationKind::DpiCall) && !node.system_name.is_empty() {
            attrs.insert("name".into(), AttrValue::Str(node.system_name.clone()));
        }

        let op = self.graph.add_operation(
            sym,
            node.op,
            operands,
            vec![(sym, width, is_signed, value_type)],
            attrs,
            Some(node.loc.clone()),
        );
        self.graph.operation(op).results[0]
    }

    /// Best-effort width/sign/type propagation: `ExprNode` carries none of
    /// this (the lowerer never populates `width_hint`/`is_signed`/
    /// `value_type`), so the assembler derives a reasonable value from
    /// already-materialized operands. This is not a type checker — slice
    /// and member-select widths in particular fall back to the base
    /// operand's width since the arena doesn't disambiguate a direct
    /// bound pair from a base+width encoding (see DESIGN.md).
    fn infer_shape(&self, node: &ExprNode, operands: &[ValueId]) -> (u32, bool, ValueType) {
        let width_of = |i: usize| self.graph.value(operands[i]).width;
        let signed_of = |i: usize| self.graph.value(operands[i]).is_signed;
        let type_of = |i: usize| self.graph.value(operands[i]).value_type;
        match node.op {
            OperationKind::Add
            | OperationKind::Sub
            | OperationKind::Mul
            | OperationKind::Div
            | OperationKind::Mod
            | OperationKind::And
            | OperationKind::Or
            | OperationKind::Xor => {
                let w = operands.iter().map(|o| self.graph.value(*o).width).max().unwrap_or(1);
                let signed = !operands.is_empty() && operands.iter().all(|o| self.graph.value(*o).is_signed);
                (w, signed, ValueType::Logic)
            }
            OperationKind::Neg | OperationKind::Not | OperationKind::Shl | OperationKind::Shr | OperationKind::AShr => {
                (width_of(0), signed_of(0), type_of(0))
            }
            OperationKind::Eq
            | OperationKind::Neq
            | OperationKind::Lt
            | OperationKind::Lte
            | OperationKind::Gt
            | OperationKind::Gte
            | OperationKind::ReduceAnd
            | OperationKind::ReduceOr
            | OperationKind::ReduceXor
            | OperationKind::ReduceNand
            | OperationKind::ReduceNor
            | OperationKind::ReduceXnor => (1, false, ValueType::Bit),
            OperationKind::Mux => (width_of(1).max(width_of(2)), signed_of(1) || signed_of(2), type_of(1)),
            OperationKind::Case => {
                let w = operands.iter().skip(1).map(|o| self.graph.value(*o).width).max().unwrap_or(1);
                (w, false, ValueType::Logic)
            }
            OperationKind::Concat => {
                let w: u32 = operands.iter().map(|o| self.graph.value(*o).width).sum();
                (w.max(1), false, ValueType::Logic)
            }
            OperationKind::Replicate => {
                let count = const_of_node(self.lowering, node.operands[0]).unwrap_or(1).max(0) as u32;
                (width_of(1).saturating_mul(count.max(1)), false, type_of(1))
            }
            OperationKind::SliceStatic | OperationKind::SliceDynamic | OperationKind::MemberSelect => {
                (width_of(0).max(1), signed_of(0), type_of(0))
            }
            OperationKind::SystemTask | OperationKind::DpiCall => (32, false, ValueType::Logic),
            _ => (1, false, ValueType::Logic),
        }
    }

    // ---- write-back / memory write / task emission ----

    fn emit_write_backs(&mut self) {
        for entry in self.write_back.entries.clone().iter() {
            match entry.domain {
                ControlDomain::Sequential => self.emit_register_writes(entry),
                ControlDomain::Latch => self.emit_latch_writes(entry),
                ControlDomain::Combinational | ControlDomain::Unknown => self.emit_assign(entry),
            }
        }
    }

    /// Distinct `(eventEdges, eventOperands)` combinations among the
    /// underlying per-statement writes to this target, not just the one
    /// write-back resolved onto the merged entry (it only keeps the last
    /// non-empty one it saw) — a register written from two differently
    /// clocked `always_ff` blocks needs one write port per clock.
    fn collect_event_combos(&self, entry: &WriteBackEntry) -> Vec<(Vec<EventEdge>, Vec<ExprNodeId>)> {
        let mut combos: Vec<(Vec<EventEdge>, Vec<ExprNodeId>)> = Vec::new();
        for stmt in &self.lowering.lowered_stmts {
            if stmt.kind != LoweredStmtKind::Write || stmt.event_edges.is_empty() {
                continue;
            }
            let Some(write) = stmt.write.as_ref() else { continue };
            if write.target != entry.target {
                continue;
            }
            let combo = (stmt.event_edges.clone(), stmt.event_operands.clone());
            if !combos.contains(&combo) {
                combos.push(combo);
            }
        }
        if combos.is_empty() {
            combos.push((entry.event_edges.clone(), entry.event_operands.clone()));
        }
        combos
    }

    fn emit_register_writes(&mut self, entry: &WriteBackEntry) {
        let combos = self.collect_event_combos(entry);
        let next_value = self.value_of(entry.next_value);
        let update_cond = self.value_of(entry.update_cond);
        let target_name = self.plan.symbol_table.text(entry.target).to_string();
        let sym = self.sym(entry.target);
        for (edges, event_operands) in combos {
            let mut operands = vec![next_value, update_cond];
            operands.extend(event_operands.iter().map(|o| self.value_of(*o)));
            let mut attrs = AttrMap::new();
            attrs.insert("regSymbol".into(), AttrValue::Str(target_name.clone()));
            attrs.insert("eventEdge".into(), AttrValue::StrList(edges.iter().map(event_edge_str).collect()));
            if entry.has_static_slice {
                attrs.insert("sliceLow".into(), AttrValue::Int(entry.slice_low));
                attrs.insert("sliceWidth".into(), AttrValue::Int(entry.slice_width));
            }
            self.graph.add_operation(sym, OperationKind::RegisterWritePort, operands, vec![], attrs, Some(entry.loc.clone()));
        }
    }

    fn emit_latch_writes(&mut self, entry: &WriteBackEntry) {
        let combos = self.collect_event_combos(entry);
        let next_value = self.value_of(entry.next_value);
        let update_cond = self.value_of(entry.update_cond);
        let target_name = self.plan.symbol_table.text(entry.target).to_string();
        let sym = self.sym(entry.target);
        for (edges, event_operands) in combos {
            let mut operands = vec![next_value, update_cond];
            operands.extend(event_operands.iter().map(|o| self.value_of(*o)));
            let mut attrs = AttrMap::new();
            attrs.insert("latchSymbol".into(), AttrValue::Str(target_name.clone()));
            if !edges.is_empty() {
                attrs.insert("eventEdge".into(), AttrValue::StrList(edges.iter().map(event_edge_str).collect()));
            }
            if entry.has_static_slice {
                attrs.insert("sliceLow".into(), AttrValue::Int(entry.slice_low));
                attrs.insert("sliceWidth".into(), AttrValue::Int(entry.slice_width));
            }
            self.graph.add_operation(sym, OperationKind::LatchWritePort, operands, vec![], attrs, Some(entry.loc.clone()));
        }
    }

    fn emit_assign(&mut self, entry: &WriteBackEntry) {
        let target_value = self.resolve_symbol_read(entry.target);
        let source_value = self.value_of(entry.next_value);
        let sym = self.sym(entry.target);
        let mut attrs = AttrMap::new();
        if entry.has_static_slice {
            attrs.insert("sliceLow".into(), AttrValue::Int(entry.slice_low));
            attrs.insert("sliceWidth".into(), AttrValue::Int(entry.slice_width));
        }
        self.graph.add_operation(sym, OperationKind::Assign, vec![target_value, source_value], vec![], attrs, Some(entry.loc.clone()));
    }

    fn emit_memory_writes(&mut self) {
        for write in self.lowering.memory_writes.clone().iter() {
            let address = self.value_of(write.address);
            let data = self.value_of(write.data);
            let mut operands = vec![address, data];
            if write.is_masked {
                operands.push(self.value_of(write.mask));
            }
            operands.push(self.value_of(write.update_cond));
            operands.extend(write.event_operands.iter().map(|o| self.value_of(*o)));

            let mut attrs = AttrMap::new();
            attrs.insert("memorySymbol".into(), AttrValue::Str(self.plan.symbol_table.text(write.memory).to_string()));
            attrs.insert("isMasked".into(), AttrValue::Bool(write.is_masked));
            if !write.event_edges.is_empty() {
                attrs.insert("eventEdge".into(), AttrValue::StrList(write.event_edges.iter().map(event_edge_str).collect()));
            }
            let sym = self.sym(write.memory);
            self.graph.add_operation(sym, OperationKind::MemoryWritePort, operands, vec![], attrs, Some(write.loc.clone()));
        }
    }

    fn emit_tasks(&mut self) {
        for stmt in self.lowering.lowered_stmts.clone().iter() {
            match stmt.kind {
                LoweredStmtKind::SystemTask => {
                    let task = stmt.system_task.as_ref().unwrap();
                    let mut operands: Vec<ValueId> = task.args.iter().map(|a| self.value_of(*a)).collect();
                    if stmt.update_cond.valid() {
                        operands.push(self.value_of(stmt.update_cond));
                    }
                    let mut attrs = AttrMap::new();
                    attrs.insert("name".into(), AttrValue::Str(task.name.clone()));
                    let sym = self.graph.symbols.intern(&task.name);
                    self.graph.add_operation(sym, OperationKind::SystemTask, operands, vec![], attrs, Some(stmt.loc.clone()));
                }
                LoweredStmtKind::DpiCall => {
                    let call = stmt.dpi_call.as_ref().unwrap();
                    let mut operands: Vec<ValueId> = call.in_args.iter().map(|a| self.value_of(*a)).collect();
                    if stmt.update_cond.valid() {
                        operands.push(self.value_of(stmt.update_cond));
                    }
                    let mut attrs = AttrMap::new();
                    attrs.insert("targetImportSymbol".into(), AttrValue::Str(call.target_import_symbol.clone()));
                    attrs.insert("inArgNames".into(), AttrValue::StrList(call.in_arg_names.clone()));
                    attrs.insert("outArgNames".into(), AttrValue::StrList(call.out_arg_names.clone()));
                    attrs.insert("hasReturn".into(), AttrValue::Bool(call.has_return));
                    let results: Vec<(SymbolId, u32, bool, ValueType)> = call
                        .results
                        .iter()
                        .map(|&r| {
                            let w = self.plan.symbol_width(r).unwrap_or(32).max(1) as u32;
                            (self.sym(r), w, false, ValueType::Logic)
                        })
                        .collect();
                    let sym = self.graph.symbols.intern(&call.target_import_symbol);
                    let op = self.graph.add_operation(sym, OperationKind::DpiCall, operands, results, attrs, Some(stmt.loc.clone()));
                    let result_values = self.graph.operation(op).results.clone();
                    for (target, value) in call.results.iter().zip(result_values) {
                        self.write_net(*target, value);
                    }
                }
                LoweredStmtKind::Write => {}
            }
        }
    }

    // ---- instancing ----

    fn emit_instances(&mut self) {
        let instances = self.plan.instances.clone();
        let connections = self.lowering.instance_connections.clone();
        for (info, conn) in instances.iter().zip(connections.iter()) {
            if info.is_blackbox {
                self.emit_blackbox(info, conn);
            } else {
                self.emit_instance(info, conn);
            }
        }
    }

    /// An inout connection target is read like any other net (`in_value`)
    /// and paired with a per-net output-enable placeholder this crate
    /// doesn't attempt to resolve against other drivers — see DESIGN.md's
    /// Open Question decision on instance-level inout arbitration.
    fn inout_operand_pair(&mut self, target: PlanSymbolId) -> (ValueId, ValueId) {
        if !target.valid() {
            let a = self.unconnected_value(1, false, ValueType::Bit);
            let b = self.unconnected_value(1, false, ValueType::Bit);
            return (a, b);
        }
        let in_value = self.resolve_symbol_read(target);
        let oe_value = match self.net_oe_values.get(&target) {
            Some(v) => *v,
            None => {
                let name = format!("{}$oe", self.plan.symbol_table.text(target));
                let sym = self.graph.symbols.intern(&name);
                let v = self.graph.add_free_value(sym, 1, false, ValueType::Bit, None);
                self.net_oe_values.insert(target, v);
                v
            }
        };
        (in_value, oe_value)
    }

    fn emit_instance(&mut self, info: &InstanceInfo, conn: &InstanceConnection) {
        let key = PlanKey::new(info.definition, info.param_signature.clone());
        let Some(child_plan) = self.ctx.plan_cache.find_ready(&key) else {
            self.ctx.diagnostics.error(
                format!("instance '{}' has no ready child plan", self.plan.symbol_table.text(info.instance_symbol)),
                "assembler",
            );
            return;
        };
        let module_name = child_plan.symbol_table.text(child_plan.module_symbol).to_string();
        let graph_name = self.ctx.instance_registry.assign_name(&key, &module_name);
        let instance_name = self.plan.symbol_table.text(info.instance_symbol).to_string();

        let mut operands = Vec::new();
        let mut results_decl: Vec<(SymbolId, u32, bool, ValueType)> = Vec::new();
        let mut result_targets: Vec<PlanSymbolId> = Vec::new();
        let mut input_names = Vec::new();
        let mut output_names = Vec::new();
        let mut inout_names = Vec::new();

        for port in &child_plan.ports {
            let port_name = child_plan.symbol_table.text(port.symbol).to_string();
            match port.direction {
                PlanPortDirection::Input => {
                    let operand = conn.input_values.iter().find(|(name, _)| name == &port_name).map(|(_, v)| self.value_of(*v));
                    operands.push(operand.unwrap_or_else(|| self.unconnected_value(1, false, ValueType::Logic)));
                    input_names.push(port_name);
                }
                PlanPortDirection::Output => {
                    let target = conn
                        .output_targets
                        .iter()
                        .find(|(name, _)| name == &port_name)
                        .map(|(_, t)| *t)
                        .unwrap_or_else(PlanSymbolId::invalid);
                    let w = child_plan.symbol_width(port.symbol).unwrap_or(1).max(1) as u32;
                    let result_sym = self.graph.symbols.intern(&format!("{instance_name}.{port_name}"));
                    results_decl.push((result_sym, w, port.is_signed, rhg_value_type(port.value_type)));
                    result_targets.push(target);
                    output_names.push(port_name);
                }
                PlanPortDirection::Inout => {
                    let target = conn
                        .inout_targets
                        .iter()
                        .find(|(name, _)| name == &port_name)
                        .map(|(_, t)| *t)
                        .unwrap_or_else(PlanSymbolId::invalid);
                    let (in_value, oe_value) = self.inout_operand_pair(target);
                    operands.push(in_value);
                    operands.push(oe_value);
                    let w = child_plan.symbol_width(port.symbol).unwrap_or(1).max(1) as u32;
                    let result_sym = self.graph.symbols.intern(&format!("{instance_name}.{port_name}"));
                    results_decl.push((result_sym, w, port.is_signed, rhg_value_type(port.value_type)));
                    result_targets.push(target);
                    inout_names.push(port_name);
                }
            }
        }

        let mut attrs = AttrMap::new();
        attrs.insert("moduleName".into(), AttrValue::Str(module_name));
        attrs.insert("instanceName".into(), AttrValue::Str(instance_name.clone()));
        attrs.insert("graphName".into(), AttrValue::Str(graph_name));
        attrs.insert("inputPortName".into(), AttrValue::StrList(input_names));
        attrs.insert("outputPortName".into(), AttrValue::StrList(output_names));
        attrs.insert("inoutPortName".into(), AttrValue::StrList(inout_names));

        let sym = self.graph.symbols.intern(&instance_name);
        let op_id = self.graph.add_operation(sym, OperationKind::Instance, operands, results_decl, attrs, None);
        let result_values = self.graph.operation(op_id).results.clone();
        for (target, value) in result_targets.into_iter().zip(result_values) {
            if target.valid() {
                self.write_net(target, value);
            }
        }
    }

    fn emit_blackbox(&mut self, info: &InstanceInfo, conn: &InstanceConnection) {
        let module_name = self.plan.symbol_table.text(info.module_symbol).to_string();
        let instance_name = self.plan.symbol_table.text(info.instance_symbol).to_string();

        let mut operands = Vec::new();
        let mut results_decl: Vec<(SymbolId, u32, bool, ValueType)> = Vec::new();
        let mut result_targets: Vec<PlanSymbolId> = Vec::new();
        let mut input_names = Vec::new();
        let mut output_names = Vec::new();
        let mut inout_names = Vec::new();

        for (port_symbol, direction) in info.blackbox_ports.clone().iter() {
            let port_name = self.plan.symbol_table.text(*port_symbol).to_string();
            match direction {
                PlanPortDirection::Input => {
                    let operand = conn.input_values.iter().find(|(name, _)| name == &port_name).map(|(_, v)| self.value_of(*v));
                    operands.push(operand.unwrap_or_else(|| self.unconnected_value(1, false, ValueType::Logic)));
                    input_names.push(port_name);
                }
                PlanPortDirection::Output => {
                    let target = conn
                        .output_targets
                        .iter()
                        .find(|(name, _)| name == &port_name)
                        .map(|(_, t)| *t)
                        .unwrap_or_else(PlanSymbolId::invalid);
                    let result_sym = self.graph.symbols.intern(&format!("{instance_name}.{port_name}"));
                    results_decl.push((result_sym, 1, false, ValueType::Logic));
                    result_targets.push(target);
                    output_names.push(port_name);
                }
                PlanPortDirection::Inout => {
                    let target = conn
                        .inout_targets
                        .iter()
                        .find(|(name, _)| name == &port_name)
                        .map(|(_, t)| *t)
                        .unwrap_or_else(PlanSymbolId::invalid);
                    let (in_value, oe_value) = self.inout_operand_pair(target);
                    operands.push(in_value);
                    operands.push(oe_value);
                    let result_sym = self.graph.symbols.intern(&format!("{instance_name}.{port_name}"));
                    results_decl.push((result_sym, 1, false, ValueType::Logic));
                    result_targets.push(target);
                    inout_names.push(port_name);
                }
            }
        }

        let mut attrs = AttrMap::new();
        attrs.insert("moduleName".into(), AttrValue::Str(module_name));
        attrs.insert("instanceName".into(), AttrValue::Str(instance_name.clone()));
        attrs.insert("inputPortName".into(), AttrValue::StrList(input_names));
        attrs.insert("outputPortName".into(), AttrValue::StrList(output_names));
        attrs.insert("inoutPortName".into(), AttrValue::StrList(inout_names));
        attrs.insert(
            "parameterNames".into(),
            AttrValue::StrList(info.parameters.iter().map(|p| self.plan.symbol_table.text(p.symbol).to_string()).collect()),
        );
        attrs.insert("parameterValues".into(), AttrValue::StrList(info.parameters.iter().map(|p| p.value.clone()).collect()));

        let sym = self.graph.symbols.intern(&instance_name);
        let op_id = self.graph.add_operation(sym, OperationKind::Blackbox, operands, results_decl, attrs, None);
        let result_values = self.graph.operation(op_id).results.clone();
        for (target, value) in result_targets.into_iter().zip(result_values) {
            if target.valid() {
                self.write_net(target, value);
            }
        }
    }

    // ---- port surface ----

    fn wire_ports(&mut self) {
        for port in self.plan.ports.clone().iter() {
            let sym_id = self.sym(port.symbol);
            match port.direction {
                PlanPortDirection::Input => {
                    let v = self.resolve_symbol_read(port.symbol);
                    self.graph.add_input_port(sym_id, v);
                }
                PlanPortDirection::Output => {
                    let v = self.resolve_symbol_read(port.symbol);
                    self.graph.add_output_port(sym_id, v);
                }
                PlanPortDirection::Inout => {
                    let binding = port.inout_binding.unwrap();
                    let in_value = self.resolve_symbol_read(binding.in_symbol);
                    let out_value = self.resolve_symbol_read(binding.out_symbol);
                    let oe_value = self.resolve_symbol_read(binding.oe_symbol);
                    self.graph.add_inout_port(InoutPort {
                        name: sym_id,
                        in_value,
                        out_value,
                        oe_value,
                    });
                }
            }
        }
    }
}
