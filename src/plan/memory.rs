//! Per-storage records collected during statement lowering and consumed by
//! the Graph Assembler when it materializes `Memory`/`Register` storage
//! declarations and their read/write ports.

use crate::ast::SourceLoc;

use super::common::EventEdge;
use super::expr_node::ExprNodeId;
use super::key::PlanSymbolId;

#[derive(Debug, Clone)]
pub struct MemoryReadPort {
    pub memory: PlanSymbolId,
    pub address: ExprNodeId,
    /// Set for synchronous (clocked) reads; `event_edges`/`event_operands`
    /// are only meaningful when this is true.
    pub is_sync: bool,
    pub update_cond: ExprNodeId,
    pub event_edges: Vec<EventEdge>,
    pub event_operands: Vec<ExprNodeId>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct MemoryWritePort {
    pub memory: PlanSymbolId,
    pub address: ExprNodeId,
    pub data: ExprNodeId,
    pub mask: ExprNodeId,
    pub update_cond: ExprNodeId,
    /// Set when the write targets a part-select of the addressed row
    /// rather than the whole row.
    pub is_masked: bool,
    pub event_edges: Vec<EventEdge>,
    pub event_operands: Vec<ExprNodeId>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryInitKind {
    Literal,
    ReadMemH,
    ReadMemB,
}

#[derive(Debug, Clone)]
pub struct MemoryInit {
    pub memory: PlanSymbolId,
    pub kind: MemoryInitKind,
    /// Source file path, for `ReadMemH`/`ReadMemB`.
    pub file: String,
    /// Raw literal text for `Literal` inits, preserved unevaluated
    /// (including `$random`/`$random(seed)` text — see DESIGN.md's Open
    /// Question decision).
    pub init_value: String,
    /// `< 0` means "no address range given" (full init).
    pub start: i64,
    /// `<= 0` means "no finish address"; ignored when `start < 0`.
    pub len: i64,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone)]
pub struct RegisterInit {
    pub reg: PlanSymbolId,
    pub init_value: String,
    pub loc: SourceLoc,
}
