//! The Write-Back Resolver's output: one consolidated next-state driver per
//! written target signal.

use crate::ast::SourceLoc;

use super::common::{ControlDomain, EventEdge};
use super::expr_node::ExprNodeId;
use super::key::PlanSymbolId;

#[derive(Debug, Clone)]
pub struct WriteBackEntry {
    pub target: PlanSymbolId,
    pub domain: ControlDomain,
    pub update_cond: ExprNodeId,
    pub next_value: ExprNodeId,
    /// Set when the entire update is a single contiguous bit range of the
    /// target, letting the assembler emit a narrow write port instead of a
    /// full-width read-modify-write.
    pub has_static_slice: bool,
    pub slice_low: i64,
    pub slice_width: i64,
    pub event_edges: Vec<EventEdge>,
    pub event_operands: Vec<ExprNodeId>,
    pub loc: SourceLoc,
}

#[derive(Debug, Clone, Default)]
pub struct WriteBackPlan {
    pub entries: Vec<WriteBackEntry>,
}
