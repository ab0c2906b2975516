//! Per-instantiation port wiring. A port-connection expression lives in the
//! *instantiating* module's scope, so it is lowered by the Statement
//! Lowerer alongside everything else rather than deferred to the Graph
//! Assembler — the assembler only needs to look the values back up.
//!
//! One `InstanceConnection` per entry in `ModulePlan.instances`, in the
//! same order, so the two lists can be zipped by index.

use super::expr_node::ExprNodeId;
use super::key::PlanSymbolId;

#[derive(Debug, Clone, Default)]
pub struct InstanceConnection {
    /// `(child port name, value driving it)`.
    pub input_values: Vec<(String, ExprNodeId)>,
    /// `(child port name, parent-scope signal the output is bound to)`.
    pub output_targets: Vec<(String, PlanSymbolId)>,
    /// `(child port name, parent-scope signal the inout is bound to)`.
    pub inout_targets: Vec<(String, PlanSymbolId)>,
}
