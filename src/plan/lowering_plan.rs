//! The Statement Lowerer's full output for one module: the expression-node
//! arena plus every write/task/DPI statement and storage record it
//! produced. Consumed by the Write-Back Resolver and the Graph Assembler,
//! then dropped.

use super::expr_node::{ExprNode, ExprNodeId};
use super::instance::InstanceConnection;
use super::key::PlanSymbolId;
use super::lowered_stmt::{DpiImportInfo, LoweredStmt};
use super::memory::{MemoryInit, MemoryReadPort, MemoryWritePort, RegisterInit};
use super::write_intent::WriteIntent;

#[derive(Debug, Clone, Default)]
pub struct LoweringPlan {
    pub values: Vec<ExprNode>,
    pub temp_symbols: Vec<PlanSymbolId>,
    pub writes: Vec<WriteIntent>,
    pub lowered_stmts: Vec<LoweredStmt>,
    pub dpi_imports: Vec<DpiImportInfo>,
    pub memory_reads: Vec<MemoryReadPort>,
    pub memory_writes: Vec<MemoryWritePort>,
    pub memory_inits: Vec<MemoryInit>,
    pub register_inits: Vec<RegisterInit>,
    /// One entry per `ModulePlan.instances` entry, same order.
    pub instance_connections: Vec<InstanceConnection>,
}

impl LoweringPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, node: ExprNode) -> ExprNodeId {
        let id = ExprNodeId::new(self.values.len() as u32);
        self.values.push(node);
        id
    }

    pub fn node(&self, id: ExprNodeId) -> &ExprNode {
        &self.values[id.index()]
    }
}
