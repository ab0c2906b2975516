//! Plan intermediates: the scratch data structures that live only inside
//! the ingest pipeline and are discarded once the Graph Assembler has
//! consumed them for a given [`PlanKey`]. See `SPEC_FULL.md` §3 for the
//! full field-level description of each type.

mod common;
mod expr_node;
mod instance;
mod key;
mod lowered_stmt;
mod lowering_plan;
mod memory;
mod module_plan;
mod write_back;
mod write_intent;

pub use common::{ControlDomain, EventEdge, ProcKind};
pub use expr_node::{ExprNode, ExprNodeId, ExprNodeKind};
pub use instance::InstanceConnection;
pub use key::{canonical_param_signature, PlanKey, PlanSymbolId, PlanSymbolTable};
pub use lowered_stmt::{DpiCallStmt, DpiImportInfo, LoweredStmt, LoweredStmtKind, SystemTaskStmt};
pub use lowering_plan::LoweringPlan;
pub use memory::{MemoryInit, MemoryInitKind, MemoryReadPort, MemoryWritePort, RegisterInit};
pub use module_plan::{
    InoutBinding, InoutSignalInfo, InstanceInfo, InstanceParameter, ModulePlan, PortDirection,
    PortInfo, SignalInfo, SignalKind, UnpackedDimInfo,
};
pub use write_back::{WriteBackEntry, WriteBackPlan};
pub use write_intent::{WriteIntent, WriteRangeKind, WriteSlice, WriteSliceKind};
