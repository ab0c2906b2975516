use super::attr::AttrMap;
use super::ids::{OperationId, ValueId};
use super::symbol::SymbolId;
use crate::ast::SourceLoc;

/// The closed set of operation shapes an ingested graph can contain.
/// Arithmetic/bitwise/shift/compare/reduction operators are pure; the
/// remaining kinds encode structural or side-effecting constructs
/// (storage, instancing, tasks) as ordinary operand/result nodes so the
/// rest of the graph stays uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    // Bitwise
    And,
    Or,
    Xor,
    Not,
    // Shift
    Shl,
    Shr,
    AShr,
    // Comparison
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Reduction
    ReduceAnd,
    ReduceOr,
    ReduceXor,
    ReduceNand,
    ReduceNor,
    ReduceXnor,
    // Selection
    Mux,
    Case,
    // Structural
    Concat,
    Replicate,
    SliceStatic,
    SliceDynamic,
    MemberSelect,
    // Terminal
    Constant,
    // Effectful / write-back
    Assign,
    XmrRead,
    // Storage declarations
    Register,
    Latch,
    Memory,
    // Storage ports
    RegisterReadPort,
    RegisterWritePort,
    LatchReadPort,
    LatchWritePort,
    MemoryReadPort,
    MemoryWritePort,
    // Hierarchy
    Instance,
    Blackbox,
    // Tasks
    SystemTask,
    DpiCall,
}

impl OperationKind {
    /// Storage declarations, storage write ports, and task kinds may
    /// legitimately have zero results; every other kind must produce at
    /// least one value. A storage declaration (`Register`/`Latch`/`Memory`)
    /// just reserves the backing state — reading or writing it goes through
    /// a dedicated read/write port operation instead. `Assign` mutates a
    /// pre-declared net/port handle through an operand rather than
    /// producing a fresh value, mirroring the storage write ports.
    pub fn allows_no_result(&self) -> bool {
        matches!(
            self,
            OperationKind::Register
                | OperationKind::Latch
                | OperationKind::Memory
                | OperationKind::RegisterWritePort
                | OperationKind::LatchWritePort
                | OperationKind::MemoryWritePort
                | OperationKind::SystemTask
                | OperationKind::DpiCall
                | OperationKind::Assign
        )
    }
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub symbol: SymbolId,
    pub kind: OperationKind,
    pub operands: Vec<ValueId>,
    pub results: Vec<ValueId>,
    pub attrs: AttrMap,
    pub src_loc: Option<SourceLoc>,
    pub(crate) id: OperationId,
}

impl Operation {
    pub fn id(&self) -> OperationId {
        self.id
    }
}
