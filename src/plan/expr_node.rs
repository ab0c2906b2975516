//! Pre-SSA expression nodes: the Statement Lowerer's intermediate form
//! before the Graph Assembler allocates real [`crate::rhg::Value`]s and
//! [`crate::rhg::Operation`]s for them.

use crate::ast::SourceLoc;
use crate::rhg::OperationKind;

use super::key::PlanSymbolId;

pub const INVALID_EXPR_NODE: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprNodeId(u32);

impl ExprNodeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn invalid() -> Self {
        Self(INVALID_EXPR_NODE)
    }

    pub fn valid(&self) -> bool {
        self.0 != INVALID_EXPR_NODE
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Default for ExprNodeId {
    fn default() -> Self {
        Self::invalid()
    }
}

/// The `ExprNode` union modeled as a tagged variant with a discriminator
/// and inlined payload fields (no virtual dispatch needed — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprNodeKind {
    Invalid,
    Constant,
    Symbol,
    XmrRead,
    Operation,
}

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub kind: ExprNodeKind,
    /// Only meaningful when `kind == Operation`.
    pub op: OperationKind,
    /// The declared signal this node reads, for `kind == Symbol`.
    pub symbol: PlanSymbolId,
    /// A fresh temp symbol naming this node's own result, used by the
    /// assembler to name the `Value` it allocates for non-`Symbol` nodes.
    pub temp_symbol: PlanSymbolId,
    /// Canonical literal text, for `kind == Constant` (e.g. `"8'hAB"`).
    pub literal: String,
    /// System-call name, for `SystemTask`/`DpiCall` argument nodes that
    /// carry a function name (e.g. `$display`, a DPI import name).
    pub system_name: String,
    /// Dotted hierarchical path text, for `kind == XmrRead`.
    pub xmr_path: String,
    pub operands: Vec<ExprNodeId>,
    pub width_hint: i32,
    pub is_signed: bool,
    pub value_type: crate::ast::ValueType,
    pub has_side_effects: bool,
    pub loc: SourceLoc,
}

impl ExprNode {
    fn base(kind: ExprNodeKind, loc: SourceLoc) -> Self {
        Self {
            kind,
            op: OperationKind::Constant,
            symbol: PlanSymbolId::invalid(),
            temp_symbol: PlanSymbolId::invalid(),
            literal: String::new(),
            system_name: String::new(),
            xmr_path: String::new(),
            operands: Vec::new(),
            width_hint: 0,
            is_signed: false,
            value_type: crate::ast::ValueType::Logic,
            has_side_effects: false,
            loc,
        }
    }

    pub fn constant(literal: impl Into<String>, loc: SourceLoc) -> Self {
        Self {
            literal: literal.into(),
            ..Self::base(ExprNodeKind::Constant, loc)
        }
    }

    pub fn symbol(symbol: PlanSymbolId, loc: SourceLoc) -> Self {
        Self {
            symbol,
            ..Self::base(ExprNodeKind::Symbol, loc)
        }
    }

    pub fn xmr_read(path: impl Into<String>, loc: SourceLoc) -> Self {
        Self {
            xmr_path: path.into(),
            ..Self::base(ExprNodeKind::XmrRead, loc)
        }
    }

    pub fn operation(op: OperationKind, operands: Vec<ExprNodeId>, loc: SourceLoc) -> Self {
        Self {
            op,
            operands,
            ..Self::base(ExprNodeKind::Operation, loc)
        }
    }
}
