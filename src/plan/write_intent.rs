//! One ordered, possibly partial, guarded assignment extracted from a
//! procedural block or continuous assignment by the Statement Lowerer. The
//! Write-Back Resolver groups these by target and folds them into
//! [`super::write_back::WriteBackPlan`] entries.

use crate::ast::SourceLoc;

use super::common::ControlDomain;
use super::expr_node::ExprNodeId;
use super::key::PlanSymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSliceKind {
    None,
    BitSelect,
    RangeSelect,
    MemberSelect,
}

/// `Simple` is `target[left:right]`; `IndexedUp`/`IndexedDown` are
/// `target[base +: width]` / `target[base -: width]`. Carried from the
/// original's three-way `WriteRangeKind` rather than collapsing to a single
/// "dynamic" case, since the resolver needs to know the direction to fold a
/// constant-index indexed-part-select into the same static bounds a plain
/// range-select would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRangeKind {
    Simple,
    IndexedUp,
    IndexedDown,
}

#[derive(Debug, Clone)]
pub struct WriteSlice {
    pub kind: WriteSliceKind,
    pub range_kind: WriteRangeKind,
    pub index: ExprNodeId,
    pub left: ExprNodeId,
    pub right: ExprNodeId,
    pub member: PlanSymbolId,
    pub loc: SourceLoc,
}

impl WriteSlice {
    pub fn bit_select(index: ExprNodeId, loc: SourceLoc) -> Self {
        Self {
            kind: WriteSliceKind::BitSelect,
            range_kind: WriteRangeKind::Simple,
            index,
            left: ExprNodeId::invalid(),
            right: ExprNodeId::invalid(),
            member: PlanSymbolId::invalid(),
            loc,
        }
    }

    pub fn range_select(left: ExprNodeId, right: ExprNodeId, loc: SourceLoc) -> Self {
        Self {
            kind: WriteSliceKind::RangeSelect,
            range_kind: WriteRangeKind::Simple,
            index: ExprNodeId::invalid(),
            left,
            right,
            member: PlanSymbolId::invalid(),
            loc,
        }
    }

    pub fn indexed_part_select(base_index: ExprNodeId, width_exprs: (ExprNodeId, ExprNodeId), indexed_up: bool, loc: SourceLoc) -> Self {
        Self {
            kind: WriteSliceKind::RangeSelect,
            range_kind: if indexed_up { WriteRangeKind::IndexedUp } else { WriteRangeKind::IndexedDown },
            index: base_index,
            left: width_exprs.0,
            right: width_exprs.1,
            member: PlanSymbolId::invalid(),
            loc,
        }
    }

    pub fn member_select(member: PlanSymbolId, loc: SourceLoc) -> Self {
        Self {
            kind: WriteSliceKind::MemberSelect,
            range_kind: WriteRangeKind::Simple,
            index: ExprNodeId::invalid(),
            left: ExprNodeId::invalid(),
            right: ExprNodeId::invalid(),
            member,
            loc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriteIntent {
    pub target: PlanSymbolId,
    pub slices: Vec<WriteSlice>,
    pub value: ExprNodeId,
    pub guard: ExprNodeId,
    pub domain: ControlDomain,
    pub is_non_blocking: bool,
    /// Set when the combined case items of the enclosing branch exhaust the
    /// target type's two-state value space, letting the resolver drop the
    /// `oldValue` base case from the priority mux.
    pub covers_all_two_state: bool,
    pub is_xmr: bool,
    pub xmr_path: String,
    pub loc: SourceLoc,
}
