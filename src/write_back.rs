//! The Write-Back Resolver (§4.5): takes every [`crate::plan::WriteIntent`]
//! the Statement Lowerer recorded for a module and folds the ones that share
//! a target into one consolidated next-state driver per signal.
//!
//! A target written from more than one guarded branch becomes a
//! priority-encoded mux chain, later (higher-priority) intents nested
//! outermost, matching last-write-wins procedural semantics. A target
//! touched only through static, disjoint, unconditional bit ranges collapses
//! to a single `kConcat`; anything else — a dynamic index, overlapping
//! ranges, or a partial write mixed with guards — falls back to an explicit
//! shift/mask/or reconstruction so the back end can still see the slice
//! boundaries in the op stream rather than a folded constant.

use crate::ast::SourceLoc;
use crate::diagnostics::Diagnostics;
use crate::lowerer::parse_sv_literal;
use crate::plan::{
    ControlDomain, ExprNode, ExprNodeId, LoweredStmtKind, LoweringPlan, ModulePlan, PlanSymbolId,
    PortDirection, WriteBackEntry, WriteBackPlan, WriteIntent, WriteRangeKind, WriteSliceKind,
};
use crate::rhg::OperationKind;
use std::collections::HashMap;

struct Entry<'a> {
    intent: &'a WriteIntent,
    event_edges: Vec<crate::plan::EventEdge>,
    event_operands: Vec<ExprNodeId>,
}

pub fn resolve_write_back(plan: &ModulePlan, lowering: &mut LoweringPlan, diagnostics: &Diagnostics) -> WriteBackPlan {
    let mut order: Vec<PlanSymbolId> = Vec::new();
    let mut groups: HashMap<PlanSymbolId, Vec<usize>> = HashMap::new();
    for (idx, stmt) in lowering.lowered_stmts.iter().enumerate() {
        if stmt.kind != LoweredStmtKind::Write {
            continue;
        }
        let Some(write) = stmt.write.as_ref() else { continue };
        if !groups.contains_key(&write.target) {
            order.push(write.target);
        }
        groups.entry(write.target).or_default().push(idx);
    }

    let mut plan_out = WriteBackPlan::default();
    for target in order {
        let indices = groups.remove(&target).unwrap_or_default();
        if indices.is_empty() {
            continue;
        }
        let target_name = plan.symbol_table.text(target).to_string();

        if let Some(port) = plan.find_port_by_symbol(target) {
            if port.direction == PortDirection::Input {
                diagnostics.error(format!("cannot write to input port '{target_name}'"), "write_back");
                continue;
            }
        }

        let entries: Vec<Entry> = indices
            .iter()
            .map(|&idx| {
                let stmt = &lowering.lowered_stmts[idx];
                Entry {
                    intent: stmt.write.as_ref().unwrap(),
                    event_edges: stmt.event_edges.clone(),
                    event_operands: stmt.event_operands.clone(),
                }
            })
            .collect();

        let mut domain = entries[0].intent.domain;
        for e in &entries[1..] {
            if e.intent.domain != domain {
                diagnostics.error(
                    format!("target '{target_name}' is written from mixed combinational/sequential domains"),
                    "write_back",
                );
                domain = ControlDomain::Unknown;
                break;
            }
        }

        let last = entries.last().unwrap();
        let exhaustive = last.intent.covers_all_two_state && last.intent.slices.is_empty();
        if domain == ControlDomain::Combinational && !exhaustive {
            domain = ControlDomain::Latch;
        }

        let width = plan.symbol_width(target).unwrap_or(1).max(1);
        let has_slices = entries.iter().any(|e| !e.intent.slices.is_empty());
        let loc = last.intent.loc;

        let (next_value, has_static_slice, slice_low, slice_width) = if !has_slices {
            let next = fold_full_width(lowering, plan, target, &entries, domain, width);
            (next, false, 0, 0)
        } else if let Some((next, lo, hi)) = try_static_concat(lowering, &entries, width) {
            (next, true, lo, hi - lo + 1)
        } else {
            diagnostics.warning(
                format!("write-back merge for '{target_name}' reconciles a partial or dynamic slice"),
                "write_back",
            );
            let next = fold_masked(lowering, plan, target, &entries, domain, width, diagnostics, &target_name);
            (next, false, 0, 0)
        };

        let (event_edges, event_operands) = entries
            .iter()
            .rev()
            .find(|e| !e.event_edges.is_empty())
            .map(|e| (e.event_edges.clone(), e.event_operands.clone()))
            .unwrap_or_default();

        let update_cond = lowering.push_node(ExprNode::constant("1", loc));

        plan_out.entries.push(WriteBackEntry {
            target,
            domain,
            update_cond,
            next_value,
            has_static_slice,
            slice_low,
            slice_width,
            event_edges,
            event_operands,
            loc,
        });
    }

    plan_out
}

fn base_value_node(lowering: &mut LoweringPlan, target: PlanSymbolId, domain: ControlDomain, width: i32, loc: SourceLoc) -> ExprNodeId {
    match domain {
        ControlDomain::Sequential | ControlDomain::Latch => lowering.push_node(ExprNode::symbol(target, loc)),
        _ => lowering.push_node(ExprNode::constant(format!("{width}'d0"), loc)),
    }
}

fn push_mux(lowering: &mut LoweringPlan, guard: ExprNodeId, then_val: ExprNodeId, else_val: ExprNodeId, loc: SourceLoc) -> ExprNodeId {
    lowering.push_node(ExprNode::operation(OperationKind::Mux, vec![guard, then_val, else_val], loc))
}

fn fold_full_width(
    lowering: &mut LoweringPlan,
    _plan: &ModulePlan,
    target: PlanSymbolId,
    entries: &[Entry],
    domain: ControlDomain,
    width: i32,
) -> ExprNodeId {
    let loc = entries.last().unwrap().intent.loc;
    let mut acc = base_value_node(lowering, target, domain, width, loc);
    for e in entries {
        acc = push_mux(lowering, e.intent.guard, e.intent.value, acc, e.intent.loc);
    }
    acc
}

/// Attempts to treat every entry in the group as an unconditional, constant
/// bit/range write and tile them into one `kConcat` spanning the full
/// declared width with no gaps or overlaps. Returns `(node, lo, hi)` on
/// success.
fn try_static_concat(lowering: &mut LoweringPlan, entries: &[Entry], width: i32) -> Option<(ExprNodeId, i64, i64)> {
    let mut ranges: Vec<(i64, i64, ExprNodeId)> = Vec::with_capacity(entries.len());
    for e in entries {
        if !is_unconditional(lowering, e.intent.guard) {
            return None;
        }
        if e.intent.slices.len() != 1 {
            return None;
        }
        let slice = &e.intent.slices[0];
        let (lo, hi) = match slice.kind {
            WriteSliceKind::BitSelect => {
                let idx = const_of(lowering, slice.index)?;
                (idx, idx)
            }
            WriteSliceKind::RangeSelect => match slice.range_kind {
                WriteRangeKind::Simple => {
                    let l = const_of(lowering, slice.left)?;
                    let r = const_of(lowering, slice.right)?;
                    (l.min(r), l.max(r))
                }
                WriteRangeKind::IndexedUp | WriteRangeKind::IndexedDown => {
                    let base = const_of(lowering, slice.index)?;
                    let w = const_of(lowering, slice.left)?;
                    if matches!(slice.range_kind, WriteRangeKind::IndexedUp) {
                        (base, base + w - 1)
                    } else {
                        (base - w + 1, base)
                    }
                }
            },
            WriteSliceKind::MemberSelect => return None,
            WriteSliceKind::None => return None,
        };
        ranges.push((lo, hi, e.intent.value));
    }
    ranges.sort_by_key(|(lo, _, _)| *lo);
    let mut expect = 0i64;
    for (lo, hi, _) in &ranges {
        if *lo != expect {
            return None;
        }
        expect = hi + 1;
    }
    if expect != width as i64 {
        return None;
    }
    let loc = entries.last().unwrap().intent.loc;
    let operands: Vec<ExprNodeId> = ranges.into_iter().rev().map(|(_, _, v)| v).collect();
    Some((lowering.push_node(ExprNode::operation(OperationKind::Concat, operands, loc)), 0, width as i64 - 1))
}

fn is_unconditional(lowering: &LoweringPlan, guard: ExprNodeId) -> bool {
    if !guard.valid() {
        return true;
    }
    const_of(lowering, guard) == Some(1)
}

fn const_of(lowering: &LoweringPlan, id: ExprNodeId) -> Option<i64> {
    if !id.valid() {
        return None;
    }
    let node = lowering.node(id);
    if node.kind != crate::plan::ExprNodeKind::Constant {
        return None;
    }
    parse_sv_literal(&node.literal)
}

/// The generic reconciliation path for partial writes: builds an explicit
/// shift/mask/or chain per write so the resulting op stream still shows the
/// slice boundaries rather than a folded constant.
fn fold_masked(
    lowering: &mut LoweringPlan,
    plan: &ModulePlan,
    target: PlanSymbolId,
    entries: &[Entry],
    domain: ControlDomain,
    width: i32,
    diagnostics: &Diagnostics,
    target_name: &str,
) -> ExprNodeId {
    let loc = entries.last().unwrap().intent.loc;
    let mut acc = base_value_node(lowering, target, domain, width, loc);

    for e in entries {
        let intent = e.intent;
        if intent.slices.is_empty() {
            acc = push_mux(lowering, intent.guard, intent.value, acc, intent.loc);
            continue;
        }
        if intent.slices.len() != 1 {
            diagnostics.todo_at(intent.loc, "write_back", format!("chained lvalue slices on '{target_name}' are not supported"));
            continue;
        }
        let slice = &intent.slices[0];
        let (offset, slice_width) = match slice.kind {
            WriteSliceKind::BitSelect => (slice.index, 1i64),
            WriteSliceKind::RangeSelect => match slice.range_kind {
                WriteRangeKind::Simple => {
                    if let (Some(l), Some(r)) = (const_of(lowering, slice.left), const_of(lowering, slice.right)) {
                        let lo = l.min(r);
                        let w = (l.max(r) - lo + 1).max(1);
                        (lowering.push_node(ExprNode::constant(format!("{lo}"), slice.loc)), w)
                    } else {
                        diagnostics.todo_at(slice.loc, "write_back", format!("non-constant range select bounds on '{target_name}' are not supported"));
                        continue;
                    }
                }
                WriteRangeKind::IndexedUp | WriteRangeKind::IndexedDown => {
                    let Some(w) = const_of(lowering, slice.left) else {
                        diagnostics.todo_at(slice.loc, "write_back", format!("indexed part-select width on '{target_name}' must be constant"));
                        continue;
                    };
                    if matches!(slice.range_kind, WriteRangeKind::IndexedUp) {
                        (slice.index, w)
                    } else if let Some(base) = const_of(lowering, slice.index) {
                        (lowering.push_node(ExprNode::constant(format!("{}", base - w + 1), slice.loc)), w)
                    } else {
                        (slice.index, w)
                    }
                }
            },
            WriteSliceKind::MemberSelect => {
                let member_name = plan.symbol_table.text(slice.member);
                diagnostics.todo_at(slice.loc, "write_back", format!("member-select write-back on '{target_name}.{member_name}' is not supported"));
                continue;
            }
            WriteSliceKind::None => continue,
        };

        let mask_value = if slice_width >= 63 { u64::MAX } else { (1u64 << slice_width) - 1 };
        let mask_const = lowering.push_node(ExprNode::constant(format!("{mask_value}"), slice.loc));
        let shifted_mask = lowering.push_node(ExprNode::operation(OperationKind::Shl, vec![mask_const, offset], slice.loc));
        let not_mask = lowering.push_node(ExprNode::operation(OperationKind::Not, vec![shifted_mask], slice.loc));
        let shifted_value = lowering.push_node(ExprNode::operation(OperationKind::Shl, vec![intent.value, offset], slice.loc));
        let masked_old = lowering.push_node(ExprNode::operation(OperationKind::And, vec![acc, not_mask], slice.loc));
        let masked_new = lowering.push_node(ExprNode::operation(OperationKind::And, vec![shifted_value, shifted_mask], slice.loc));
        let combined = lowering.push_node(ExprNode::operation(OperationKind::Or, vec![masked_old, masked_new], slice.loc));
        acc = push_mux(lowering, intent.guard, combined, acc, intent.loc);
    }
    acc
}
