//! The `PlanCache`: ensures at-most-one lowering per [`PlanKey`] across all
//! workers while letting other workers consume the resulting plan and its
//! derived artifacts (§4.1). The cache is the sole place dedup happens —
//! the task queue (`crate::queue`) stays a plain FIFO and admits duplicate
//! keys on purpose, per the design note in `SPEC_FULL.md` §9.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::plan::{LoweringPlan, ModulePlan, PlanKey, WriteBackPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    Pending,
    Planning,
    Done,
    Failed,
}

#[derive(Default)]
struct PlanEntry {
    status: Option<PlanStatus>,
    plan: Option<ModulePlan>,
    lowering_plan: Option<LoweringPlan>,
    write_back_plan: Option<WriteBackPlan>,
}

#[derive(Default)]
pub struct PlanCache {
    entries: Mutex<HashMap<PlanKey, PlanEntry>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically transitions the key's status from absent/`Pending` to
    /// `Planning` and returns `true` iff this caller now owns the work.
    /// Already-`Planning`/`Done`/`Failed` entries return `false` without
    /// blocking.
    pub fn try_claim(&self, key: &PlanKey) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_default();
        match entry.status {
            None | Some(PlanStatus::Pending) => {
                entry.status = Some(PlanStatus::Planning);
                true
            }
            Some(_) => false,
        }
    }

    /// Transitions `Planning` -> `Done` and stores the module plan. Storing
    /// after `markFailed` is a programming error.
    pub fn store_plan(&self, key: &PlanKey, plan: ModulePlan) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_default();
        debug_assert_ne!(entry.status, Some(PlanStatus::Failed), "storePlan after markFailed");
        entry.status = Some(PlanStatus::Done);
        entry.plan = Some(plan);
    }

    pub fn mark_failed(&self, key: &PlanKey) {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(key.clone()).or_default().status = Some(PlanStatus::Failed);
    }

    pub fn status(&self, key: &PlanKey) -> Option<PlanStatus> {
        self.entries.lock().unwrap().get(key).and_then(|e| e.status)
    }

    /// Returns the plan only when status is `Done`; never blocks.
    pub fn find_ready(&self, key: &PlanKey) -> Option<ModulePlan> {
        let entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if entry.status == Some(PlanStatus::Done) {
            entry.plan.clone()
        } else {
            None
        }
    }

    pub fn set_lowering_plan(&self, key: &PlanKey, plan: LoweringPlan) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.lowering_plan = Some(plan);
                true
            }
            None => false,
        }
    }

    pub fn set_write_back_plan(&self, key: &PlanKey, plan: WriteBackPlan) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.write_back_plan = Some(plan);
                true
            }
            None => false,
        }
    }

    pub fn get_lowering_plan(&self, key: &PlanKey) -> Option<LoweringPlan> {
        self.entries.lock().unwrap().get(key).and_then(|e| e.lowering_plan.clone())
    }

    pub fn get_write_back_plan(&self, key: &PlanKey) -> Option<WriteBackPlan> {
        self.entries.lock().unwrap().get(key).and_then(|e| e.write_back_plan.clone())
    }

    /// Guarded read access to the derived lowering artifact, serialized per
    /// the whole cache (a single mutex, held only for the closure's
    /// duration — short enough that this never becomes a bottleneck given
    /// one call per key in the pipeline).
    pub fn with_lowering_plan<R>(&self, key: &PlanKey, f: impl FnOnce(&LoweringPlan) -> R) -> Option<R> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|e| e.lowering_plan.as_ref()).map(f)
    }

    pub fn with_write_back_plan<R>(&self, key: &PlanKey, f: impl FnOnce(&WriteBackPlan) -> R) -> Option<R> {
        let entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|e| e.write_back_plan.as_ref()).map(f)
    }

    pub fn with_lowering_plan_mut<R>(&self, key: &PlanKey, f: impl FnOnce(&mut LoweringPlan) -> R) -> Option<R> {
        let mut entries = self.entries.lock().unwrap();
        entries.get_mut(key).and_then(|e| e.lowering_plan.as_mut()).map(f)
    }

    pub fn with_write_back_plan_mut<R>(&self, key: &PlanKey, f: impl FnOnce(&mut WriteBackPlan) -> R) -> Option<R> {
        let mut entries = self.entries.lock().unwrap();
        entries.get_mut(key).and_then(|e| e.write_back_plan.as_mut()).map(f)
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
