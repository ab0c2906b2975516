//! `InstanceRegistry`: the single source of truth for "what graph name did
//! this `PlanKey` get published under". The Graph Assembler consults it
//! twice per module — once to claim its own name, once per child instance
//! to find the name a sibling worker already claimed (or is about to).
//!
//! Naming is deterministic whenever possible (module name, optionally
//! suffixed with the canonical parameter signature) so two workers racing
//! to assemble the same `PlanKey` agree without needing to talk to each
//! other first. Only a genuine collision — two distinct `PlanKey`s that
//! happen to want the identical text — falls back to a monotonic counter,
//! and even then the first claimant keeps the bare name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::plan::PlanKey;

#[derive(Default)]
pub struct InstanceRegistry {
    names: Mutex<HashMap<PlanKey, String>>,
    claimed: Mutex<HashMap<String, PlanKey>>,
    anon_counter: AtomicU64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name this key is (or will be) published under, assigning
    /// one on first call. Safe to call concurrently from multiple workers —
    /// only the first caller for a given key pays the allocation.
    pub fn assign_name(&self, key: &PlanKey, base_name: &str) -> String {
        if let Some(existing) = self.names.lock().unwrap().get(key) {
            return existing.clone();
        }
        let mut names = self.names.lock().unwrap();
        if let Some(existing) = names.get(key) {
            return existing.clone();
        }
        let mut claimed = self.claimed.lock().unwrap();
        let final_name = match claimed.get(base_name) {
            None => base_name.to_string(),
            Some(owner) if owner == key => base_name.to_string(),
            Some(_) => loop {
                let suffix = self.anon_counter.fetch_add(1, Ordering::SeqCst);
                let candidate = format!("{base_name}$anon{suffix}");
                if !claimed.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        claimed.insert(final_name.clone(), key.clone());
        names.insert(key.clone(), final_name.clone());
        final_name
    }

    /// Looks up an already-assigned name without assigning one; used when a
    /// worker must know whether a sibling has claimed a name yet before it
    /// re-enqueues and waits.
    pub fn lookup(&self, key: &PlanKey) -> Option<String> {
        self.names.lock().unwrap().get(key).cloned()
    }
}
