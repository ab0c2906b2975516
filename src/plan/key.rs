//! Plan-local symbol interning and cache keying. Distinct from
//! [`crate::rhg::SymbolTable`]: a `PlanSymbolTable` is scratch space that
//! lives only for the duration of planning one module and is discarded once
//! the graph assembler has consumed its plan.

use std::collections::HashMap;

use crate::ast::DefinitionId;

pub const INVALID_PLAN_INDEX: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlanSymbolId(u32);

impl PlanSymbolId {
    pub fn invalid() -> Self {
        Self(INVALID_PLAN_INDEX)
    }

    pub fn valid(&self) -> bool {
        self.0 != INVALID_PLAN_INDEX
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlanSymbolTable {
    storage: Vec<String>,
    index: HashMap<String, PlanSymbolId>,
}

impl PlanSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, text: &str) -> PlanSymbolId {
        if let Some(&id) = self.index.get(text) {
            return id;
        }
        let id = PlanSymbolId(self.storage.len() as u32);
        self.storage.push(text.to_string());
        self.index.insert(text.to_string(), id);
        id
    }

    pub fn lookup(&self, text: &str) -> PlanSymbolId {
        self.index.get(text).copied().unwrap_or_else(PlanSymbolId::invalid)
    }

    pub fn text(&self, id: PlanSymbolId) -> &str {
        &self.storage[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }
}

/// Identifies one (definition, parameterization) pair to dedup against in
/// the [`crate::cache::PlanCache`]. `paramSignature` is the canonical
/// serialization of all evaluated parameter bindings, sorted by
/// declaration order, e.g. `"WIDTH=8,DEPTH=16"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub definition: DefinitionId,
    pub param_signature: String,
}

impl PlanKey {
    pub fn new(definition: DefinitionId, param_signature: impl Into<String>) -> Self {
        Self {
            definition,
            param_signature: param_signature.into(),
        }
    }
}

/// Builds the canonical signature text from already-evaluated bindings, in
/// the order the front end declared the parameters.
pub fn canonical_param_signature(bindings: &[(String, String)]) -> String {
    bindings
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
