use std::collections::{BTreeSet, HashMap};

use super::graph::Graph;
use super::symbol::SymbolId;

/// An insertion-ordered `name -> Graph` mapping. A plain `HashMap` would
/// lose the order top modules were discovered in, which downstream
/// back ends (and test assertions over "first graph wins" semantics) rely
/// on; a `Vec` plus a name index keeps insertion order without pulling in
/// an ordered-map dependency for one call site.
#[derive(Debug, Default)]
pub struct Netlist {
    names: Vec<String>,
    index: HashMap<String, usize>,
    graphs: Vec<Graph>,
    pub declared_symbols: BTreeSet<SymbolId>,
    pub top_names: Vec<String>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a fully wired graph. Invariant 7 (atomic publication) is
    /// upheld by construction: a `Graph` is built to completion before this
    /// is ever called, so there is no observable partially-wired state.
    pub fn publish(&mut self, graph: Graph) {
        let name = graph.name().to_string();
        if let Some(&idx) = self.index.get(&name) {
            self.graphs[idx] = graph;
            return;
        }
        let idx = self.graphs.len();
        self.index.insert(name.clone(), idx);
        self.names.push(name);
        self.graphs.push(graph);
    }

    pub fn get(&self, name: &str) -> Option<&Graph> {
        self.index.get(name).map(|&idx| &self.graphs[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.iter()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Invariant 5: every key equals the `name()` of the graph it maps to.
    pub fn check_key_invariant(&self) -> Result<(), String> {
        for (name, &idx) in &self.index {
            if self.graphs[idx].name() != name {
                return Err(format!("netlist key {name} does not match graph name {}", self.graphs[idx].name()));
            }
        }
        Ok(())
    }
}
