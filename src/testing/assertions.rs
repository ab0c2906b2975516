//! Structural assertions over the Register-Hardware Graph, for comparing a
//! built [`crate::rhg::Graph`]/[`crate::rhg::Netlist`] against what a test
//! expects without hand-rolling the traversal each time.

use crate::rhg::{Graph, Netlist, OperationKind};

/// Asserts `netlist` contains exactly one graph named `name` and returns it.
///
/// # Panics
///
/// Panics if no graph with that name was published.
pub fn assert_has_graph<'a>(netlist: &'a Netlist, name: &str) -> &'a Graph {
    netlist.get(name).unwrap_or_else(|| {
        let names: Vec<&str> = netlist.names().collect();
        panic!("expected netlist to contain graph '{name}', published graphs: {names:?}")
    })
}

/// Asserts `graph` contains at least one operation of the given kind and
/// returns the first match.
///
/// # Panics
///
/// Panics if no operation of that kind exists.
pub fn assert_has_operation(graph: &Graph, kind: OperationKind) -> crate::rhg::OperationId {
    graph
        .operations()
        .iter()
        .find(|op| op.kind == kind)
        .map(crate::rhg::Operation::id)
        .unwrap_or_else(|| panic!("expected graph '{}' to contain a {kind:?} operation", graph.name()))
}

/// Counts operations of a given kind in `graph`.
#[must_use]
pub fn count_operations(graph: &Graph, kind: OperationKind) -> usize {
    graph.operations().iter().filter(|op| op.kind == kind).count()
}

/// Asserts `graph` declares exactly `expected` input ports.
///
/// # Panics
///
/// Panics on mismatch.
pub fn assert_input_port_count(graph: &Graph, expected: usize) {
    assert_eq!(
        graph.inputs.len(),
        expected,
        "graph '{}' input port count mismatch: expected {expected}, got {} ({:?})",
        graph.name(),
        graph.inputs.len(),
        graph.inputs.iter().map(|p| p.name).collect::<Vec<_>>()
    );
}

/// Asserts `graph` declares exactly `expected` output ports.
///
/// # Panics
///
/// Panics on mismatch.
pub fn assert_output_port_count(graph: &Graph, expected: usize) {
    assert_eq!(
        graph.outputs.len(),
        expected,
        "graph '{}' output port count mismatch: expected {expected}, got {}",
        graph.name(),
        graph.outputs.len()
    );
}

/// Asserts [`Graph::check_invariants`] passes, printing the failure reason
/// (rather than the generic `assert!` message) if it doesn't.
///
/// # Panics
///
/// Panics if an invariant is violated.
pub fn assert_graph_invariants_hold(graph: &Graph) {
    if let Err(reason) = graph.check_invariants() {
        panic!("graph '{}' violates an invariant: {reason}", graph.name());
    }
}

/// Asserts [`Netlist::check_key_invariant`] passes.
///
/// # Panics
///
/// Panics if the invariant is violated.
pub fn assert_netlist_key_invariant_holds(netlist: &Netlist) {
    if let Err(reason) = netlist.check_key_invariant() {
        panic!("netlist violates its key invariant: {reason}");
    }
}

/// Asserts that `graph`'s attribute named `attr` on its first operation of
/// kind `kind` matches `expected` once both are rendered via `Debug`. Loose
/// on purpose: [`crate::rhg::AttrValue`] doesn't implement `PartialEq`
/// against bare Rust types, so comparing formatted output is the ergonomic
/// escape hatch for tests.
///
/// # Panics
///
/// Panics if no such operation/attribute exists, or the value doesn't match.
pub fn assert_operation_attr_debug(graph: &Graph, kind: OperationKind, attr: &str, expected: &str) {
    let op = graph
        .operations()
        .iter()
        .find(|op| op.kind == kind)
        .unwrap_or_else(|| panic!("graph '{}' has no {kind:?} operation", graph.name()));
    let value = op
        .attrs
        .get(attr)
        .unwrap_or_else(|| panic!("{kind:?} operation in '{}' has no '{attr}' attribute", graph.name()));
    let rendered = format!("{value:?}");
    assert_eq!(
        rendered,
        expected,
        "{kind:?} operation in '{}' attribute '{attr}' mismatch",
        graph.name()
    );
}
