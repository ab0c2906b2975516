//! Test-only utilities for working with the Register-Hardware Graph.
//!
//! There is no in-tree front end, so [`builders`] constructs an
//! [`crate::ast::ElaboratedRoot`]/[`crate::ast::ElaboratedBody`] tree directly,
//! and [`fixtures`] wraps a handful of representative modules built from it.
//! [`assertions`] checks the [`crate::rhg::Graph`]/[`crate::rhg::Netlist`]
//! that come out the other end of [`crate::driver::ConvertDriver::convert`].
//!
//! ```
//! use rhg_ingest::testing::*;
//! use rhg_ingest::driver::ConvertDriver;
//! use rhg_ingest::ast::ElaboratedRoot;
//!
//! let root = ElaboratedRoot {
//!     top_instances: vec![InstanceBuilder::new("top", fresh_definition_id(), counter_module()).build_arc()],
//! };
//! let netlist = ConvertDriver::default().convert(&root).unwrap();
//! let graph = assert_has_graph(&netlist, "counter");
//! assert_graph_invariants_hold(graph);
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
