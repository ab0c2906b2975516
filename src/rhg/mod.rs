//! The Register-Hardware Graph: the data model that the ingest pipeline
//! (see [`crate::driver`]) builds and that downstream passes/back ends
//! consume. See `SPEC_FULL.md` section 3 for the full invariant list; each
//! is additionally checked by [`Graph::check_invariants`] and
//! [`Netlist::check_key_invariant`].

mod attr;
mod graph;
mod ids;
mod netlist;
mod operation;
mod port;
mod symbol;
mod value;

pub use attr::{AttrMap, AttrValue};
pub use graph::Graph;
pub use ids::{OperationId, ValueId};
pub use netlist::Netlist;
pub use operation::{Operation, OperationKind};
pub use port::{InoutPort, Port, PortDirection};
pub use symbol::{SymbolId, SymbolTable};
pub use value::{Use, Value, ValueType};
