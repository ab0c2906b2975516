//! Lowers an elaborated SystemVerilog design into the Register-Hardware
//! Graph (RHG): a flat, per-module IR of typed values and operations meant
//! for downstream synthesis/verification back ends to consume without
//! re-deriving anything the front end already resolved (symbol bindings,
//! parameter values, bit widths).
//!
//! The front end (parse, elaborate, fold constants) is an external
//! collaborator; this crate starts from its output, [`ast::ElaboratedRoot`].
//! [`testing`] provides a builder for constructing that tree directly in
//! tests, standing in for a real parser.
//!
//! ## Pipeline
//!
//! One [`driver::ConvertDriver::convert`] call walks the elaborated
//! instance hierarchy through four stages per module, fanning the work out
//! over a worker pool that discovers and schedules child instances as it
//! goes (see `driver` for the scheduling scheme):
//!
//! 1. [`planner::plan_module`] — intern symbols, record ports/signals/child
//!    instances into a [`plan::ModulePlan`].
//! 2. [`lowerer::lower_module`] — expression trees and statement-level
//!    write intents, as a [`plan::LoweringPlan`].
//! 3. [`write_back::resolve_write_back`] — collapses per-statement write
//!    intents targeting the same storage into one next-value expression
//!    per clock/control domain.
//! 4. [`assembler::assemble_graph`] — materializes all three into a
//!    concrete [`rhg::Graph`], wiring in already-assembled child instances
//!    by name via the shared [`registry::InstanceRegistry`].
//!
//! The finished [`rhg::Netlist`] holds one [`rhg::Graph`] per distinct
//! (definition, parameterization) pair actually instantiated, keyed by
//! [`plan::PlanKey`].

pub mod ast;
pub mod assembler;
pub mod cache;
pub mod diagnostics;
pub mod driver;
pub mod logging;
pub mod lowerer;
pub mod plan;
pub mod planner;
pub mod queue;
pub mod registry;
pub mod rhg;
pub mod testing;
pub mod write_back;

#[cfg(feature = "metrics")]
pub mod metrics;

pub use ast::{ElaboratedBody, ElaboratedInstance, ElaboratedRoot};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use driver::{ConvertAborted, ConvertDriver, ConvertOptions};
pub use logging::{LogEvent, LogLevel, Logger};
pub use plan::PlanKey;
pub use rhg::{Graph, Netlist};
