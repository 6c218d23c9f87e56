//! # Collaborators of the guardian.
//!
//! The guardian does not execute providers nor interpret tolerances itself;
//! it drives these seams:
//! - [`ActivityRunner`] executes a probe declaration ([`RunnerFn`] wraps a closure)
//! - [`ToleranceEvaluator`] checks a run output ([`StaticTolerance`] covers plain values)
//! - [`ActivityLookup`] resolves `ref` probes ([`ActivityCatalog`], [`NoLookup`])
//! - [`Interrupt`] the stop side effect ([`ExperimentInterrupt`])
//!
//! All of them share the read-only [`ExecutionContext`].

mod catalog;
mod context;
mod interrupt;
mod runner;
mod tolerance;

pub use catalog::{ActivityCatalog, ActivityLookup, NoLookup};
pub use context::ExecutionContext;
pub use interrupt::{ExperimentInterrupt, Interrupt};
pub use runner::{ActivityRunner, RunnerFn};
pub use tolerance::{StaticTolerance, ToleranceEvaluator};
