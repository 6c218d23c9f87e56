//! # Probe declarations, classification and run records.
//!
//! This module provides the safeguard data model:
//! - [`Probe`] - a declared health-check probe (as written in the control arguments)
//! - [`ProbeClass`] - the scheduling discipline derived from a declaration
//! - [`ProbePlan`] - a validated, classified probe list with [`ClassCounts`]
//! - [`Run`] - the record of one probe execution

mod plan;
mod probe;
mod run;

pub use plan::{ClassCounts, PlannedProbe, ProbePlan};
pub use probe::{Pauses, Probe, ProbeClass};
pub use run::{Run, RunStatus};
