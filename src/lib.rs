//! # chaos-safeguards
//!
//! **chaos-safeguards** supervises the health-check probes that guard a chaos
//! engineering experiment, and interrupts the experiment as soon as one of
//! them reports an unhealthy system.
//!
//! Probes are split into three classes, each run in its own pool:
//! - **Blocking** (no hint): run once before the experiment starts; `run` waits for them;
//! - **BackgroundOnce** (`background: true`): run once, alongside the experiment;
//! - **Repeating** (`frequency: secs`): run every `frequency` seconds until terminate.
//!
//! `frequency` takes precedence over `background` when both are set.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Probe     │   │    Probe     │   │    Probe     │
//!     │  (blocking)  │   │ (background) │   │ (frequency)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Guardian                                                         │
//! │  - ProbePlan (validation + classification)                        │
//! │  - Pools: blocking | background_once | repeating                  │
//! │  - Barrier (blocking + 1), stop token                             │
//! │  - InterruptionLatch (CAS, exactly one winner)                    │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  Safeguard   │   │  Safeguard   │   │  Safeguard   │   │
//!     │ run_blocking │   │   run_once   │   │run_repeatedly│   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ ActivityRunner   │                  │                 │
//!      │ ToleranceEval.   │                  │                 │
//!      │ Interrupt (once) │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: GuardianConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                       ┌───────────┼───────────┐
//!                       ▼           ▼           ▼
//!                   LogWriter  AliveTracker  custom..
//! ```
//! ### Tolerance check (after every run)
//! ```text
//! finished latch set? ──► yes: skip
//! within tolerance?   ──► yes: done
//! publish ToleranceBreached
//! finished latch unset && InterruptionLatch::try_fire won && still unset?
//!     └─► record cause, publish ExperimentInterrupted, Interrupt::interrupt()
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                               |
//! |-------------------|-----------------------------------------------------------------|--------------------------------------------------|
//! | **Supervision**   | Prepare, run and terminate the safeguards of one experiment.   | [`Guardian`], [`GuardianBuilder`]                |
//! | **Probes**        | Declarations, classification, run records.                      | [`Probe`], [`ProbeClass`], [`ProbePlan`], [`Run`]|
//! | **Collaborators** | Execute probes, evaluate tolerances, resolve refs, interrupt.  | [`ActivityRunner`], [`ToleranceEvaluator`], [`ActivityLookup`], [`Interrupt`] |
//! | **Controls**      | Lifecycle hooks: safeguards, synchronization, bypass, repeat.  | [`Control`], [`SafeguardControl`]                |
//! | **Subscriber API**| Observe guardian events.                                        | [`Subscribe`], [`LogWriter`], [`AliveTracker`]   |
//! | **Errors**        | Typed errors for lifecycle misuse, validation and execution.    | [`GuardError`], [`ValidationError`], [`ActivityError`] |
//! | **Configuration** | Centralize guardian settings.                                   | [`GuardianConfig`]                               |
//!
//! ## Optional features
//! - `logging` (default): exports [`init_tracing`], a `tracing-subscriber` fmt setup.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use chaos_safeguards::{
//!     ActivityError, ExecutionContext, ExperimentInterrupt, Guardian, GuardianConfig,
//!     GuardianOutcome, Probe, RunnerFn,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = RunnerFn::arc(|_probe: Probe| async move { Ok::<_, ActivityError>(json!(200)) });
//!     let stop = ExperimentInterrupt::new();
//!
//!     let guardian = Guardian::builder(GuardianConfig::default(), runner)
//!         .with_interrupt(Arc::new(stop.clone()))
//!         .build();
//!
//!     let probes: Vec<Probe> = serde_json::from_value(json!([
//!         {"name": "service-up", "type": "probe", "tolerance": 200},
//!     ]))?;
//!
//!     guardian.prepare(&probes).await?;
//!     guardian.run(&json!({"title": "demo"}), &probes, &ExecutionContext::default()).await?;
//!     // ... the experiment runs here, racing `stop.interrupted()` ...
//!     let outcome = guardian.terminate().await;
//!
//!     assert_eq!(outcome, GuardianOutcome::Completed);
//!     assert!(!stop.is_interrupted());
//!     Ok(())
//! }
//! ```

mod activity;
mod controls;
mod core;
mod error;
mod events;
mod idle;
mod probes;
mod subscribers;

// ---- Public re-exports ----

pub use activity::{
    ActivityCatalog, ActivityLookup, ActivityRunner, ExecutionContext, ExperimentInterrupt,
    Interrupt, NoLookup, RunnerFn, StaticTolerance, ToleranceEvaluator,
};
pub use controls::{BypassControl, Control, RepeatControl, SafeguardControl, SynchronizationControl};
pub use core::{
    FinishedLatch, Guardian, GuardianBuilder, GuardianConfig, GuardianOutcome, GuardianState,
    InterruptionLatch,
};
pub use error::{ActivityError, GuardError, ValidationError};
pub use events::{Bus, Event, EventKind};
pub use idle::idle_for;
pub use probes::{ClassCounts, Pauses, PlannedProbe, Probe, ProbeClass, ProbePlan, Run, RunStatus};
pub use subscribers::{AliveTracker, LogWriter, Subscribe, SubscriberSet};

// Optional: a default tracing subscriber for hosts without one.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod logging;
#[cfg(feature = "logging")]
pub use logging::init_tracing;
