//! # Safeguard: one probe under supervision.
//!
//! A [`Safeguard`] executes one planned probe with the discipline of its class
//! and checks every run against the probe tolerance.
//!
//! ## Task bodies
//! ```text
//! Blocking:        execute ─► barrier.wait() (always, even on fault/panic) ─► check
//! BackgroundOnce:  execute ─► check
//! Repeating:       while !stop {
//!                      execute
//!                      wait(frequency) or stop   ◄── terminate wakes this at once
//!                      check
//!                  }
//! ```
//!
//! ## Tolerance check
//! ```text
//! finished latch set?  ─► yes: nothing to do, the experiment is over
//!        │ no
//! within tolerance?    ─► yes: done
//!        │ no
//! publish ToleranceBreached
//! still not finished and interruption latch CAS won?
//!        │ yes
//! still not finished?
//!        └─► record cause, publish ExperimentInterrupted, interrupt(), at most once per run
//! ```
//!
//! ## Rules
//! - Runs of one safeguard are strictly sequential.
//! - A fault ends the safeguard (the pool reports it); a failed run does not.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityRunner, ExecutionContext, Interrupt, ToleranceEvaluator};
use crate::core::executor::execute_probe;
use crate::core::latch::{FinishedLatch, InterruptionLatch};
use crate::error::{ActivityError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::probes::{PlannedProbe, ProbeClass, Run};

/// Everything a safeguard task shares with its siblings for one run.
pub(crate) struct SafeguardEnv {
    pub runner: Arc<dyn ActivityRunner>,
    pub evaluator: Arc<dyn ToleranceEvaluator>,
    pub interrupt: Arc<dyn Interrupt>,
    pub latch: Arc<InterruptionLatch>,
    pub finished: FinishedLatch,
    pub stop: CancellationToken,
    pub bus: Bus,
    pub experiment: Arc<Value>,
    pub ctx: ExecutionContext,
    pub honor_pauses: bool,
}

/// A planned probe bound to its run environment.
pub(crate) struct Safeguard {
    probe: PlannedProbe,
    env: Arc<SafeguardEnv>,
}

impl Safeguard {
    pub fn new(probe: PlannedProbe, env: Arc<SafeguardEnv>) -> Self {
        Self { probe, env }
    }

    pub fn name(&self) -> Arc<str> {
        Arc::clone(&self.probe.name)
    }

    pub fn class(&self) -> ProbeClass {
        self.probe.class
    }

    /// Runs once; always arrives at `barrier` before checking the tolerance.
    pub async fn run_blocking(self, barrier: Arc<Barrier>) -> Result<(), ActivityError> {
        let executed = AssertUnwindSafe(self.execute(1)).catch_unwind().await;
        barrier.wait().await;

        let run = match executed {
            Ok(res) => res?,
            Err(panic) => {
                return Err(ActivityError::fault(format!(
                    "probe panicked: {}",
                    panic_message(panic.as_ref())
                )));
            }
        };
        self.check(&run, 1).await;
        Ok(())
    }

    /// Runs once, detached from the experiment start.
    pub async fn run_once(self) -> Result<(), ActivityError> {
        let run = self.execute(1).await?;
        self.check(&run, 1).await;
        Ok(())
    }

    /// Runs every `interval` until the stop token is cancelled.
    pub async fn run_repeatedly(self) -> Result<(), ActivityError> {
        let Some(interval) = self.probe.interval else {
            return Err(ActivityError::fault("repeating safeguard without frequency"));
        };
        let stop = self.env.stop.clone();
        let mut tick: u32 = 0;

        while !stop.is_cancelled() {
            tick = tick.saturating_add(1);
            let run = self.execute(tick).await?;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = stop.cancelled() => {}
            }
            self.check(&run, tick).await;
        }
        Ok(())
    }

    /// Executes the probe once, publishing `SafeguardStarting` and `SafeguardRan`.
    async fn execute(&self, tick: u32) -> Result<Run, ActivityError> {
        let env = &self.env;
        env.bus.publish(
            Event::new(EventKind::SafeguardStarting)
                .with_probe(self.name())
                .with_class(self.probe.class)
                .with_tick(tick),
        );

        let pauses = env.honor_pauses.then_some(&env.stop);
        let run = execute_probe(
            env.runner.as_ref(),
            &env.experiment,
            &self.probe.activity,
            &env.ctx,
            pauses,
        )
        .await?;

        let mut ev = Event::new(EventKind::SafeguardRan)
            .with_probe(self.name())
            .with_class(self.probe.class)
            .with_tick(tick)
            .with_status(run.status)
            .with_duration(run.duration);
        if let Some(exception) = run.exception.as_deref() {
            ev = ev.with_reason(exception);
        }
        env.bus.publish(ev);
        Ok(run)
    }

    /// Checks `run` against the tolerance and interrupts the experiment on the first breach.
    async fn check(&self, run: &Run, tick: u32) {
        let env = &self.env;
        if env.finished.is_set() {
            return;
        }

        let within = env
            .evaluator
            .within_tolerance(&self.probe.tolerance, run.output_value(), &env.ctx)
            .await;
        if within {
            return;
        }

        env.bus.publish(
            Event::new(EventKind::ToleranceBreached)
                .with_probe(self.name())
                .with_class(self.probe.class)
                .with_tick(tick),
        );

        if env.finished.is_set() || !env.latch.try_fire() {
            return;
        }
        // Finished between the check and the swap: the latch stays set, nothing is stopped.
        if env.finished.is_set() {
            return;
        }

        env.latch.record_cause(&self.probe.name);
        env.bus.publish(
            Event::new(EventKind::ExperimentInterrupted)
                .with_probe(self.name())
                .with_class(self.probe.class),
        );
        env.interrupt.interrupt();
    }
}
