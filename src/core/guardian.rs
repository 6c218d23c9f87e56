//! # Guardian: supervises the safeguards of one experiment run.
//!
//! The [`Guardian`] owns the event bus, the subscriber fan-out and the
//! resources of the current run (pools, barrier, stop token). Its lifecycle is
//! driven by the host through three calls:
//!
//! ```text
//!            prepare(probes)              run(experiment, probes, ctx)          terminate()
//! Idle ───────────────────────► Prepared ─────────────────────────────► Running ────────────► Terminated
//!   ▲                             │  ▲                                                          │
//!   │                             │  └──────────────── prepare (fresh resources) ───────────────┘
//!   └── terminate (no-op) ◄───────┘ terminate (resources released)
//! ```
//!
//! ## Run
//! ```text
//! ProbePlan::build(probes)                  (validation, counts must match prepare)
//!   for each planned probe:
//!     Blocking       ─► pools.blocking.submit(run_blocking(barrier))
//!     BackgroundOnce ─► pools.background_once.submit(run_once())
//!     Repeating      ─► pools.repeating.submit(run_repeatedly())
//!   barrier.wait()   ◄── returns once every blocking safeguard has arrived
//! ```
//!
//! ## Terminate
//! ```text
//! stop.cancel()                   → wakes every repeating safeguard and every pause
//! publish(TerminateRequested)
//! drain all pools                 → waits for in-flight probes, however long they take
//!   └─ after cfg.drain_warning    → publish(DrainSlow { still running }) and keep waiting
//! publish(AllSafeguardsStopped)
//! ```
//!
//! A probe has no supervisor-imposed timeout: a probe that never returns keeps
//! `terminate` waiting. `DrainSlow` names it so the host can see why.
//!
//! ## Event flow
//! ```text
//! Safeguard ── publish ──► Bus ──► listener ──► SubscriberSet::emit ──► [LogWriter] [AliveTracker] [custom..]
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Barrier, Mutex, broadcast};
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityLookup, ActivityRunner, ExecutionContext, Interrupt, ToleranceEvaluator};
use crate::core::builder::GuardianBuilder;
use crate::core::config::GuardianConfig;
use crate::core::latch::{FinishedLatch, InterruptionLatch};
use crate::core::pool::Pools;
use crate::core::safeguard::{Safeguard, SafeguardEnv};
use crate::error::GuardError;
use crate::events::{Bus, Event, EventKind};
use crate::probes::{ClassCounts, Probe, ProbeClass, ProbePlan};
use crate::subscribers::{AliveTracker, SubscriberSet};

/// Lifecycle state of a [`Guardian`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardianState {
    Idle,
    Prepared,
    Running,
    Terminated,
}

impl GuardianState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardianState::Idle => "idle",
            GuardianState::Prepared => "prepared",
            GuardianState::Running => "running",
            GuardianState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for GuardianState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the supervised run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardianOutcome {
    /// No safeguard interrupted the experiment.
    Completed,
    /// The named safeguard breached its tolerance and interrupted the experiment.
    Interrupted { probe: Arc<str> },
}

impl GuardianOutcome {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, GuardianOutcome::Interrupted { .. })
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            GuardianOutcome::Completed => "completed",
            GuardianOutcome::Interrupted { .. } => "interrupted",
        }
    }
}

struct Prepared {
    counts: ClassCounts,
    pools: Pools,
    barrier: Arc<Barrier>,
    stop: CancellationToken,
}

enum Stage {
    Idle,
    Prepared(Prepared),
    Running { pools: Pools, stop: CancellationToken },
    Terminated,
}

impl Stage {
    fn state(&self) -> GuardianState {
        match self {
            Stage::Idle => GuardianState::Idle,
            Stage::Prepared(_) => GuardianState::Prepared,
            Stage::Running { .. } => GuardianState::Running,
            Stage::Terminated => GuardianState::Terminated,
        }
    }
}

/// Supervisor of the safeguards of one experiment.
pub struct Guardian {
    cfg: GuardianConfig,
    bus: Bus,
    alive: Arc<AliveTracker>,

    runner: Arc<dyn ActivityRunner>,
    evaluator: Arc<dyn ToleranceEvaluator>,
    lookup: Arc<dyn ActivityLookup>,
    interrupt: Arc<dyn Interrupt>,

    latch: Arc<InterruptionLatch>,
    finished: FinishedLatch,
    stage: Mutex<Stage>,
    listener: CancellationToken,
}

/// Collaborators handed over by [`GuardianBuilder`].
pub(crate) struct GuardianParts {
    pub cfg: GuardianConfig,
    pub bus: Bus,
    pub alive: Arc<AliveTracker>,
    pub subs: SubscriberSet,
    pub runner: Arc<dyn ActivityRunner>,
    pub evaluator: Arc<dyn ToleranceEvaluator>,
    pub lookup: Arc<dyn ActivityLookup>,
    pub interrupt: Arc<dyn Interrupt>,
    pub finished: FinishedLatch,
}

impl Guardian {
    /// Starts building a guardian around `runner`.
    pub fn builder(cfg: GuardianConfig, runner: Arc<dyn ActivityRunner>) -> GuardianBuilder {
        GuardianBuilder::new(cfg, runner)
    }

    pub(crate) fn new_internal(parts: GuardianParts) -> Self {
        let listener = CancellationToken::new();
        Self::subscriber_listener(&parts.bus, parts.subs, listener.clone());

        Self {
            cfg: parts.cfg,
            bus: parts.bus,
            alive: parts.alive,
            runner: parts.runner,
            evaluator: parts.evaluator,
            lookup: parts.lookup,
            interrupt: parts.interrupt,
            latch: Arc::new(InterruptionLatch::new()),
            finished: parts.finished,
            stage: Mutex::new(Stage::Idle),
            listener,
        }
    }

    /// Validates `probes` and allocates fresh pools, barrier and stop token.
    ///
    /// Replaces the resources of a previous `prepare` or terminated run and
    /// clears the interruption and finished latches. The alive tracker forgets
    /// the previous run once it sees `GuardianPrepared`, after every earlier event.
    ///
    /// ### Errors
    /// - [`GuardError::Validation`] a declaration is malformed; nothing is allocated
    /// - [`GuardError::StillRunning`] the previous run was not terminated
    pub async fn prepare(&self, probes: &[Probe]) -> Result<ClassCounts, GuardError> {
        let plan = ProbePlan::build(probes, self.lookup.as_ref())?;
        let counts = plan.counts();

        let mut stage = self.stage.lock().await;
        if matches!(*stage, Stage::Running { .. }) {
            return Err(GuardError::StillRunning);
        }

        self.latch.reset();
        self.finished.reset();
        *stage = Stage::Prepared(Prepared {
            counts,
            pools: Pools::new(&counts),
            barrier: Arc::new(Barrier::new(counts.barrier_parties())),
            stop: CancellationToken::new(),
        });
        self.bus
            .publish(Event::new(EventKind::GuardianPrepared).with_reason(counts.to_string()));
        Ok(counts)
    }

    /// Starts one safeguard per probe and waits for the blocking ones.
    ///
    /// Returns once every blocking safeguard has produced its run (or failed
    /// trying). Background and repeating safeguards keep going until
    /// [`terminate`](Self::terminate).
    ///
    /// ### Errors
    /// - [`GuardError::NotPrepared`] no `prepare` since construction or the last terminate
    /// - [`GuardError::AlreadyRunning`] `run` was already called for this `prepare`
    /// - [`GuardError::PlanMismatch`] the probes classify differently than the prepared ones
    /// - [`GuardError::Validation`] a declaration is malformed
    pub async fn run(
        &self,
        experiment: &Value,
        probes: &[Probe],
        ctx: &ExecutionContext,
    ) -> Result<(), GuardError> {
        let barrier = {
            let mut stage = self.stage.lock().await;
            let prepared = match std::mem::replace(&mut *stage, Stage::Idle) {
                Stage::Prepared(prepared) => prepared,
                other => {
                    let err = match other {
                        Stage::Running { .. } => GuardError::AlreadyRunning,
                        _ => GuardError::NotPrepared,
                    };
                    *stage = other;
                    return Err(err);
                }
            };

            let plan = match ProbePlan::build(probes, self.lookup.as_ref()) {
                Ok(plan) if plan.counts() == prepared.counts => plan,
                Ok(plan) => {
                    let err = GuardError::PlanMismatch {
                        prepared: prepared.counts.to_string(),
                        got: plan.counts().to_string(),
                    };
                    *stage = Stage::Prepared(prepared);
                    return Err(err);
                }
                Err(e) => {
                    *stage = Stage::Prepared(prepared);
                    return Err(e.into());
                }
            };

            let Prepared {
                mut pools,
                barrier,
                stop,
                ..
            } = prepared;

            let env = Arc::new(SafeguardEnv {
                runner: Arc::clone(&self.runner),
                evaluator: Arc::clone(&self.evaluator),
                interrupt: Arc::clone(&self.interrupt),
                latch: Arc::clone(&self.latch),
                finished: self.finished.clone(),
                stop: stop.clone(),
                bus: self.bus.clone(),
                experiment: Arc::new(experiment.clone()),
                ctx: ctx.clone(),
                honor_pauses: self.cfg.honor_pauses,
            });
            for probe in plan {
                self.submit(&mut pools, Safeguard::new(probe, Arc::clone(&env)), &barrier);
            }

            *stage = Stage::Running { pools, stop };
            barrier
        };

        barrier.wait().await;
        Ok(())
    }

    /// Stops every safeguard and waits until none is left.
    ///
    /// Idempotent: a no-op before `prepare` and after a previous terminate.
    pub async fn terminate(&self) -> GuardianOutcome {
        let mut stage = self.stage.lock().await;
        match std::mem::replace(&mut *stage, Stage::Terminated) {
            Stage::Running { mut pools, stop } => {
                stop.cancel();
                self.bus.publish(Event::new(EventKind::TerminateRequested));
                tracing::debug!(target: "chaos_safeguards", pending = pools.pending(), "draining safeguard pools");
                self.drain(&mut pools).await;
                self.bus.publish(Event::new(EventKind::AllSafeguardsStopped));
            }
            Stage::Prepared(prepared) => {
                prepared.stop.cancel();
                self.bus.publish(Event::new(EventKind::TerminateRequested));
                self.bus.publish(Event::new(EventKind::AllSafeguardsStopped));
            }
            Stage::Idle => *stage = Stage::Idle,
            Stage::Terminated => {}
        }
        self.outcome()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> GuardianState {
        self.stage.lock().await.state()
    }

    /// Outcome so far: interrupted as soon as a safeguard fired the latch.
    pub fn outcome(&self) -> GuardianOutcome {
        match self.latch.cause() {
            Some(probe) => GuardianOutcome::Interrupted { probe },
            None => GuardianOutcome::Completed,
        }
    }

    /// Name of the safeguard that interrupted the current run, if any.
    pub fn interrupted_by(&self) -> Option<Arc<str>> {
        self.latch.cause()
    }

    /// Handle on the finished latch shared with the host.
    pub fn finished(&self) -> FinishedLatch {
        self.finished.clone()
    }

    /// Names of the safeguards currently executing, as seen by the alive tracker.
    pub async fn running_safeguards(&self) -> Vec<String> {
        self.alive.snapshot().await
    }

    /// Subscribes to the raw event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.cfg
    }

    fn submit(&self, pools: &mut Pools, safeguard: Safeguard, barrier: &Arc<Barrier>) {
        let name = safeguard.name();
        let class = safeguard.class();
        let bus = self.bus.clone();
        let pool = pools.for_class(class);

        match class {
            ProbeClass::Blocking => pool.submit(name, bus, safeguard.run_blocking(Arc::clone(barrier))),
            ProbeClass::BackgroundOnce => pool.submit(name, bus, safeguard.run_once()),
            ProbeClass::Repeating => pool.submit(name, bus, safeguard.run_repeatedly()),
        }
    }

    /// Drains the pools, reporting once if it takes longer than `drain_warning`.
    async fn drain(&self, pools: &mut Pools) {
        let Some(warn_after) = self.cfg.drain_warning() else {
            pools.drain().await;
            return;
        };

        let drain = pools.drain();
        tokio::pin!(drain);
        tokio::select! {
            _ = &mut drain => return,
            _ = tokio::time::sleep(warn_after) => {}
        }

        let stuck = self.alive.snapshot().await;
        self.bus
            .publish(Event::new(EventKind::DrainSlow).with_reason(stuck.join(", ")));
        drain.await;
    }

    /// Forwards bus events to the subscriber set until the guardian is dropped.
    fn subscriber_listener(bus: &Bus, set: SubscriberSet, shutdown: CancellationToken) {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(target: "chaos_safeguards", skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = shutdown.cancelled() => break,
                }
            }
            set.shutdown().await;
        });
    }
}

impl Drop for Guardian {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}
