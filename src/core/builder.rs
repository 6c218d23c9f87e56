use std::sync::Arc;

use crate::{
    activity::{
        ActivityLookup, ActivityRunner, ExperimentInterrupt, Interrupt, NoLookup, StaticTolerance,
        ToleranceEvaluator,
    },
    core::{
        config::GuardianConfig,
        guardian::{Guardian, GuardianParts},
        latch::FinishedLatch,
    },
    events::Bus,
    subscribers::{AliveTracker, LogWriter, Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Guardian`] with its collaborators.
///
/// Defaults:
/// - tolerance: [`StaticTolerance`]
/// - lookup: [`NoLookup`] (every `ref` probe fails validation)
/// - interrupt: a fresh [`ExperimentInterrupt`]
/// - finished latch: a fresh [`FinishedLatch`]
pub struct GuardianBuilder {
    cfg: GuardianConfig,
    runner: Arc<dyn ActivityRunner>,
    evaluator: Arc<dyn ToleranceEvaluator>,
    lookup: Arc<dyn ActivityLookup>,
    interrupt: Arc<dyn Interrupt>,
    finished: FinishedLatch,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GuardianBuilder {
    /// Creates a new builder with the given configuration and activity runner.
    pub fn new(cfg: GuardianConfig, runner: Arc<dyn ActivityRunner>) -> Self {
        Self {
            cfg,
            runner,
            evaluator: Arc::new(StaticTolerance),
            lookup: Arc::new(NoLookup),
            interrupt: Arc::new(ExperimentInterrupt::new()),
            finished: FinishedLatch::new(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the tolerance evaluator.
    pub fn with_tolerance(mut self, evaluator: Arc<dyn ToleranceEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Sets the lookup used to resolve `ref` probes.
    pub fn with_lookup(mut self, lookup: Arc<dyn ActivityLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Sets the stop side effect, invoked at most once per run.
    pub fn with_interrupt(mut self, interrupt: Arc<dyn Interrupt>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Shares the host's finished latch with the guardian.
    pub fn with_finished(mut self, finished: FinishedLatch) -> Self {
        self.finished = finished;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive guardian events through dedicated workers with
    /// bounded queues; a slow or panicking subscriber never holds a safeguard back.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the guardian and starts its subscriber listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Guardian> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let alive = Arc::new(AliveTracker::new());

        let mut subscribers = self.subscribers;
        if self.cfg.log_events {
            subscribers.push(Arc::new(LogWriter::new()));
        }
        subscribers.push(alive.clone());
        let subs = SubscriberSet::new(subscribers, bus.clone());

        Arc::new(Guardian::new_internal(GuardianParts {
            cfg: self.cfg,
            bus,
            alive,
            subs,
            runner: self.runner,
            evaluator: self.evaluator,
            lookup: self.lookup,
            interrupt: self.interrupt,
            finished: self.finished,
        }))
    }
}
