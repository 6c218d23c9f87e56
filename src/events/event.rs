//! # Events emitted by the guardian and its safeguards.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Lifecycle events**: guardian prepare/terminate and drain progress
//! - **Safeguard events**: one safeguard execution (starting, ran, breached, finished, crashed)
//! - **Subscriber events**: delivery problems of the fan-out itself
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events of one safeguard are published in execution order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use chaos_safeguards::{Event, EventKind, ProbeClass};
//!
//! let ev = Event::new(EventKind::ToleranceBreached)
//!     .with_probe("disk-usage")
//!     .with_class(ProbeClass::Repeating)
//!     .with_tick(3);
//!
//! assert_eq!(ev.kind, EventKind::ToleranceBreached);
//! assert_eq!(ev.probe.as_deref(), Some("disk-usage"));
//! assert_eq!(ev.tick, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::probes::{ProbeClass, RunStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of guardian events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Guardian lifecycle ===
    /// Pools, barrier and stop token allocated.
    ///
    /// Sets:
    /// - `reason`: class counts
    GuardianPrepared,

    /// `terminate` was called; repeating safeguards are being woken.
    TerminateRequested,

    /// `terminate` has waited longer than `GuardianConfig::drain_warning`.
    ///
    /// Sets:
    /// - `reason`: names of the safeguards still running
    DrainSlow,

    /// Every pool is drained; no safeguard task is left.
    AllSafeguardsStopped,

    // === Safeguard events ===
    /// A safeguard is about to execute its probe.
    ///
    /// Sets:
    /// - `probe`, `class`
    /// - `tick`: execution number (1-based, per safeguard)
    SafeguardStarting,

    /// A probe execution produced a run.
    ///
    /// Sets:
    /// - `probe`, `class`, `tick`
    /// - `status`: run status
    /// - `duration_ms`: run duration
    /// - `reason`: failure detail for failed runs
    SafeguardRan,

    /// A run output is outside the probe tolerance.
    ///
    /// Sets:
    /// - `probe`, `class`, `tick`
    ToleranceBreached,

    /// This safeguard fired the experiment interruption (at most once per run).
    ///
    /// Sets:
    /// - `probe`, `class`
    ExperimentInterrupted,

    /// The safeguard task ended normally.
    ///
    /// Sets:
    /// - `probe`, `class`
    SafeguardFinished,

    /// The safeguard task ended on a fault or a panic.
    ///
    /// Sets:
    /// - `probe`, `class`
    /// - `reason`: fault message or panic info
    SafeguardCrashed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `probe`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `probe`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,
}

/// Guardian event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the probe (or subscriber), if applicable.
    pub probe: Option<Arc<str>>,
    /// Scheduling class of the probe.
    pub class: Option<ProbeClass>,
    /// Status of the run.
    pub status: Option<RunStatus>,
    /// Execution number within the safeguard (starting from 1).
    pub tick: Option<u32>,
    /// Run duration in milliseconds (compact).
    pub duration_ms: Option<u32>,
    /// Human-readable reason (failures, counts, stuck safeguards).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            probe: None,
            class: None,
            status: None,
            tick: None,
            duration_ms: None,
            reason: None,
        }
    }

    /// Attaches a probe name.
    #[inline]
    pub fn with_probe(mut self, probe: impl Into<Arc<str>>) -> Self {
        self.probe = Some(probe.into());
        self
    }

    /// Attaches a probe class.
    #[inline]
    pub fn with_class(mut self, class: ProbeClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Attaches a run status.
    #[inline]
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches an execution number.
    #[inline]
    pub fn with_tick(mut self, tick: u32) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attaches a run duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.duration_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_probe(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_probe(subscriber)
            .with_reason(info)
    }

    /// Whether the event describes a single safeguard.
    #[inline]
    pub fn is_safeguard_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SafeguardStarting
                | EventKind::SafeguardRan
                | EventKind::ToleranceBreached
                | EventKind::ExperimentInterrupted
                | EventKind::SafeguardFinished
                | EventKind::SafeguardCrashed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::TerminateRequested);
        let b = Event::new(EventKind::AllSafeguardsStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn duration_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::SafeguardRan).with_duration(Duration::from_secs(u64::MAX));
        assert_eq!(ev.duration_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_events_are_not_safeguard_events() {
        assert!(!Event::subscriber_overflow("log", "full").is_safeguard_event());
        assert!(Event::new(EventKind::SafeguardCrashed).is_safeguard_event());
    }
}
