//! # LogWriter: renders guardian events through `tracing`.
//!
//! Severity follows what the operator must act on:
//! ```text
//! ERROR  experiment interrupted by a safeguard
//! WARN   tolerance breached, safeguard crashed, slow drain, subscriber trouble
//! INFO   prepare / terminate / all stopped, failed runs
//! DEBUG  safeguard starting, succeeded runs, safeguard finished
//! ```
//!
//! Events are emitted under the `chaos_safeguards` target, so
//! `RUST_LOG=chaos_safeguards=debug` shows every safeguard tick.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::probes::RunStatus;
use crate::subscribers::Subscribe;

const TARGET: &str = "chaos_safeguards";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let probe = e.probe.as_deref().unwrap_or("unknown");
        let class = e.class.map(|c| c.as_str()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::GuardianPrepared => {
                info!(target: TARGET, counts = reason, "guardian prepared");
            }
            EventKind::TerminateRequested => {
                info!(target: TARGET, "terminating safeguards");
            }
            EventKind::DrainSlow => {
                warn!(target: TARGET, running = reason, "safeguards are still running; waiting for them to return");
            }
            EventKind::AllSafeguardsStopped => {
                info!(target: TARGET, "all safeguards stopped");
            }
            EventKind::SafeguardStarting => {
                debug!(target: TARGET, probe, class, tick = e.tick, "safeguard starting");
            }
            EventKind::SafeguardRan => match e.status {
                Some(RunStatus::Failed) => {
                    info!(target: TARGET, probe, class, tick = e.tick, duration_ms = e.duration_ms, error = reason, "safeguard probe failed");
                }
                _ => {
                    debug!(target: TARGET, probe, class, tick = e.tick, duration_ms = e.duration_ms, "safeguard probe ran");
                }
            },
            EventKind::ToleranceBreached => {
                warn!(target: TARGET, probe, class, tick = e.tick, "safeguard '{probe}' is outside its tolerance");
            }
            EventKind::ExperimentInterrupted => {
                error!(target: TARGET, probe, class, "safeguard '{probe}' triggered the end of the experiment");
            }
            EventKind::SafeguardFinished => {
                debug!(target: TARGET, probe, class, "safeguard '{probe}' finished normally");
            }
            EventKind::SafeguardCrashed => {
                warn!(target: TARGET, probe, class, error = reason, "safeguard '{probe}' failed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = probe, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: TARGET, subscriber = probe, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
