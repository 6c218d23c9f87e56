//! # Stateful subscriber that tracks running safeguards.
//!
//! [`AliveTracker`] keeps the names of safeguards that have started and not
//! yet finished. The guardian reads it while draining, to name the safeguards
//! that hold `terminate` back.
//!
//! ## Rules
//! - `SafeguardStarting` marks a safeguard alive
//! - `SafeguardFinished` / `SafeguardCrashed` mark it stopped
//! - `GuardianPrepared` forgets every safeguard; it is queued behind the
//!   previous run's events, so none of them leaks into the next run
//! - Events with `seq <= last_seq` for a safeguard are rejected (stale)
//! - Reads are **eventually consistent** with the safeguards themselves

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

#[derive(Debug, Clone)]
struct SafeguardState {
    last_seq: Option<u64>,
    alive: bool,
}

/// Thread-safe tracker of running safeguards.
#[derive(Default)]
pub struct AliveTracker {
    state: RwLock<HashMap<String, SafeguardState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event if it is newer than the last one seen for its safeguard.
    ///
    /// Returns `true` when the alive state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        if ev.kind == EventKind::GuardianPrepared {
            let mut state = self.state.write().await;
            let changed = state.values().any(|s| s.alive);
            state.clear();
            return changed;
        }
        let alive = match ev.kind {
            EventKind::SafeguardStarting => true,
            EventKind::SafeguardFinished | EventKind::SafeguardCrashed => false,
            _ => return false,
        };
        let Some(name) = ev.probe.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(SafeguardState {
            last_seq: None,
            alive: false,
        });
        if entry.last_seq.is_some_and(|last| ev.seq <= last) {
            return false;
        }
        entry.last_seq = Some(ev.seq);
        let changed = entry.alive != alive;
        entry.alive = alive;
        changed
    }

    /// Returns the sorted names of running safeguards.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    pub async fn is_alive(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .is_some_and(|s| s.alive)
    }

}

#[async_trait]
impl Subscribe for AliveTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn wants(&self, event: &Event) -> bool {
        matches!(
            event.kind,
            EventKind::GuardianPrepared
                | EventKind::SafeguardStarting
                | EventKind::SafeguardFinished
                | EventKind::SafeguardCrashed
        )
    }

    fn name(&self) -> &'static str {
        "alive_tracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, name: &str) -> Event {
        Event::new(kind).with_probe(name)
    }

    #[tokio::test]
    async fn tracks_start_and_finish() {
        let tracker = AliveTracker::new();
        assert!(tracker.update(&ev(EventKind::SafeguardStarting, "b")).await);
        assert!(tracker.update(&ev(EventKind::SafeguardStarting, "a")).await);
        assert_eq!(tracker.snapshot().await, vec!["a", "b"]);

        assert!(tracker.update(&ev(EventKind::SafeguardFinished, "a")).await);
        assert!(!tracker.is_alive("a").await);
        assert!(tracker.is_alive("b").await);
    }

    #[tokio::test]
    async fn stale_events_are_rejected() {
        let tracker = AliveTracker::new();
        let starting = ev(EventKind::SafeguardStarting, "p");
        let crashed = ev(EventKind::SafeguardCrashed, "p");
        assert!(!tracker.update(&crashed).await);
        assert!(!tracker.update(&starting).await);
        assert!(!tracker.is_alive("p").await);
    }

    #[tokio::test]
    async fn ignores_unrelated_events() {
        let tracker = AliveTracker::new();
        let breach = ev(EventKind::ToleranceBreached, "p");
        assert!(!tracker.wants(&breach));
        assert!(!tracker.update(&breach).await);
        assert!(tracker.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn prepared_forgets_the_previous_run() {
        let tracker = AliveTracker::new();
        // Late events of the previous run are applied before the reset.
        tracker.update(&ev(EventKind::SafeguardStarting, "old")).await;
        tracker.update(&ev(EventKind::SafeguardStarting, "stuck")).await;
        tracker.update(&ev(EventKind::SafeguardFinished, "old")).await;

        let prepared = Event::new(EventKind::GuardianPrepared);
        assert!(tracker.wants(&prepared));
        assert!(tracker.update(&prepared).await);
        assert!(tracker.snapshot().await.is_empty());

        tracker.update(&ev(EventKind::SafeguardStarting, "new")).await;
        assert_eq!(tracker.snapshot().await, vec!["new"]);
    }
}
