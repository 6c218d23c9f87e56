//! # Event bus for broadcasting guardian events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from many safeguard tasks at once.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Subscriber (one):
//!   Blocking safeguards   ──┐
//!   Background safeguards ──┼────► Bus ────► guardian listener ────► SubscriberSet
//!   Repeating safeguards  ──┤  (broadcast)
//!   Guardian              ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks a safeguard.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for guardian events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::GuardianPrepared));
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::TerminateRequested));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TerminateRequested);
    }
}
