//! # Guardian event subscribers.
//!
//! A [`Subscribe`] implementation observes the events of a guardian: safeguard
//! runs, breaches, the interruption and the drain. The guardian feeds it from
//! its own worker and queue, so a subscriber can take its time (write to a
//! file, call a webhook) without delaying a safeguard or the barrier.
//!
//! A subscriber that panics keeps receiving events; the panic is reported as
//! `EventKind::SubscriberPanicked`. When its queue is full the event is dropped
//! for that subscriber only and `EventKind::SubscriberOverflow` is published.

use async_trait::async_trait;

use crate::events::Event;

/// Observer of guardian events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order.
    async fn on_event(&self, event: &Event);

    /// Whether `event` should be queued for this subscriber at all.
    ///
    /// Filtering here keeps uninteresting events out of the queue.
    fn wants(&self, _event: &Event) -> bool {
        true
    }

    /// Name reported in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
