//! # Subscriber fan-out.
//!
//! [`SubscriberSet`] hands every guardian event to each interested subscriber
//! through a bounded queue and a dedicated worker:
//!
//! ```text
//! emit(event) ──┬─ wants? ─► try_send ─► [queue: log_writer]    ─► worker ─► on_event
//!               ├─ wants? ─► try_send ─► [queue: alive_tracker] ─► worker ─► on_event
//!               └─ ...        │
//!                             └─ full / closed ─► Bus: SubscriberOverflow
//! ```
//!
//! `emit` never waits: it is called from the guardian listener, which must keep
//! up with the bus. A subscriber panic is caught per event and published as
//! `SubscriberPanicked`; the worker then moves on to the next event.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    subscriber: Arc<dyn Subscribe>,
    queue: mpsc::Sender<Arc<Event>>,
}

/// Fan-out of guardian events to subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, workers) = subscribers
            .into_iter()
            .map(|subscriber| {
                let (queue, rx) = mpsc::channel(subscriber.queue_capacity().max(1));
                let worker = tokio::spawn(deliver(Arc::clone(&subscriber), rx, bus.clone()));
                (Lane { subscriber, queue }, worker)
            })
            .unzip();

        Self {
            lanes,
            workers,
            bus,
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues `event` for every subscriber that wants it.
    pub fn emit(&self, event: Event) {
        let reports_overflow = event.kind != EventKind::SubscriberOverflow;
        let event = Arc::new(event);

        for lane in self.lanes.iter().filter(|l| l.subscriber.wants(&event)) {
            let reason = match lane.queue.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            // An overflow about an overflow would feed itself.
            if reports_overflow {
                self.bus
                    .publish(Event::subscriber_overflow(lane.subscriber.name(), reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to finish what is queued.
    pub async fn shutdown(self) {
        let Self { lanes, workers, .. } = self;
        drop(lanes);
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::warn!(target: "chaos_safeguards", error = %e, "subscriber worker aborted");
            }
        }
    }
}

async fn deliver(subscriber: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(event) = rx.recv().await {
        let handled = AssertUnwindSafe(subscriber.on_event(&event)).catch_unwind().await;
        if let Err(panic) = handled {
            bus.publish(Event::subscriber_panicked(
                subscriber.name(),
                panic_message(panic.as_ref()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    /// Only interested in breaches.
    #[derive(Default)]
    struct BreachesOnly {
        seen: Mutex<usize>,
    }

    #[async_trait]
    impl Subscribe for BreachesOnly {
        async fn on_event(&self, _event: &Event) {
            *self.seen.lock().unwrap() += 1;
        }
        fn wants(&self, event: &Event) -> bool {
            event.kind == EventKind::ToleranceBreached
        }
    }

    /// Parks on its first event so its single-slot queue fills up.
    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }
        fn name(&self) -> &'static str {
            "stuck"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_isolates_panics() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone(), Arc::new(Exploder)], bus.clone());
        assert_eq!(set.len(), 2);

        set.emit(Event::new(EventKind::GuardianPrepared));
        set.emit(Event::new(EventKind::TerminateRequested));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![EventKind::GuardianPrepared, EventKind::TerminateRequested]
        );
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.probe.as_deref(), Some("exploder"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn skips_unwanted_events() {
        let bus = Bus::new(16);
        let only = Arc::new(BreachesOnly::default());
        let set = SubscriberSet::new(vec![only.clone()], bus);

        set.emit(Event::new(EventKind::SafeguardStarting));
        set.emit(Event::new(EventKind::ToleranceBreached));
        set.emit(Event::new(EventKind::SafeguardFinished));
        set.shutdown().await;

        assert_eq!(*only.seen.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        set.emit(Event::new(EventKind::SafeguardStarting));
        tokio::task::yield_now().await;
        set.emit(Event::new(EventKind::SafeguardRan));
        set.emit(Event::new(EventKind::SafeguardFinished));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.probe.as_deref(), Some("stuck"));
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
