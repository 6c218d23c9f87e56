//! # Execution pools, one per probe class.
//!
//! Each [`ExecutionPool`] is a `JoinSet` gated by a semaphore of
//! `max(count, 1)` permits. Sizing to the class count lets every blocking
//! safeguard start at once: an undersized blocking pool would leave some
//! safeguards waiting for a worker while the others wait at the barrier.
//!
//! ## Completion reporting
//! Every submitted body is wrapped so that, as soon as it ends:
//! ```text
//! Ok(())            → SafeguardFinished
//! Err(fault)        → SafeguardCrashed { reason: fault }
//! panic             → SafeguardCrashed { reason: panic info }
//! ```
//! Siblings are never affected by a crashed safeguard.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{ActivityError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::probes::{ClassCounts, ProbeClass};

/// Concurrent workers for one probe class.
pub(crate) struct ExecutionPool {
    class: ProbeClass,
    workers: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl ExecutionPool {
    pub fn new(class: ProbeClass, size: usize) -> Self {
        Self {
            class,
            workers: Arc::new(Semaphore::new(size.max(1))),
            tasks: JoinSet::new(),
        }
    }

    /// Number of submitted safeguards not yet joined.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Spawns `body` on a worker of this pool.
    pub fn submit<F>(&mut self, probe: Arc<str>, bus: Bus, body: F)
    where
        F: Future<Output = Result<(), ActivityError>> + Send + 'static,
    {
        let workers = Arc::clone(&self.workers);
        let class = self.class;

        self.tasks.spawn(async move {
            // The semaphore is never closed; a missing permit only means an unbounded slot.
            let _permit = workers.acquire_owned().await.ok();

            let outcome = AssertUnwindSafe(body).catch_unwind().await;
            let ev = match outcome {
                Ok(Ok(())) => Event::new(EventKind::SafeguardFinished),
                Ok(Err(fault)) => Event::new(EventKind::SafeguardCrashed).with_reason(fault.to_string()),
                Err(panic) => Event::new(EventKind::SafeguardCrashed)
                    .with_reason(format!("panicked: {}", panic_message(panic.as_ref()))),
            };
            bus.publish(ev.with_probe(probe).with_class(class));
        });
    }

    /// Waits for every submitted safeguard to end.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(target: "chaos_safeguards", class = %self.class, error = %e, "safeguard task aborted");
            }
        }
    }
}

/// The three pools of a prepared guardian.
pub(crate) struct Pools {
    pub blocking: ExecutionPool,
    pub background_once: ExecutionPool,
    pub repeating: ExecutionPool,
}

impl Pools {
    pub fn new(counts: &ClassCounts) -> Self {
        Self {
            blocking: ExecutionPool::new(ProbeClass::Blocking, counts.pool_size(ProbeClass::Blocking)),
            background_once: ExecutionPool::new(
                ProbeClass::BackgroundOnce,
                counts.pool_size(ProbeClass::BackgroundOnce),
            ),
            repeating: ExecutionPool::new(ProbeClass::Repeating, counts.pool_size(ProbeClass::Repeating)),
        }
    }

    pub fn for_class(&mut self, class: ProbeClass) -> &mut ExecutionPool {
        match class {
            ProbeClass::Blocking => &mut self.blocking,
            ProbeClass::BackgroundOnce => &mut self.background_once,
            ProbeClass::Repeating => &mut self.repeating,
        }
    }

    pub fn pending(&self) -> usize {
        self.blocking.pending() + self.background_once.pending() + self.repeating.pending()
    }

    /// Drains the three pools concurrently.
    pub async fn drain(&mut self) {
        tokio::join!(
            self.blocking.drain(),
            self.background_once.drain(),
            self.repeating.drain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn explode() -> Result<(), ActivityError> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        panic!("kaboom")
    }

    #[test]
    fn empty_classes_get_one_worker() {
        let pools = Pools::new(&ClassCounts {
            blocking: 3,
            background_once: 0,
            repeating: 0,
        });
        assert_eq!(pools.blocking.workers.available_permits(), 3);
        assert_eq!(pools.background_once.workers.available_permits(), 1);
        assert_eq!(pools.repeating.workers.available_permits(), 1);
        assert_eq!(pools.pending(), 0);
    }

    #[tokio::test]
    async fn drain_of_empty_pools_returns() {
        let mut pools = Pools::new(&ClassCounts::default());
        pools.drain().await;
    }

    #[tokio::test]
    async fn reports_finished_crashed_and_panicked_bodies() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let mut pool = ExecutionPool::new(ProbeClass::BackgroundOnce, 3);

        pool.submit("ok".into(), bus.clone(), async { Ok(()) });
        pool.submit("fault".into(), bus.clone(), async {
            Err(ActivityError::fault("no provider"))
        });
        pool.submit("panic".into(), bus.clone(), explode());
        pool.drain().await;

        let mut finished = Vec::new();
        let mut crashed = Vec::new();
        for _ in 0..3 {
            let ev = rx.recv().await.unwrap();
            let name = ev.probe.as_deref().unwrap().to_string();
            match ev.kind {
                EventKind::SafeguardFinished => finished.push(name),
                EventKind::SafeguardCrashed => crashed.push((name, ev.reason.unwrap().to_string())),
                other => panic!("unexpected event {other:?}"),
            }
        }
        crashed.sort();
        assert_eq!(finished, vec!["ok"]);
        assert_eq!(crashed[0].0, "fault");
        assert_eq!(crashed[1], ("panic".to_string(), "panicked: kaboom".to_string()));
    }
}
