//! # Interruption and finished latches.
//!
//! Both latches are the only state written by more than one safeguard task.
//!
//! - [`InterruptionLatch`]: first writer wins. `try_fire` is a single
//!   compare-and-swap, so the stop side effect runs at most once no matter how
//!   many safeguards breach at the same time. The winner records itself as the
//!   cause only once it actually stops the experiment.
//! - [`FinishedLatch`]: set by the host lifecycle once the experiment is over;
//!   safeguards stop evaluating tolerances after that. `prepare` clears it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Records that a safeguard asked for the experiment to stop.
#[derive(Debug, Default)]
pub struct InterruptionLatch {
    fired: AtomicBool,
    cause: Mutex<Option<Arc<str>>>,
}

impl InterruptionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch.
    ///
    /// Returns `true` for exactly one caller per run; that caller owns the stop side effect.
    pub fn try_fire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Names `probe` as the safeguard that stopped the experiment.
    pub(crate) fn record_cause(&self, probe: &Arc<str>) {
        *self.cause.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(probe));
    }

    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Name of the safeguard that stopped the experiment.
    ///
    /// `None` when the latch was won after the experiment had finished.
    pub fn cause(&self) -> Option<Arc<str>> {
        self.cause.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Clears the latch. Only called by `prepare`, when no safeguard is running.
    pub(crate) fn reset(&self) {
        *self.cause.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.fired.store(false, Ordering::Release);
    }
}

/// Shared "the experiment has ended" flag.
///
/// Cloning shares the flag. The host sets it (usually through
/// [`SynchronizationControl`](crate::controls::SynchronizationControl)) and the
/// guardian reads it before every tolerance check.
#[derive(Clone, Debug, Default)]
pub struct FinishedLatch {
    flag: Arc<AtomicBool>,
}

impl FinishedLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the experiment as finished. Idempotent.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clears the flag for the next run. Only called by `prepare`.
    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn only_first_fire_wins() {
        let latch = InterruptionLatch::new();
        let a: Arc<str> = Arc::from("a");
        assert!(latch.try_fire());
        assert!(!latch.try_fire());
        assert!(latch.is_set());
        assert!(latch.cause().is_none());

        latch.record_cause(&a);
        assert_eq!(latch.cause().as_deref(), Some("a"));

        latch.reset();
        assert!(!latch.is_set());
        assert!(latch.cause().is_none());
    }

    #[test]
    fn concurrent_fires_elect_one_winner() {
        let latch = Arc::new(InterruptionLatch::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let latch = Arc::clone(&latch);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    let name: Arc<str> = Arc::from(format!("p{i}"));
                    if latch.try_fire() {
                        latch.record_cause(&name);
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(latch.cause().is_some());
    }

    #[test]
    fn finished_latch_is_shared_between_clones() {
        let host = FinishedLatch::new();
        let guardian_side = host.clone();
        assert!(!guardian_side.is_set());
        host.set();
        host.set();
        assert!(guardian_side.is_set());

        guardian_side.reset();
        assert!(!host.is_set());
    }
}
