//! # Stop side effect.
//!
//! The guardian calls [`Interrupt::interrupt`] at most once per run, when the
//! first safeguard breaches its tolerance while the experiment is still going.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Begins a graceful, experiment-wide interruption.
pub trait Interrupt: Send + Sync + 'static {
    fn interrupt(&self);
}

impl<F> Interrupt for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn interrupt(&self) {
        self()
    }
}

/// Interruption signal the host lifecycle awaits.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use chaos_safeguards::{ExperimentInterrupt, Interrupt};
///
/// let stop = ExperimentInterrupt::new();
/// let host = stop.clone();
/// stop.interrupt();
/// host.interrupted().await;
/// assert!(host.is_interrupted());
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExperimentInterrupt {
    token: CancellationToken,
}

impl ExperimentInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_interrupted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the experiment has been interrupted.
    pub fn interrupted(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Token cancelled on interruption, for `select!` in the host.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Interrupt for ExperimentInterrupt {
    fn interrupt(&self) {
        self.token.cancel();
    }
}
