//! Runtime core: the guardian and its safeguards.
//!
//! The public API from this module is [`Guardian`] (with its builder and
//! configuration) and the two latches it shares with the host.
//!
//! Internal modules:
//! - [`guardian`]: prepare / run / terminate lifecycle, subscriber listener;
//! - [`pool`]: one concurrent pool per probe class, completion reporting;
//! - [`safeguard`]: per-class task bodies and the tolerance check;
//! - [`executor`]: one probe execution into a [`Run`](crate::Run);
//! - [`latch`]: interruption and finished latches.

mod builder;
mod config;
mod executor;
mod guardian;
mod latch;
mod pool;
mod safeguard;

pub use builder::GuardianBuilder;
pub use config::GuardianConfig;
pub use guardian::{Guardian, GuardianOutcome, GuardianState};
pub use latch::{FinishedLatch, InterruptionLatch};
