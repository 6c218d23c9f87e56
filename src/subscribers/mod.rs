//! # Event subscribers for the guardian.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   safeguard task ── publish(Event) ──► Bus ──► guardian listener ──► SubscriberSet
//!                                                                        │
//!                                                         ┌──────────────┼──────────────┐
//!                                                         ▼              ▼              ▼
//!                                                     LogWriter     AliveTracker     Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events ([`LogWriter`], metrics, alerts)
//! - **Stateful subscribers** - maintain state from events ([`AliveTracker`])
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use chaos_safeguards::{Event, EventKind, Subscribe};
//!
//! struct Pager;
//!
//! #[async_trait]
//! impl Subscribe for Pager {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ExperimentInterrupted {
//!             // page the on-call
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "pager" }
//! }
//! ```

mod alive;
mod log;
mod subscriber;
mod subscriber_set;

pub use alive::AliveTracker;
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
