//! Guardian events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the guardian and its safeguard tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Guardian` (prepare/terminate), safeguard task bodies,
//!   the pool completion wrapper, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the guardian listener, which fans out to `SubscriberSet`
//!   (logging, `AliveTracker`, user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
