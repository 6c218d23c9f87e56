//! # Experiment lifecycle controls.
//!
//! A [`Control`] hooks into the host's experiment lifecycle. Every hook has a
//! no-op default; a control overrides the ones it needs.
//!
//! ```text
//! configure ─► before_experiment ─► [ before_activity ─► activity ─► after_activity ]* ─► after_experiment
//! ```
//!
//! Provided controls:
//! - [`SafeguardControl`]: drives a [`Guardian`](crate::Guardian) (prepare, run, terminate)
//! - [`SynchronizationControl`]: sets the [`FinishedLatch`](crate::FinishedLatch) once the experiment ends
//! - [`BypassControl`]: marks matching activities as `dry`
//! - [`RepeatControl`]: appends repetitions of an activity to the experiment
//!
//! Register [`SynchronizationControl`] before [`SafeguardControl`] so that
//! safeguards still in flight see the experiment as finished before terminate
//! waits for them.

mod bypass;
mod repeat;
mod safeguards;
mod synchronization;

pub use bypass::BypassControl;
pub use repeat::RepeatControl;
pub use safeguards::SafeguardControl;
pub use synchronization::SynchronizationControl;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::activity::ExecutionContext;
use crate::error::{GuardError, ValidationError};

/// Hooks into the experiment lifecycle.
///
/// `activity` in the activity hooks is the host's copy of the activity being
/// executed, distinct from its entry in `experiment`.
#[async_trait]
pub trait Control: Send + Sync + 'static {
    /// Returns control name for logging.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn configure(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        Ok(())
    }

    async fn before_experiment(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        Ok(())
    }

    async fn after_experiment(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        Ok(())
    }

    async fn before_activity(&self, _activity: &mut Value, _experiment: &Value) -> Result<(), GuardError> {
        Ok(())
    }

    async fn after_activity(
        &self,
        _activity: &mut Value,
        _experiment: &mut Value,
        _state: &Value,
    ) -> Result<(), GuardError> {
        Ok(())
    }
}

/// Decodes a control's `arguments` object.
pub(crate) fn decode_arguments<T: DeserializeOwned>(arguments: &Value) -> Result<T, ValidationError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| ValidationError::InvalidArguments {
        reason: e.to_string(),
    })
}
