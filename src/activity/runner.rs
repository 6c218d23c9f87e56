//! # Activity runner seam and its function-backed implementation.
//!
//! [`ActivityRunner::run`] executes one activity and returns its output.
//! A runner signals "the probed system misbehaved" with
//! [`ActivityError::Failed`]; the guardian turns that into a `failed` run.
//!
//! Runners doing blocking I/O should hop onto `tokio::task::spawn_blocking`
//! themselves; the guardian awaits them on the async runtime.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::activity::ExecutionContext;
use crate::error::ActivityError;
use crate::probes::Probe;

/// # Executes probe declarations.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use chaos_safeguards::{ActivityError, ActivityRunner, ExecutionContext, Probe};
///
/// struct Always200;
///
/// #[async_trait]
/// impl ActivityRunner for Always200 {
///     async fn run(
///         &self,
///         _experiment: &Value,
///         _activity: &Probe,
///         _ctx: &ExecutionContext,
///     ) -> Result<Value, ActivityError> {
///         Ok(json!(200))
///     }
/// }
/// ```
#[async_trait]
pub trait ActivityRunner: Send + Sync + 'static {
    /// Executes `activity` in the context of `experiment`.
    async fn run(
        &self,
        experiment: &Value,
        activity: &Probe,
        ctx: &ExecutionContext,
    ) -> Result<Value, ActivityError>;
}

/// Function-backed runner.
///
/// Wraps a closure that *creates* a new future per execution; the closure
/// receives its own copy of the activity.
pub struct RunnerFn<F> {
    f: F,
}

impl<F> RunnerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the runner as a shared handle.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use serde_json::json;
    /// use chaos_safeguards::{ActivityError, ActivityRunner, RunnerFn};
    ///
    /// let runner: Arc<dyn ActivityRunner> = RunnerFn::arc(|_probe: chaos_safeguards::Probe| async {
    ///     Ok::<_, ActivityError>(json!(true))
    /// });
    /// ```
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> ActivityRunner for RunnerFn<F>
where
    F: Fn(Probe) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ActivityError>> + Send + 'static,
{
    async fn run(
        &self,
        _experiment: &Value,
        activity: &Probe,
        _ctx: &ExecutionContext,
    ) -> Result<Value, ActivityError> {
        (self.f)(activity.clone()).await
    }
}
