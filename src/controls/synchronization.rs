//! Marks the experiment as finished for every safeguard still in flight.

use async_trait::async_trait;
use serde_json::Value;

use crate::activity::ExecutionContext;
use crate::controls::Control;
use crate::core::FinishedLatch;
use crate::error::GuardError;

/// Sets the shared [`FinishedLatch`] in `after_experiment`.
#[derive(Clone, Debug, Default)]
pub struct SynchronizationControl {
    finished: FinishedLatch,
}

impl SynchronizationControl {
    pub fn new(finished: FinishedLatch) -> Self {
        Self { finished }
    }

    pub fn finished(&self) -> &FinishedLatch {
        &self.finished
    }
}

#[async_trait]
impl Control for SynchronizationControl {
    fn name(&self) -> &'static str {
        "synchronization"
    }

    async fn after_experiment(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        self.finished.set();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn after_experiment_sets_the_shared_latch() {
        let latch = FinishedLatch::new();
        let control = SynchronizationControl::new(latch.clone());

        control.before_experiment(&json!({}), &ExecutionContext::default()).await.unwrap();
        assert!(!latch.is_set());

        control.after_experiment(&json!({}), &ExecutionContext::default()).await.unwrap();
        assert!(latch.is_set());
        assert!(control.finished().is_set());
    }
}
