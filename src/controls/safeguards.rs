//! # Safeguard control.
//!
//! Binds a [`Guardian`] to the experiment lifecycle:
//!
//! ```text
//! configure          ─► guardian.prepare(probes)
//! before_experiment  ─► guardian.run(experiment, probes, ctx)   (blocks on blocking safeguards)
//! after_experiment   ─► guardian.terminate()
//! ```
//!
//! Arguments:
//! ```json
//! "arguments": {
//!     "probes": [
//!         {"name": "pre-check", "type": "probe", "tolerance": true, "provider": {..}},
//!         {"name": "watch", "type": "probe", "frequency": 2, "tolerance": true, "provider": {..}},
//!         {"name": "once", "type": "probe", "background": true, "tolerance": true, "provider": {..}}
//!     ]
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::activity::ExecutionContext;
use crate::controls::{Control, decode_arguments};
use crate::core::{Guardian, GuardianOutcome};
use crate::error::{GuardError, ValidationError};
use crate::probes::Probe;

#[derive(Debug, Default, Deserialize)]
struct SafeguardArguments {
    #[serde(default)]
    probes: Vec<Probe>,
}

pub struct SafeguardControl {
    guardian: Arc<Guardian>,
    probes: Vec<Probe>,
}

impl SafeguardControl {
    pub fn new(guardian: Arc<Guardian>, probes: Vec<Probe>) -> Self {
        Self { guardian, probes }
    }

    /// Builds the control from its JSON arguments (`{"probes": [...]}`).
    pub fn from_arguments(guardian: Arc<Guardian>, arguments: &Value) -> Result<Self, ValidationError> {
        let args: SafeguardArguments = decode_arguments(arguments)?;
        Ok(Self::new(guardian, args.probes))
    }

    pub fn guardian(&self) -> &Arc<Guardian> {
        &self.guardian
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }
}

#[async_trait]
impl Control for SafeguardControl {
    fn name(&self) -> &'static str {
        "safeguards"
    }

    async fn configure(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        self.guardian.prepare(&self.probes).await?;
        Ok(())
    }

    async fn before_experiment(&self, experiment: &Value, ctx: &ExecutionContext) -> Result<(), GuardError> {
        self.guardian.run(experiment, &self.probes, ctx).await
    }

    async fn after_experiment(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        if let GuardianOutcome::Interrupted { probe } = self.guardian.terminate().await {
            tracing::info!(target: "chaos_safeguards", probe = %probe, "experiment ended by safeguard");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::RunnerFn;
    use crate::core::{GuardianConfig, GuardianState};
    use crate::error::ActivityError;
    use serde_json::json;

    fn guardian() -> Arc<Guardian> {
        let runner = RunnerFn::arc(|_probe: Probe| async move { Ok::<_, ActivityError>(json!(true)) });
        let cfg = GuardianConfig {
            log_events: false,
            ..GuardianConfig::default()
        };
        Guardian::builder(cfg, runner).build()
    }

    #[tokio::test]
    async fn drives_the_guardian_lifecycle() {
        let args = json!({"probes": [
            {"name": "now", "type": "probe", "tolerance": true},
            {"name": "later", "type": "probe", "background": true, "tolerance": true}
        ]});
        let control = SafeguardControl::from_arguments(guardian(), &args).unwrap();
        let experiment = json!({"title": "t"});
        let ctx = ExecutionContext::default();
        assert_eq!(control.probes().len(), 2);

        control.configure(&experiment, &ctx).await.unwrap();
        assert_eq!(control.guardian().state().await, GuardianState::Prepared);

        control.before_experiment(&experiment, &ctx).await.unwrap();
        assert_eq!(control.guardian().state().await, GuardianState::Running);

        control.after_experiment(&experiment, &ctx).await.unwrap();
        assert_eq!(control.guardian().state().await, GuardianState::Terminated);
        assert_eq!(control.guardian().outcome(), GuardianOutcome::Completed);
    }

    #[tokio::test]
    async fn before_experiment_without_configure_fails() {
        let control = SafeguardControl::new(guardian(), Vec::new());
        let err = control
            .before_experiment(&json!({}), &ExecutionContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "guard_not_prepared");
    }

    #[tokio::test]
    async fn rejects_probes_that_are_not_a_list() {
        let err = SafeguardControl::from_arguments(guardian(), &json!({"probes": 3}));
        assert!(matches!(err, Err(ValidationError::InvalidArguments { .. })));
    }
}
