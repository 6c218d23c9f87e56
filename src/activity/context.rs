//! Read-only configuration and secrets shared by every safeguard task.

use std::sync::Arc;

use serde_json::{Map, Value};

/// Snapshot of the experiment configuration, secrets and settings.
///
/// Cheap to clone; every safeguard task holds its own handle.
#[derive(Clone, Debug, Default)]
pub struct ExecutionContext {
    configuration: Arc<Map<String, Value>>,
    secrets: Arc<Map<String, Value>>,
    settings: Arc<Map<String, Value>>,
}

impl ExecutionContext {
    pub fn new(
        configuration: Map<String, Value>,
        secrets: Map<String, Value>,
        settings: Map<String, Value>,
    ) -> Self {
        Self {
            configuration: Arc::new(configuration),
            secrets: Arc::new(secrets),
            settings: Arc::new(settings),
        }
    }

    pub fn configuration(&self) -> &Map<String, Value> {
        &self.configuration
    }

    pub fn secrets(&self) -> &Map<String, Value> {
        &self.secrets
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }
}
