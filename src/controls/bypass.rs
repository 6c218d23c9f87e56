//! # Bypass control.
//!
//! Sets `"dry": true` on the activities that match either by `type` or by
//! name, so the host skips their execution, and removes it afterwards.
//!
//! ```json
//! "arguments": {
//!     "target_type": "action",
//!     "target_names": ["say-hello"]
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::activity::ExecutionContext;
use crate::controls::{Control, decode_arguments};
use crate::error::{GuardError, ValidationError};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BypassControl {
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_names: Vec<String>,
}

impl BypassControl {
    /// Builds the control from its JSON arguments.
    pub fn from_arguments(arguments: &Value) -> Result<Self, ValidationError> {
        decode_arguments(arguments)
    }

    /// Whether `activity` is bypassed by this control.
    pub fn matches(&self, activity: &Value) -> bool {
        let by_type = match (self.target_type.as_deref(), activity.get("type").and_then(Value::as_str)) {
            (Some(target), Some(kind)) => target == kind,
            _ => false,
        };
        let by_name = activity
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| self.target_names.iter().any(|n| n == name));
        by_type || by_name
    }
}

#[async_trait]
impl Control for BypassControl {
    fn name(&self) -> &'static str {
        "bypass"
    }

    async fn before_experiment(&self, _experiment: &Value, _ctx: &ExecutionContext) -> Result<(), GuardError> {
        if let Some(kind) = self.target_type.as_deref() {
            tracing::warn!(target: "chaos_safeguards", target_type = kind, "no '{kind}' will be executed as configured by the bypass control");
        }
        if !self.target_names.is_empty() {
            tracing::warn!(
                target: "chaos_safeguards",
                "the following activities will not be executed: {}",
                self.target_names.join(", ")
            );
        }
        Ok(())
    }

    async fn before_activity(&self, activity: &mut Value, _experiment: &Value) -> Result<(), GuardError> {
        if self.matches(activity) {
            if let Some(obj) = activity.as_object_mut() {
                obj.insert("dry".to_string(), Value::Bool(true));
            }
        }
        Ok(())
    }

    async fn after_activity(
        &self,
        activity: &mut Value,
        _experiment: &mut Value,
        _state: &Value,
    ) -> Result<(), GuardError> {
        if self.matches(activity) {
            if let Some(obj) = activity.as_object_mut() {
                obj.remove("dry");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn bypasses_by_type() {
        let control = BypassControl::from_arguments(&json!({"target_type": "action"})).unwrap();
        let experiment = json!({});
        let mut action = json!({"name": "say-hello", "type": "action"});
        let mut probe = json!({"name": "read", "type": "probe"});

        control.before_activity(&mut action, &experiment).await.unwrap();
        control.before_activity(&mut probe, &experiment).await.unwrap();
        assert_eq!(action["dry"], json!(true));
        assert!(probe.get("dry").is_none());

        control
            .after_activity(&mut action, &mut json!({}), &json!({}))
            .await
            .unwrap();
        assert!(action.get("dry").is_none());
    }

    #[tokio::test]
    async fn bypasses_by_name() {
        let control = BypassControl::from_arguments(&json!({"target_names": ["say-hello"]})).unwrap();
        let mut hello = json!({"name": "say-hello", "type": "action"});
        let mut other = json!({"name": "say-bye", "type": "action"});

        control.before_activity(&mut hello, &json!({})).await.unwrap();
        control.before_activity(&mut other, &json!({})).await.unwrap();
        assert_eq!(hello["dry"], json!(true));
        assert!(other.get("dry").is_none());
    }

    #[test]
    fn empty_arguments_match_nothing() {
        let control = BypassControl::from_arguments(&Value::Null).unwrap();
        assert!(!control.matches(&json!({"name": "x", "type": "action"})));
    }

    #[test]
    fn rejects_malformed_arguments() {
        let err = BypassControl::from_arguments(&json!({"target_names": "not-a-list"})).unwrap_err();
        assert_eq!(err.as_label(), "control_invalid_arguments");
    }
}
