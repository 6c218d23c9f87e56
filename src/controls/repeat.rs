//! # Repeat control.
//!
//! Repeats an activity a number of times, the first call included, by
//! appending copies of it to the experiment after each execution.
//!
//! ```json
//! "arguments": {
//!     "repeat_count": 2,
//!     "break_if_previous_iteration_failed": true
//! }
//! ```
//!
//! Each copy carries an `iteration_index` (1 for the first repetition). The
//! copy is appended to every list among hypothesis probes, method and
//! rollbacks that holds an activity of the same name. No copy is appended once
//! `iteration_index` reaches `repeat_count - 1`; a `repeat_count` of 0 or 1
//! never repeats.
//!
//! `break_if_previous_iteration_failed` stops the repetitions as soon as an
//! iteration did not run to completion. It looks at the run status, not at the
//! activity output.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::controls::{Control, decode_arguments};
use crate::error::{GuardError, ValidationError};

const ITERATION_INDEX: &str = "iteration_index";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RepeatControl {
    #[serde(default)]
    pub repeat_count: u64,
    #[serde(default)]
    pub break_if_previous_iteration_failed: bool,
}

impl RepeatControl {
    pub fn new(repeat_count: u64) -> Self {
        Self {
            repeat_count,
            break_if_previous_iteration_failed: false,
        }
    }

    pub fn breaking_on_failure(mut self) -> Self {
        self.break_if_previous_iteration_failed = true;
        self
    }

    /// Builds the control from its JSON arguments.
    pub fn from_arguments(arguments: &Value) -> Result<Self, ValidationError> {
        decode_arguments(arguments)
    }

    /// Appends the next repetition of `activity` to `experiment`.
    ///
    /// Returns the number of lists a copy was appended to.
    pub fn repeat(&self, activity: &Value, experiment: &mut Value, state: &Value) -> usize {
        let Some(name) = activity.get("name").and_then(Value::as_str) else {
            return 0;
        };

        let status = state.get("status").and_then(Value::as_str);
        if self.break_if_previous_iteration_failed && status != Some("succeeded") {
            tracing::debug!(target: "chaos_safeguards", activity = name, "last iteration failed, stopping iterations");
            return 0;
        }

        let Some(next) = self.next_iteration(activity) else {
            return 0;
        };
        let mut copy = activity.clone();
        if let Some(obj) = copy.as_object_mut() {
            obj.insert(ITERATION_INDEX.to_string(), Value::from(next));
        }

        let mut appended = 0;
        for list in activity_lists(experiment) {
            let holds_it = list
                .iter()
                .any(|a| a.get("name").and_then(Value::as_str) == Some(name));
            if holds_it {
                list.push(copy.clone());
                appended += 1;
            }
        }
        appended
    }

    /// Index of the next repetition, or `None` once enough have been appended.
    fn next_iteration(&self, activity: &Value) -> Option<u64> {
        let last = self.repeat_count.saturating_sub(1);
        let next = match activity.get(ITERATION_INDEX).and_then(Value::as_u64) {
            Some(current) => current.saturating_add(1),
            None => 1,
        };
        (next <= last).then_some(next)
    }
}

/// Hypothesis probes, method and rollbacks, when present.
fn activity_lists(experiment: &mut Value) -> Vec<&mut Vec<Value>> {
    let Some(doc) = experiment.as_object_mut() else {
        return Vec::new();
    };

    let mut lists = Vec::with_capacity(3);
    let mut method = None;
    let mut rollbacks = None;
    let mut hypothesis = None;
    for (key, value) in doc.iter_mut() {
        match key.as_str() {
            "steady-state-hypothesis" => hypothesis = value.get_mut("probes").and_then(Value::as_array_mut),
            "method" => method = value.as_array_mut(),
            "rollbacks" => rollbacks = value.as_array_mut(),
            _ => {}
        }
    }
    lists.extend(hypothesis);
    lists.extend(method);
    lists.extend(rollbacks);
    lists
}

#[async_trait]
impl Control for RepeatControl {
    fn name(&self) -> &'static str {
        "repeat"
    }

    async fn after_activity(
        &self,
        activity: &mut Value,
        experiment: &mut Value,
        state: &Value,
    ) -> Result<(), GuardError> {
        self.repeat(activity, experiment, state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probe(name: &str, iterable: [u32; 2]) -> Value {
        json!({
            "name": name,
            "type": "probe",
            "provider": {
                "type": "python",
                "module": "builtins",
                "func": "sum",
                "arguments": {"iterable": iterable}
            }
        })
    }

    fn hypothesis_len(experiment: &Value) -> usize {
        experiment["steady-state-hypothesis"]["probes"].as_array().unwrap().len()
    }

    #[tokio::test]
    async fn repeats_in_hypothesis() {
        let mut a = probe("probe-B", [6, 7]);
        let mut experiment = json!({
            "title": "hello",
            "description": "n/a",
            "steady-state-hypothesis": {
                "title": "",
                "probes": [probe("probe-A", [2, 3]), a.clone()]
            }
        });
        let control = RepeatControl::from_arguments(&json!({"repeat_count": 2})).unwrap();
        assert_eq!(hypothesis_len(&experiment), 2);

        control.after_activity(&mut a, &mut experiment, &json!({})).await.unwrap();
        assert_eq!(hypothesis_len(&experiment), 3);

        control.after_activity(&mut a, &mut experiment, &json!({})).await.unwrap();
        assert_eq!(hypothesis_len(&experiment), 4);
        assert_eq!(experiment["steady-state-hypothesis"]["probes"][3]["iteration_index"], json!(1));
    }

    #[test]
    fn stops_at_the_last_iteration() {
        let control = RepeatControl::new(3);
        let mut experiment = json!({"method": [{"name": "say-hello", "type": "action"}]});

        let first = experiment["method"][0].clone();
        assert_eq!(control.repeat(&first, &mut experiment, &json!({"status": "succeeded"})), 1);

        let second = experiment["method"][1].clone();
        assert_eq!(second["iteration_index"], json!(1));
        assert_eq!(control.repeat(&second, &mut experiment, &json!({"status": "succeeded"})), 1);

        let third = experiment["method"][2].clone();
        assert_eq!(third["iteration_index"], json!(2));
        assert_eq!(control.repeat(&third, &mut experiment, &json!({"status": "succeeded"})), 0);
        assert_eq!(experiment["method"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn breaks_after_failed_iteration() {
        let control = RepeatControl::new(5).breaking_on_failure();
        let mut experiment = json!({"method": [{"name": "say-hello", "type": "action"}]});
        let activity = experiment["method"][0].clone();

        assert_eq!(control.repeat(&activity, &mut experiment, &json!({"status": "failed"})), 0);
        assert_eq!(control.repeat(&activity, &mut experiment, &json!({})), 0);
        assert_eq!(control.repeat(&activity, &mut experiment, &json!({"status": "succeeded"})), 1);
    }

    #[test]
    fn appends_to_every_list_holding_the_activity() {
        let control = RepeatControl::new(2);
        let activity = json!({"name": "restart", "type": "action"});
        let mut experiment = json!({
            "method": [activity.clone()],
            "rollbacks": [activity.clone(), {"name": "other", "type": "action"}]
        });

        assert_eq!(control.repeat(&activity, &mut experiment, &json!({})), 2);
        assert_eq!(experiment["method"].as_array().unwrap().len(), 2);
        assert_eq!(experiment["rollbacks"][2]["name"], json!("restart"));
    }

    #[test]
    fn single_count_never_repeats() {
        let control = RepeatControl::new(1);
        let activity = json!({"name": "once", "type": "action"});
        let mut experiment = json!({"method": [activity.clone()]});
        assert_eq!(control.repeat(&activity, &mut experiment, &json!({})), 0);
    }
}
