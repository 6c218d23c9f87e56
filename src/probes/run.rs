//! # Run record of one probe execution.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::probes::probe::Probe;

static NULL: Value = Value::Null;

/// Outcome of an execution, as reported by the activity runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }
}

/// One execution of a probe.
///
/// Produced once for blocking and background probes, once per tick for
/// repeating ones; checked against the tolerance, then dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Run {
    /// Snapshot of the executed activity.
    pub activity: Probe,
    /// Value returned by the activity (`None` when it failed).
    pub output: Option<Value>,
    pub status: RunStatus,
    /// Failure detail for `failed` runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: Duration,
}

impl Run {
    /// Output as a JSON value, `null` when absent.
    pub fn output_value(&self) -> &Value {
        self.output.as_ref().unwrap_or(&NULL)
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}
