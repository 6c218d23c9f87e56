//! # Probe declaration and scheduling class.
//!
//! A [`Probe`] is read from the safeguard control arguments and never mutated
//! by the guardian. Its [`ProbeClass`] is derived, not stored:
//!
//! ```text
//! frequency set          → Repeating       (frequency wins over background)
//! else background truthy → BackgroundOnce
//! else                   → Blocking
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use chaos_safeguards::{Probe, ProbeClass};
//!
//! let p = Probe::new("latency").every(Duration::from_secs(2)).in_background();
//! assert_eq!(p.class(), ProbeClass::Repeating);
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Optional pauses around the execution of an activity, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pauses {
    /// Pause before the activity starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<f64>,
    /// Pause after the activity ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<f64>,
}

/// A declared safeguard probe.
///
/// Unknown keys are kept in [`Probe::extra`] so the declaration round-trips
/// to the activity runner untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Unique name within the probe set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Activity type (usually `"probe"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Opaque tolerance handed to the [`ToleranceEvaluator`](crate::ToleranceEvaluator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Value>,
    /// Run once, without blocking the experiment start.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub background: bool,
    /// Run repeatedly, every `frequency` seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    /// Name of an activity defined elsewhere in the experiment.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Provider block, interpreted by the activity runner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Value>,
    /// Pauses around execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pauses: Option<Pauses>,
    /// Any other keys of the declaration.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Probe {
    /// Creates a blocking probe of type `"probe"` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some("probe".to_string()),
            ..Self::default()
        }
    }

    /// Creates a probe that points at an activity defined elsewhere.
    pub fn referencing(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// Returns the probe with the given tolerance.
    pub fn with_tolerance(mut self, tolerance: impl Into<Value>) -> Self {
        self.tolerance = Some(tolerance.into());
        self
    }

    /// Returns the probe with the given provider block.
    pub fn with_provider(mut self, provider: Value) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Returns the probe flagged to run once in the background.
    pub fn in_background(mut self) -> Self {
        self.background = true;
        self
    }

    /// Returns the probe scheduled to repeat every `interval`.
    pub fn every(mut self, interval: Duration) -> Self {
        self.frequency = Some(interval.as_secs_f64());
        self
    }

    /// Name used in logs: the declared name, else the reference.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.reference.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Scheduling class of this declaration.
    pub fn class(&self) -> ProbeClass {
        ProbeClass::of(self)
    }

    /// Repeat interval, if `frequency` is a positive finite number.
    pub fn interval(&self) -> Option<Duration> {
        self.frequency.and_then(seconds)
    }

    /// Pause to observe before execution.
    pub fn pause_before(&self) -> Option<Duration> {
        self.pauses.and_then(|p| p.before).and_then(seconds)
    }

    /// Pause to observe after execution.
    pub fn pause_after(&self) -> Option<Duration> {
        self.pauses.and_then(|p| p.after).and_then(seconds)
    }
}

fn seconds(value: f64) -> Option<Duration> {
    if value.is_finite() && value > 0.0 {
        Some(Duration::from_secs_f64(value))
    } else {
        None
    }
}

/// Scheduling discipline of a probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeClass {
    /// Runs once before the experiment starts; `run` waits for it.
    Blocking,
    /// Runs once, concurrently with the experiment.
    BackgroundOnce,
    /// Runs every `frequency` seconds until terminate.
    Repeating,
}

impl ProbeClass {
    /// All classes, in pool order.
    pub const ALL: [ProbeClass; 3] = [
        ProbeClass::Blocking,
        ProbeClass::BackgroundOnce,
        ProbeClass::Repeating,
    ];

    /// Classifies a declaration. `frequency` takes precedence over `background`.
    pub fn of(probe: &Probe) -> Self {
        if probe.frequency.is_some() {
            ProbeClass::Repeating
        } else if probe.background {
            ProbeClass::BackgroundOnce
        } else {
            ProbeClass::Blocking
        }
    }

    /// Short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeClass::Blocking => "blocking",
            ProbeClass::BackgroundOnce => "background_once",
            ProbeClass::Repeating => "repeating",
        }
    }
}

impl fmt::Display for ProbeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
