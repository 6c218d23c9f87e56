//! Error types used by the guardian runtime, probe validation and activity execution.
//!
//! - [`GuardError`] lifecycle misuse of the [`Guardian`](crate::Guardian).
//! - [`ValidationError`] malformed probe declarations, raised before any work is scheduled.
//! - [`ActivityError`] returned by an [`ActivityRunner`](crate::ActivityRunner).
//!
//! All types provide `as_label` for stable snake_case labels in logs.

use thiserror::Error;

/// # Errors produced by the guardian lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GuardError {
    /// `run` was called before `prepare` (or after `terminate`).
    #[error("guardian is not prepared")]
    NotPrepared,

    /// `run` was called twice for the same `prepare`.
    #[error("guardian is already running")]
    AlreadyRunning,

    /// `prepare` was called while safeguards are still running.
    #[error("guardian is still running; terminate it before preparing again")]
    StillRunning,

    /// The probes passed to `run` do not classify like the ones given to `prepare`.
    #[error("probe plan changed since prepare: prepared {prepared}, got {got}")]
    PlanMismatch {
        /// Class counts computed in `prepare`.
        prepared: String,
        /// Class counts computed in `run`.
        got: String,
    },

    /// A probe declaration is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl GuardError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use chaos_safeguards::GuardError;
    ///
    /// assert_eq!(GuardError::NotPrepared.as_label(), "guard_not_prepared");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GuardError::NotPrepared => "guard_not_prepared",
            GuardError::AlreadyRunning => "guard_already_running",
            GuardError::StillRunning => "guard_still_running",
            GuardError::PlanMismatch { .. } => "guard_plan_mismatch",
            GuardError::Validation(e) => e.as_label(),
        }
    }
}

/// # Configuration errors in a probe list.
///
/// Raised by [`ProbePlan::build`](crate::ProbePlan::build), distinct from runtime probe failures.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// The probe at `index` has neither a `name` nor a `ref`.
    #[error("probe #{index} has no name")]
    MissingName {
        /// Position in the declared list.
        index: usize,
    },

    /// The probe declares no tolerance to check its output against.
    #[error("probe '{probe}' has no tolerance")]
    MissingTolerance {
        /// Probe name.
        probe: String,
    },

    /// Two probes share the same name.
    #[error("probe name '{probe}' is declared more than once")]
    DuplicateName {
        /// Probe name.
        probe: String,
    },

    /// `frequency` must be a positive, finite number of seconds.
    #[error("probe '{probe}' has an invalid frequency: {value}")]
    InvalidFrequency {
        /// Probe name.
        probe: String,
        /// Declared value.
        value: f64,
    },

    /// `ref` names an activity the lookup does not know.
    #[error("could not find referenced activity '{reference}' for probe '{probe}'")]
    UnresolvedRef {
        /// Probe name.
        probe: String,
        /// The unresolved reference.
        reference: String,
    },

    /// The control arguments could not be decoded.
    #[error("invalid control arguments: {reason}")]
    InvalidArguments {
        /// Decoder message.
        reason: String,
    },
}

impl ValidationError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidationError::MissingName { .. } => "probe_missing_name",
            ValidationError::MissingTolerance { .. } => "probe_missing_tolerance",
            ValidationError::DuplicateName { .. } => "probe_duplicate_name",
            ValidationError::InvalidFrequency { .. } => "probe_invalid_frequency",
            ValidationError::UnresolvedRef { .. } => "probe_unresolved_ref",
            ValidationError::InvalidArguments { .. } => "control_invalid_arguments",
        }
    }
}

/// # Errors produced by activity execution.
///
/// `Failed` means the probed system did not behave as expected: the guardian
/// records a `failed` [`Run`](crate::Run) and still checks its tolerance.
/// `Fault` is anything else; it ends the safeguard without a run.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ActivityError {
    /// The activity ran and reported a failure.
    #[error("activity failed: {reason}")]
    Failed {
        /// The underlying failure message.
        reason: String,
    },

    /// The activity could not be executed at all.
    #[error("activity fault: {reason}")]
    Fault {
        /// The underlying error message.
        reason: String,
    },
}

impl ActivityError {
    /// Shorthand for [`ActivityError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        ActivityError::Failed {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ActivityError::Fault`].
    pub fn fault(reason: impl Into<String>) -> Self {
        ActivityError::Fault {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use chaos_safeguards::ActivityError;
    ///
    /// assert_eq!(ActivityError::failed("boom").as_label(), "activity_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivityError::Failed { .. } => "activity_failed",
            ActivityError::Fault { .. } => "activity_fault",
        }
    }

    /// Whether the error is a reported failure that still produces a run.
    pub fn is_reported(&self) -> bool {
        matches!(self, ActivityError::Failed { .. })
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_labels_flow_through_guard_error() {
        let err: GuardError = ValidationError::MissingName { index: 2 }.into();
        assert_eq!(err.as_label(), "probe_missing_name");
        assert_eq!(err.to_string(), "probe #2 has no name");
    }

    #[test]
    fn only_failed_is_reported() {
        assert!(ActivityError::failed("x").is_reported());
        assert!(!ActivityError::fault("x").is_reported());
    }
}
