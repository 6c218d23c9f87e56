//! # Execute one probe and record its run.
//!
//! Wraps the [`ActivityRunner`] call with the bookkeeping of a [`Run`]:
//! timestamps, duration, status and failure detail.
//!
//! ## Flow
//! ```text
//! pause before (optional, cancellable)
//!   → start = now
//!   → runner.run(experiment, activity, ctx)
//!        ├─ Ok(output)        → Run { status: succeeded, output }
//!        ├─ Err(Failed{..})   → Run { status: failed, exception }
//!        └─ Err(Fault{..})    → Err(fault)   (no run)
//!   → end = now
//! pause after (optional, cancellable)
//! ```
//!
//! ## Rules
//! - A reported failure is a normal run; it is checked against the tolerance.
//! - No timeout is imposed on the runner: a probe that never returns keeps its
//!   safeguard alive, and `terminate` waits for it.

use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::activity::{ActivityRunner, ExecutionContext};
use crate::error::ActivityError;
use crate::idle::idle_for;
use crate::probes::{Probe, Run, RunStatus};

/// Executes `activity` once and returns its run record.
///
/// When `pauses` is set, `pauses.before/after` of the activity are observed
/// and cut short if the token is cancelled.
pub(crate) async fn execute_probe(
    runner: &dyn ActivityRunner,
    experiment: &Value,
    activity: &Probe,
    ctx: &ExecutionContext,
    pauses: Option<&CancellationToken>,
) -> Result<Run, ActivityError> {
    if let (Some(token), Some(before)) = (pauses, activity.pause_before()) {
        idle_for(before, token).await;
    }

    let start = Utc::now();
    let clock = Instant::now();
    let res = runner.run(experiment, activity, ctx).await;
    let duration = clock.elapsed();
    let end = Utc::now();

    let (status, output, exception) = match res {
        Ok(output) => (RunStatus::Succeeded, Some(output), None),
        Err(ActivityError::Failed { reason }) => (RunStatus::Failed, None, Some(reason)),
        Err(fault) => return Err(fault),
    };

    if let (Some(token), Some(after)) = (pauses, activity.pause_after()) {
        idle_for(after, token).await;
    }

    Ok(Run {
        activity: activity.clone(),
        output,
        status,
        exception,
        start,
        end,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::RunnerFn;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn successful_run_keeps_output() {
        let runner = RunnerFn::new(|_p: Probe| async { Ok::<_, ActivityError>(json!({"pods": 3})) });
        let probe = Probe::new("pods").with_tolerance(true);
        let run = execute_probe(&runner, &Value::Null, &probe, &ExecutionContext::default(), None)
            .await
            .unwrap();
        assert!(run.succeeded());
        assert_eq!(run.output, Some(json!({"pods": 3})));
        assert!(run.end >= run.start);
        assert_eq!(run.activity.name.as_deref(), Some("pods"));
    }

    #[tokio::test]
    async fn reported_failure_becomes_failed_run() {
        let runner = RunnerFn::new(|_p: Probe| async { Err::<Value, _>(ActivityError::failed("503")) });
        let probe = Probe::new("http").with_tolerance(200);
        let run = execute_probe(&runner, &Value::Null, &probe, &ExecutionContext::default(), None)
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.output, None);
        assert_eq!(run.exception.as_deref(), Some("503"));
    }

    #[tokio::test]
    async fn fault_is_propagated() {
        let runner = RunnerFn::new(|_p: Probe| async { Err::<Value, _>(ActivityError::fault("no provider")) });
        let probe = Probe::new("broken").with_tolerance(true);
        let err = execute_probe(&runner, &Value::Null, &probe, &ExecutionContext::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "activity_fault");
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_are_observed_and_cut_short_on_cancel() {
        let runner = RunnerFn::new(|_p: Probe| async { Ok::<_, ActivityError>(json!(true)) });
        let mut probe = Probe::new("paused").with_tolerance(true);
        probe.pauses = Some(crate::probes::Pauses {
            before: Some(2.0),
            after: Some(600.0),
        });
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            canceller.cancel();
        });

        let start = tokio::time::Instant::now();
        let run = execute_probe(&runner, &Value::Null, &probe, &ExecutionContext::default(), Some(&token))
            .await
            .unwrap();
        assert!(run.succeeded());
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2));
        assert!(waited < Duration::from_secs(600));
    }
}
