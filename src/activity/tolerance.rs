//! # Tolerance evaluation seam.
//!
//! [`StaticTolerance`] handles tolerances that are plain values:
//!
//! ```text
//! true / false           → output must be that boolean
//! number / string / null → output must be equal (numbers compared as f64)
//! [a, b, ...]            → output must be one of the items
//! {"type": "range",
//!  "range": [lo, hi]}    → lo <= output <= hi
//! ```
//!
//! Anything else (probes as tolerances, jsonpath, regex) belongs to the host
//! and is rejected here.

use async_trait::async_trait;
use serde_json::Value;

use crate::activity::ExecutionContext;

/// Decides whether a run output is within a probe's tolerance.
#[async_trait]
pub trait ToleranceEvaluator: Send + Sync + 'static {
    async fn within_tolerance(&self, tolerance: &Value, output: &Value, ctx: &ExecutionContext)
    -> bool;
}

#[async_trait]
impl<F> ToleranceEvaluator for F
where
    F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
{
    async fn within_tolerance(
        &self,
        tolerance: &Value,
        output: &Value,
        _ctx: &ExecutionContext,
    ) -> bool {
        self(tolerance, output)
    }
}

/// Evaluator for value, list and range tolerances.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticTolerance;

impl StaticTolerance {
    /// Synchronous check shared by the trait implementation.
    pub fn check(tolerance: &Value, output: &Value) -> bool {
        match tolerance {
            Value::Array(items) => items.iter().any(|t| scalar_eq(t, output)),
            Value::Object(spec) => match spec.get("type").and_then(Value::as_str) {
                Some("range") => within_range(spec.get("range"), output),
                other => {
                    tracing::warn!(kind = ?other, "unsupported tolerance type");
                    false
                }
            },
            _ => scalar_eq(tolerance, output),
        }
    }
}

#[async_trait]
impl ToleranceEvaluator for StaticTolerance {
    async fn within_tolerance(
        &self,
        tolerance: &Value,
        output: &Value,
        _ctx: &ExecutionContext,
    ) -> bool {
        Self::check(tolerance, output)
    }
}

fn scalar_eq(expected: &Value, actual: &Value) -> bool {
    match (expected.as_f64(), actual.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => expected == actual,
    }
}

fn within_range(range: Option<&Value>, output: &Value) -> bool {
    let bounds = range.and_then(Value::as_array).and_then(|r| match r.as_slice() {
        [lo, hi] => Some((lo.as_f64()?, hi.as_f64()?)),
        _ => None,
    });
    match (bounds, output.as_f64()) {
        (Some((lo, hi)), Some(v)) => lo <= v && v <= hi,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_and_scalars() {
        assert!(StaticTolerance::check(&json!(true), &json!(true)));
        assert!(!StaticTolerance::check(&json!(true), &json!(false)));
        assert!(StaticTolerance::check(&json!(200), &json!(200.0)));
        assert!(!StaticTolerance::check(&json!("ok"), &json!("ko")));
        assert!(!StaticTolerance::check(&json!(true), &Value::Null));
    }

    #[test]
    fn lists_accept_any_member() {
        let t = json!([200, 204]);
        assert!(StaticTolerance::check(&t, &json!(204)));
        assert!(!StaticTolerance::check(&t, &json!(500)));
    }

    #[test]
    fn ranges_are_inclusive() {
        let t = json!({"type": "range", "range": [0, 10]});
        assert!(StaticTolerance::check(&t, &json!(0)));
        assert!(StaticTolerance::check(&t, &json!(10)));
        assert!(!StaticTolerance::check(&t, &json!(10.5)));
        assert!(!StaticTolerance::check(&t, &json!("5")));
    }

    #[test]
    fn unknown_object_tolerance_is_rejected() {
        let t = json!({"type": "jsonpath", "path": "$.x"});
        assert!(!StaticTolerance::check(&t, &json!({"x": 1})));
    }

    #[tokio::test]
    async fn closures_are_evaluators() {
        let even = |_t: &Value, v: &Value| v.as_i64().is_some_and(|n| n % 2 == 0);
        let ctx = ExecutionContext::default();
        assert!(even.within_tolerance(&Value::Null, &json!(4), &ctx).await);
        assert!(!even.within_tolerance(&Value::Null, &json!(3), &ctx).await);
    }
}
