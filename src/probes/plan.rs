//! # Validated, classified probe list.
//!
//! [`ProbePlan::build`] turns the declared probes into [`PlannedProbe`]s and
//! pre-computes [`ClassCounts`], which size the execution pools and the
//! completion barrier before anything is submitted.
//!
//! ## Rules
//! - Validation fails fast: nothing is scheduled for an invalid list.
//! - The declaration as written drives the class and the repeat interval.
//! - A `ref` is resolved through the [`ActivityLookup`]; the resolved activity
//!   is what runs, and its tolerance is used when the declaration has none.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::activity::ActivityLookup;
use crate::error::ValidationError;
use crate::probes::probe::{Probe, ProbeClass};

/// Number of probes per class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub blocking: usize,
    pub background_once: usize,
    pub repeating: usize,
}

impl ClassCounts {
    /// Counts the classes of a probe list. Total and disjoint by construction.
    pub fn of(probes: &[Probe]) -> Self {
        probes.iter().fold(Self::default(), |mut acc, p| {
            match p.class() {
                ProbeClass::Blocking => acc.blocking += 1,
                ProbeClass::BackgroundOnce => acc.background_once += 1,
                ProbeClass::Repeating => acc.repeating += 1,
            }
            acc
        })
    }

    /// Number of probes in `class`.
    pub fn get(&self, class: ProbeClass) -> usize {
        match class {
            ProbeClass::Blocking => self.blocking,
            ProbeClass::BackgroundOnce => self.background_once,
            ProbeClass::Repeating => self.repeating,
        }
    }

    /// Worker count of the pool for `class`; never zero so an empty pool still exists.
    pub fn pool_size(&self, class: ProbeClass) -> usize {
        self.get(class).max(1)
    }

    /// Parties of the completion barrier: every blocking probe plus the caller.
    pub fn barrier_parties(&self) -> usize {
        self.blocking + 1
    }

    pub fn total(&self) -> usize {
        self.blocking + self.background_once + self.repeating
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocking={} background_once={} repeating={}",
            self.blocking, self.background_once, self.repeating
        )
    }
}

/// A probe ready to be submitted.
#[derive(Clone, Debug)]
pub struct PlannedProbe {
    /// Name used for logs and events.
    pub name: Arc<str>,
    /// Scheduling class, derived from the declaration.
    pub class: ProbeClass,
    /// Repeat interval (only for [`ProbeClass::Repeating`]).
    pub interval: Option<Duration>,
    /// Tolerance the run output is checked against.
    pub tolerance: Value,
    /// The activity to execute (the resolved one for `ref` probes).
    pub activity: Arc<Probe>,
}

/// Validated probe list with its class counts.
#[derive(Clone, Debug, Default)]
pub struct ProbePlan {
    probes: Vec<PlannedProbe>,
    counts: ClassCounts,
}

impl ProbePlan {
    /// Validates and classifies `probes`.
    ///
    /// ### Errors
    /// - [`ValidationError::MissingName`] no `name` and no `ref`
    /// - [`ValidationError::DuplicateName`] name used twice
    /// - [`ValidationError::InvalidFrequency`] frequency not a positive finite number
    /// - [`ValidationError::UnresolvedRef`] the lookup does not know the `ref`
    /// - [`ValidationError::MissingTolerance`] no tolerance on the declaration nor the resolved activity
    pub fn build(probes: &[Probe], lookup: &dyn ActivityLookup) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(probes.len());
        let mut planned = Vec::with_capacity(probes.len());

        for (index, declared) in probes.iter().enumerate() {
            let name = match declared.name.as_deref().or(declared.reference.as_deref()) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => return Err(ValidationError::MissingName { index }),
            };
            if !seen.insert(name.clone()) {
                return Err(ValidationError::DuplicateName { probe: name });
            }

            let class = declared.class();
            let interval = match declared.frequency {
                Some(value) => match declared.interval() {
                    Some(d) => Some(d),
                    None => return Err(ValidationError::InvalidFrequency { probe: name, value }),
                },
                None => None,
            };

            let activity = match declared.reference.as_deref() {
                Some(reference) => match lookup.lookup(reference) {
                    Some(resolved) => resolved,
                    None => {
                        return Err(ValidationError::UnresolvedRef {
                            probe: name,
                            reference: reference.to_string(),
                        });
                    }
                },
                None => declared.clone(),
            };

            let tolerance = match declared.tolerance.as_ref().or(activity.tolerance.as_ref()) {
                Some(t) => t.clone(),
                None => return Err(ValidationError::MissingTolerance { probe: name }),
            };

            planned.push(PlannedProbe {
                name: name.into(),
                class,
                interval,
                tolerance,
                activity: Arc::new(activity),
            });
        }

        Ok(Self {
            counts: ClassCounts::of(probes),
            probes: planned,
        })
    }

    pub fn counts(&self) -> ClassCounts {
        self.counts
    }

    pub fn probes(&self) -> &[PlannedProbe] {
        &self.probes
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl IntoIterator for ProbePlan {
    type Item = PlannedProbe;
    type IntoIter = std::vec::IntoIter<PlannedProbe>;

    fn into_iter(self) -> Self::IntoIter {
        self.probes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityCatalog, NoLookup};
    use serde_json::json;

    fn probes(raw: Value) -> Vec<Probe> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn counts_partition_the_list() {
        let list = probes(json!([
            {"name": "a", "tolerance": true},
            {"name": "b", "tolerance": true, "background": true},
            {"name": "c", "tolerance": true, "frequency": 1},
            {"name": "d", "tolerance": true, "frequency": 1, "background": true},
            {"name": "e", "tolerance": true, "background": false}
        ]));
        let plan = ProbePlan::build(&list, &NoLookup).unwrap();
        let counts = plan.counts();
        assert_eq!(counts.blocking, 2);
        assert_eq!(counts.background_once, 1);
        assert_eq!(counts.repeating, 2);
        assert_eq!(counts.total(), list.len());
        assert_eq!(counts.barrier_parties(), 3);
    }

    #[test]
    fn empty_classes_still_get_one_worker() {
        let counts = ClassCounts::default();
        for class in ProbeClass::ALL {
            assert_eq!(counts.pool_size(class), 1);
        }
        assert_eq!(counts.barrier_parties(), 1);
    }

    #[test]
    fn rejects_missing_name() {
        let list = probes(json!([{"name": "ok", "tolerance": 1}, {"tolerance": 1}]));
        assert_eq!(
            ProbePlan::build(&list, &NoLookup).unwrap_err(),
            ValidationError::MissingName { index: 1 }
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let list = probes(json!([{"name": "x", "tolerance": 1}, {"name": "x", "tolerance": 2}]));
        assert!(matches!(
            ProbePlan::build(&list, &NoLookup),
            Err(ValidationError::DuplicateName { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_frequency() {
        let list = probes(json!([{"name": "z", "tolerance": 1, "frequency": 0}]));
        assert_eq!(
            ProbePlan::build(&list, &NoLookup).unwrap_err(),
            ValidationError::InvalidFrequency {
                probe: "z".into(),
                value: 0.0
            }
        );
    }

    #[test]
    fn rejects_missing_tolerance() {
        let list = probes(json!([{"name": "t"}]));
        assert!(matches!(
            ProbePlan::build(&list, &NoLookup),
            Err(ValidationError::MissingTolerance { .. })
        ));
    }

    #[test]
    fn unresolved_ref_fails_fast() {
        let list = vec![Probe::referencing("nowhere")];
        assert_eq!(
            ProbePlan::build(&list, &NoLookup).unwrap_err(),
            ValidationError::UnresolvedRef {
                probe: "nowhere".into(),
                reference: "nowhere".into()
            }
        );
    }

    #[test]
    fn ref_runs_resolved_activity_but_keeps_declared_schedule() {
        let catalog = ActivityCatalog::new().with(
            Probe::new("pods-ready")
                .with_tolerance(true)
                .every(Duration::from_secs(60)),
        );
        let list = vec![Probe::referencing("pods-ready").in_background()];
        let plan = ProbePlan::build(&list, &catalog).unwrap();
        let p = &plan.probes()[0];
        assert_eq!(p.class, ProbeClass::BackgroundOnce);
        assert_eq!(p.interval, None);
        assert_eq!(p.tolerance, json!(true));
        assert_eq!(p.activity.name.as_deref(), Some("pods-ready"));
    }
}
