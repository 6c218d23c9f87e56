//! # Resolution of `ref` probes.
//!
//! Experiments may declare an activity once and reference it by name.
//! [`ActivityCatalog::from_experiment`] indexes the named activities of the
//! steady-state hypothesis, the method and the rollbacks.

use std::collections::HashMap;

use serde_json::Value;

use crate::probes::Probe;

/// Resolves an activity by name.
pub trait ActivityLookup: Send + Sync + 'static {
    fn lookup(&self, reference: &str) -> Option<Probe>;
}

/// Lookup that knows no activity; every `ref` is unresolved.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLookup;

impl ActivityLookup for NoLookup {
    fn lookup(&self, _reference: &str) -> Option<Probe> {
        None
    }
}

/// In-memory activity index.
#[derive(Clone, Debug, Default)]
pub struct ActivityCatalog {
    activities: HashMap<String, Probe>,
}

impl ActivityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog with `activity` added under its name.
    pub fn with(mut self, activity: Probe) -> Self {
        self.insert(activity);
        self
    }

    /// Adds `activity` under its name; unnamed activities are ignored.
    pub fn insert(&mut self, activity: Probe) {
        if let Some(name) = activity.name.clone() {
            self.activities.insert(name, activity);
        }
    }

    /// Indexes every named, non-reference activity of an experiment document.
    ///
    /// Later declarations win, like a rollback redefining a method action.
    pub fn from_experiment(experiment: &Value) -> Self {
        let hypothesis = experiment
            .get("steady-state-hypothesis")
            .and_then(|h| h.get("probes"));
        let sections = [hypothesis, experiment.get("method"), experiment.get("rollbacks")];

        let mut catalog = Self::new();
        for items in sections.into_iter().flatten().filter_map(Value::as_array) {
            for item in items {
                if item.get("ref").is_some() {
                    continue;
                }
                if let Ok(activity) = serde_json::from_value::<Probe>(item.clone()) {
                    catalog.insert(activity);
                }
            }
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl ActivityLookup for ActivityCatalog {
    fn lookup(&self, reference: &str) -> Option<Probe> {
        self.activities.get(reference).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indexes_named_activities_of_every_section() {
        let experiment = json!({
            "steady-state-hypothesis": {
                "title": "up",
                "probes": [{"name": "app-up", "type": "probe", "tolerance": 200}]
            },
            "method": [
                {"name": "kill-pod", "type": "action"},
                {"ref": "app-up"}
            ],
            "rollbacks": [{"name": "restore", "type": "action"}]
        });
        let catalog = ActivityCatalog::from_experiment(&experiment);
        assert_eq!(catalog.len(), 3);
        let resolved = catalog.lookup("app-up").unwrap();
        assert_eq!(resolved.tolerance, Some(json!(200)));
        assert!(catalog.lookup("missing").is_none());
    }

    #[test]
    fn no_lookup_never_resolves() {
        assert!(NoLookup.lookup("anything").is_none());
    }
}
