//! Chart dependency declaration and condition resolver
//!
//! Each chart declares its dependencies as a [`ChartDependency`] list.
//! Conditions are dotted paths into the parent chart's values; a path
//! that does not resolve counts as enabled. That open-by-default policy
//! is intentional: a dependency is opted out of, never opted into.

use bow_core::{is_truthy, Values};

/// A chart's dependency on another chart
#[derive(Debug, Clone)]
pub struct ChartDependency {
    /// Registry name of the dependency chart
    pub chart: String,
    /// When false the dependency is declared but never deployed
    pub deploy: bool,
    /// Dotted path into the parent's values gating deployment
    pub condition: Option<String>,
    /// Defaults merged beneath the parent's values for this dependency
    pub default_values: Values,
}

impl ChartDependency {
    pub fn new(chart: impl Into<String>) -> Self {
        Self {
            chart: chart.into(),
            deploy: true,
            condition: None,
            default_values: Values::new(),
        }
    }

    pub fn deploy(mut self, deploy: bool) -> Self {
        self.deploy = deploy;
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn default_values(mut self, values: Values) -> Self {
        self.default_values = values;
        self
    }
}

/// Evaluate a dependency condition against the parent's values.
/// A missing path defaults to true.
pub fn resolve_condition(values: &Values, condition: Option<&str>) -> bool {
    match condition {
        None => true,
        Some(path) => match values.get(path) {
            Some(value) => is_truthy(value),
            None => true,
        },
    }
}

/// Compute the values handed to a dependency chart: the declared
/// defaults, overlaid with the parent's nested mapping under the
/// dependency's chart key (when present and a mapping).
pub fn dependency_values(values: &Values, dep: &ChartDependency) -> Values {
    let mut result = dep.default_values.clone();
    if let Some(overlay) = values.get(&dep.chart) {
        if overlay.is_object() {
            result.merge(&Values(overlay.clone()));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_follows_the_values_tree() {
        let values = Values(json!({"postgresql": {"enabled": true}}));
        assert!(resolve_condition(&values, Some("postgresql.enabled")));

        let values = Values(json!({"postgresql": {"enabled": false}}));
        assert!(!resolve_condition(&values, Some("postgresql.enabled")));
    }

    #[test]
    fn missing_condition_path_defaults_to_enabled() {
        let values = Values(json!({}));
        assert!(resolve_condition(&values, Some("postgresql.enabled")));
        assert!(resolve_condition(&values, None));
    }

    #[test]
    fn dependency_values_merge_parent_overlay() {
        let dep = ChartDependency::new("postgresql")
            .default_values(Values(json!({"name": "app-db", "storage": "20Gi"})));
        let values = Values(json!({"postgresql": {"storage": "100Gi"}}));

        let resolved = dependency_values(&values, &dep);
        assert_eq!(resolved.get("name").unwrap(), "app-db");
        assert_eq!(resolved.get("storage").unwrap(), "100Gi");
    }

    #[test]
    fn non_mapping_overlay_is_ignored() {
        let dep = ChartDependency::new("redis")
            .default_values(Values(json!({"storage": "5Gi"})));
        let values = Values(json!({"redis": "external"}));

        let resolved = dependency_values(&values, &dep);
        assert_eq!(resolved.get("storage").unwrap(), "5Gi");
    }
}
