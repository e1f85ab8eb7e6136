//! Chart registry
//!
//! Charts are registered by name and resolved at render-dispatch time.
//! The builtin set covers the charts shipped with bow; hosts embedding
//! the engine register their own charts on top.

use std::collections::BTreeMap;

use crate::builtin;
use crate::chart::Chart;
use crate::error::{ChartError, Result};

const MAX_SUGGESTION_DISTANCE: usize = 2;

#[derive(Default)]
pub struct ChartRegistry {
    charts: BTreeMap<String, Box<dyn Chart>>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin charts
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(builtin::PostgresqlChart));
        registry.register(Box::new(builtin::RedisChart));
        registry.register(Box::new(builtin::RedmineChart));
        registry
    }

    /// Register a chart under its own name, replacing any previous
    /// registration for that name
    pub fn register(&mut self, chart: Box<dyn Chart>) {
        self.charts.insert(chart.name().to_string(), chart);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Chart> {
        self.charts
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| self.not_found(name))
    }

    /// Registered chart names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.charts.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Chart> {
        self.charts.values().map(|c| c.as_ref())
    }

    fn not_found(&self, name: &str) -> ChartError {
        let hint = match self.suggest(name) {
            Some(suggestion) => format!("Did you mean '{suggestion}'?"),
            None if self.charts.is_empty() => "No charts are registered".to_string(),
            None => format!("Registered charts: {}", self.names().join(", ")),
        };
        ChartError::NotFound {
            name: name.to_string(),
            hint,
        }
    }

    /// Closest registered name within the edit-distance cutoff
    fn suggest(&self, name: &str) -> Option<String> {
        self.charts
            .keys()
            .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
            .filter(|(distance, _)| *distance > 0 && *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }
}
