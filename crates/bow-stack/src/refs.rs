//! Component reference resolver
//!
//! Stack components reference each other with `${component.field}`
//! inside string values. Supported fields:
//!
//!   `${db.host}`          -> component name (the implied Service DNS name)
//!   `${db.name}`          -> component name
//!   `${db.port}`          -> the component's `values.service.port`, else a
//!                            per-chart default
//!   `${db.values.<path>}` -> nested lookup in the component's own values
//!
//! Substitution is textual and single-pass: `values.<path>` lookups read
//! the referenced component's pre-resolution values, so references never
//! chain through other references and no cycle detection is needed.

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;

use crate::error::{Result, StackError};
use crate::parser::ComponentSpec;

const REF_PATTERN: &str = r"\$\{([a-zA-Z0-9_-]+)\.([a-zA-Z0-9_.]+)\}";

/// Resolve all references in all components, returning a new list.
/// Lookups read the original (pre-resolution) component values.
pub fn resolve_refs(components: &[ComponentSpec]) -> Result<Vec<ComponentSpec>> {
    let lookup: HashMap<&str, &ComponentSpec> =
        components.iter().map(|c| (c.name.as_str(), c)).collect();
    let pattern = Regex::new(REF_PATTERN)
        .map_err(|e| StackError::Ref(format!("invalid reference pattern: {e}")))?;

    components
        .iter()
        .map(|comp| {
            let resolved = resolve_value(comp.values.inner(), &lookup, &pattern)?;
            Ok(ComponentSpec {
                chart: comp.chart.clone(),
                name: comp.name.clone(),
                values: bow_core::Values(resolved),
            })
        })
        .collect()
}

fn resolve_value(
    value: &Value,
    lookup: &HashMap<&str, &ComponentSpec>,
    pattern: &Regex,
) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(resolve_string(s, lookup, pattern)?)),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), resolve_value(item, lookup, pattern)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, lookup, pattern))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn resolve_string(
    value: &str,
    lookup: &HashMap<&str, &ComponentSpec>,
    pattern: &Regex,
) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut last_end = 0;

    for captures in pattern.captures_iter(value) {
        // Capture group 0 always exists and groups 1/2 are non-optional
        let whole = match captures.get(0) {
            Some(m) => m,
            None => continue,
        };
        let comp_name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let field_path = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

        let comp = lookup.get(comp_name).ok_or_else(|| {
            let mut available: Vec<&str> = lookup.keys().copied().collect();
            available.sort_unstable();
            StackError::Ref(format!(
                "unknown component reference: '${{{comp_name}.{field_path}}}'. \
                 Available components: {}",
                available.join(", ")
            ))
        })?;

        out.push_str(&value[last_end..whole.start()]);
        out.push_str(&get_field(comp, field_path)?);
        last_end = whole.end();
    }

    out.push_str(&value[last_end..]);
    Ok(out)
}

fn get_field(comp: &ComponentSpec, field_path: &str) -> Result<String> {
    let (field, rest) = match field_path.split_once('.') {
        Some((field, rest)) => (field, Some(rest)),
        None => (field_path, None),
    };

    match (field, rest) {
        ("host", None) | ("name", None) => Ok(comp.name.clone()),
        ("port", None) => Ok(component_port(comp)),
        ("values", Some(path)) => {
            let value = comp.values.get(path).ok_or_else(|| {
                StackError::Ref(format!(
                    "key not found in values of component '{}': '{path}'",
                    comp.name
                ))
            })?;
            Ok(scalar_text(value))
        }
        _ => Err(StackError::Ref(format!(
            "unknown field '{field_path}' for component '{}'. \
             Supported: host, port, name, values.<key>",
            comp.name
        ))),
    }
}

/// `values.service.port` when set, else the chart's well-known default
fn component_port(comp: &ComponentSpec) -> String {
    if let Some(port) = comp.values.get("service.port") {
        return scalar_text(port);
    }
    let default = match comp.chart.as_str() {
        "postgresql" => 5432,
        "redis" => 6379,
        "mysql" => 3306,
        "mongodb" => 27017,
        _ => 80,
    };
    default.to_string()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bow_core::Values;
    use serde_json::json;

    fn component(chart: &str, name: &str, values: Value) -> ComponentSpec {
        ComponentSpec {
            chart: chart.to_string(),
            name: name.to_string(),
            values: Values(values),
        }
    }

    #[test]
    fn url_with_host_port_and_values_lookup() {
        let components = vec![
            component(
                "postgresql",
                "db",
                json!({"database": "myapp", "service": {"port": 5432}}),
            ),
            component(
                "myapp",
                "api",
                json!({"url": "postgresql://${db.host}:${db.port}/${db.values.database}"}),
            ),
        ];

        let resolved = resolve_refs(&components).unwrap();
        assert_eq!(
            resolved[1].values.get("url").unwrap(),
            "postgresql://db:5432/myapp"
        );
    }

    #[test]
    fn port_falls_back_to_chart_defaults() {
        let components = vec![
            component("redis", "cache", json!({})),
            component("mysterydb", "other", json!({})),
            component(
                "app",
                "api",
                json!({"cache": "${cache.port}", "other": "${other.port}"}),
            ),
        ];

        let resolved = resolve_refs(&components).unwrap();
        assert_eq!(resolved[2].values.get("cache").unwrap(), "6379");
        assert_eq!(resolved[2].values.get("other").unwrap(), "80");
    }

    #[test]
    fn unknown_component_names_the_expression_and_candidates() {
        let components = vec![
            component("redis", "cache", json!({})),
            component("app", "api", json!({"x": "${db.host}"})),
        ];

        let err = resolve_refs(&components).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'${db.host}'"));
        assert!(message.contains("api"));
        assert!(message.contains("cache"));
    }

    #[test]
    fn unknown_field_is_fatal() {
        let components = vec![
            component("redis", "cache", json!({})),
            component("app", "api", json!({"x": "${cache.password}"})),
        ];

        let err = resolve_refs(&components).unwrap_err();
        assert!(err.to_string().contains("unknown field 'password'"));
    }

    #[test]
    fn missing_values_key_is_fatal() {
        let components = vec![
            component("redis", "cache", json!({})),
            component("app", "api", json!({"x": "${cache.values.auth.user}"})),
        ];

        let err = resolve_refs(&components).unwrap_err();
        assert!(err.to_string().contains("'auth.user'"));
    }

    #[test]
    fn resolution_is_single_pass_not_transitive() {
        // b's values contain a reference to c; a reading b.values.url gets
        // the raw text, not c's resolution
        let components = vec![
            component("app", "c", json!({})),
            component("app", "b", json!({"url": "http://${c.host}/"})),
            component("app", "a", json!({"upstream": "${b.values.url}"})),
        ];

        let resolved = resolve_refs(&components).unwrap();
        assert_eq!(resolved[2].values.get("upstream").unwrap(), "http://${c.host}/");
        // b itself still resolves its own reference
        assert_eq!(resolved[1].values.get("url").unwrap(), "http://c/");
    }

    #[test]
    fn references_resolve_inside_sequences_and_nested_mappings() {
        let components = vec![
            component("postgresql", "db", json!({})),
            component(
                "app",
                "api",
                json!({"env": [{"name": "DB", "value": "${db.host}"}]}),
            ),
        ];

        let resolved = resolve_refs(&components).unwrap();
        assert_eq!(resolved[1].values.get("env").unwrap()[0]["value"], "db");
    }
}
