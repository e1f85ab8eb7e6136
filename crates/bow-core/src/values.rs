//! Values handling with deep merge support
//!
//! Value precedence follows the Helm convention:
//! chart defaults -> -f files (in order) -> --set overrides.
//! All dotted-path walking (condition checks, --set parsing, reference
//! lookups) goes through the getter/setter in this module.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    ///
    /// A missing file is a hard failure. A file whose top level is not a
    /// mapping yields empty values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::ValuesFileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        if value.is_object() {
            Ok(Self(value))
        } else {
            Ok(Self::new())
        }
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars and sequences: overlay replaces base
    /// - Mappings: recursive merge
    pub fn merge(&mut self, overlay: &Values) {
        merge_into(&mut self.0, &overlay.0);
    }

    /// Deep merge without mutating the receiver
    pub fn merged(&self, overlay: &Values) -> Values {
        Values(deep_merge(&self.0, &overlay.0))
    }

    /// Set a value by dotted path (e.g., "image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get a string at a dotted path, with a default
    pub fn get_str(&self, path: &str, default: &str) -> String {
        match self.get(path) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(other) if !other.is_null() && !other.is_object() && !other.is_array() => {
                other.to_string()
            }
            _ => default.to_string(),
        }
    }

    /// Get an integer at a dotted path, with a default
    pub fn get_i64(&self, path: &str, default: i64) -> i64 {
        self.get(path).and_then(JsonValue::as_i64).unwrap_or(default)
    }

    /// Get a boolean at a dotted path, with a default
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.get(path).and_then(JsonValue::as_bool).unwrap_or(default)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Deep merge two JSON values, leaving both inputs untouched
///
/// For each key in the overlay: if both sides hold mappings, recurse;
/// otherwise the overlay value replaces the base value wholly (a mapping
/// may be replaced by a scalar and vice versa).
pub fn deep_merge(base: &JsonValue, overlay: &JsonValue) -> JsonValue {
    let mut result = base.clone();
    merge_into(&mut result, overlay);
    result
}

fn merge_into(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge_into(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path, creating intermediate mappings as needed
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    if path.is_empty() {
        *value = new_value;
        return;
    }

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    let key = path[0];
    let remaining = &path[1..];

    if let JsonValue::Object(map) = value {
        if remaining.is_empty() {
            map.insert(key.to_string(), new_value);
        } else {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
            set_nested(entry, remaining, new_value);
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map
            .get(path[0])
            .and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}

/// Python-style truthiness, used for dependency condition checks
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

/// Parse --set arguments (key=value format) into a nested values tree
///
/// The key splits on dots; the value is coerced in a fixed order:
/// true/false (case-insensitive), null/none (case-insensitive), integer,
/// float, else string. A malformed entry aborts the whole parse.
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        let (key, raw) = arg
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidOverride { arg: arg.clone() })?;
        values.set(key, coerce_value(raw));
    }

    Ok(values)
}

fn coerce_value(raw: &str) -> JsonValue {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return JsonValue::Bool(true),
        "false" => return JsonValue::Bool(false),
        "null" | "none" => return JsonValue::Null,
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return JsonValue::Number(i.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return JsonValue::Number(n);
        }
    }
    JsonValue::String(raw.to_string())
}

/// Merge all value sources: defaults -> files (in order) -> --set overrides
pub fn merge_all<P: AsRef<Path>>(
    defaults: Values,
    value_files: &[P],
    set_args: &[String],
) -> Result<Values> {
    let mut result = defaults;
    for vf in value_files {
        let file_values = Values::from_file(vf)?;
        result.merge(&file_values);
    }
    if !set_args.is_empty() {
        let set_values = parse_set_values(set_args)?;
        result.merge(&set_values);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_nested() {
        let base = json!({"a": {"b": 1, "c": 2}});
        let overlay = json!({"a": {"b": 99}});
        assert_eq!(deep_merge(&base, &overlay), json!({"a": {"b": 99, "c": 2}}));
    }

    #[test]
    fn test_deep_merge_scalar_replaces_mapping() {
        let base = json!({"db": {"host": "x"}});
        let overlay = json!({"db": "external"});
        assert_eq!(deep_merge(&base, &overlay), json!({"db": "external"}));
    }

    #[test]
    fn test_deep_merge_does_not_mutate_inputs() {
        let base = json!({"image": {"tag": "1.0"}, "replicas": 1});
        let overlay = json!({"image": {"tag": "2.0"}});
        let base_before = base.clone();
        let overlay_before = overlay.clone();

        let first = deep_merge(&base, &overlay);
        let second = deep_merge(&base, &overlay);

        assert_eq!(base, base_before);
        assert_eq!(overlay, overlay_before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_precedence() {
        let mut base = Values::from_yaml("image:\n  repository: nginx\n  tag: '1.0'\nreplicas: 1\n").unwrap();
        let overlay = Values::from_yaml("image:\n  tag: '2.0'\n  pullPolicy: Always\nreplicas: 3\n").unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_set_nested_path() {
        let mut values = Values::new();
        values.set("image.tag", json!("v1"));
        values.set("replicas", json!(3));

        assert_eq!(values.get("image.tag").unwrap(), "v1");
        assert_eq!(values.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_parse_set_values_coercion() {
        let args = vec![
            "replicas=3".to_string(),
            "flag=true".to_string(),
            "off=FALSE".to_string(),
            "empty=null".to_string(),
            "ratio=0.5".to_string(),
            "storage=50Gi".to_string(),
            "postgresql.storage=50Gi".to_string(),
        ];

        let values = parse_set_values(&args).unwrap();

        assert_eq!(values.get("replicas").unwrap(), 3);
        assert_eq!(values.get("flag").unwrap(), true);
        assert_eq!(values.get("off").unwrap(), false);
        assert!(values.get("empty").unwrap().is_null());
        assert_eq!(values.get("ratio").unwrap(), 0.5);
        assert_eq!(values.get("storage").unwrap(), "50Gi");
        assert_eq!(values.get("postgresql.storage").unwrap(), "50Gi");
    }

    #[test]
    fn test_parse_set_values_value_may_contain_equals() {
        let args = vec!["conn=host=db port=5432".to_string()];
        let values = parse_set_values(&args).unwrap();
        assert_eq!(values.get("conn").unwrap(), "host=db port=5432");
    }

    #[test]
    fn test_parse_set_values_malformed_aborts() {
        let args = vec!["replicas=3".to_string(), "broken".to_string()];
        let err = parse_set_values(&args).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOverride { .. }));
    }

    #[test]
    fn test_merge_all_missing_file_is_fatal() {
        let err = merge_all(Values::new(), &["/nonexistent/values.yaml"], &[]).unwrap_err();
        assert!(matches!(err, CoreError::ValuesFileNotFound { .. }));
    }

    #[test]
    fn test_merge_all_later_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        std::fs::write(&a, "replicas: 2\nstorage: 10Gi\n").unwrap();
        std::fs::write(&b, "replicas: 5\n").unwrap();

        let merged = merge_all(
            Values::from_yaml("replicas: 1\nname: app\n").unwrap(),
            &[a, b],
            &["storage=99Gi".to_string()],
        )
        .unwrap();

        assert_eq!(merged.get("replicas").unwrap(), 5);
        assert_eq!(merged.get("storage").unwrap(), "99Gi");
        assert_eq!(merged.get("name").unwrap(), "app");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!(1)));
    }
}
