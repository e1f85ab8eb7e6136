//! Stack overlay merger
//!
//! Deep merges multiple -f files. The first file must be the complete
//! stack definition; every subsequent file is an overlay in one of two
//! forms:
//!
//! Name-keyed mapping (value overrides only):
//!
//! ```yaml
//! components:
//!   main-db:
//!     values:
//!       storage: 200Gi
//! ```
//!
//! Component list (match by name, unknown names appended):
//!
//! ```yaml
//! components:
//!   - chart: postgresql
//!     name: main-db
//!     values:
//!       replicas: 3
//! ```

use std::path::Path;

use bow_core::deep_merge;
use serde_json::{Map, Value};

use crate::error::{Result, StackError};

/// Merge stack and overlay files in precedence order
pub fn merge_stack_files<P: AsRef<Path>>(file_paths: &[P]) -> Result<Value> {
    let mut paths = file_paths.iter();
    let first = paths.next().ok_or(StackError::NoFiles)?;

    let mut base = load_yaml(first.as_ref())?;
    for path in paths {
        let overlay = load_yaml(path.as_ref())?;
        base = merge_overlay(&base, &overlay);
    }
    Ok(base)
}

fn load_yaml(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(StackError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let data: Value = serde_yaml::from_str(&content)?;
    if !data.is_object() {
        return Err(StackError::NotAMapping {
            path: path.display().to_string(),
        });
    }
    Ok(data)
}

/// The component a base entry is addressed by: explicit name, else chart
fn component_name(comp: &Value) -> &str {
    comp.get("name")
        .or_else(|| comp.get("chart"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

pub(crate) fn merge_overlay(base: &Value, overlay: &Value) -> Value {
    let mut result = base.clone();

    match overlay.get("components") {
        Some(Value::Object(overlay_map)) => {
            let merged = merge_components_dict(components_of(base), overlay_map);
            set_key(&mut result, "components", Value::Array(merged));
        }
        Some(Value::Array(overlay_list)) => {
            let merged = merge_components_list(components_of(base), overlay_list);
            set_key(&mut result, "components", Value::Array(merged));
        }
        _ => {}
    }

    if let Some(metadata) = overlay.get("metadata") {
        let base_metadata = base.get("metadata").cloned().unwrap_or(Value::Null);
        set_key(&mut result, "metadata", deep_merge(&base_metadata, metadata));
    }

    result
}

fn components_of(base: &Value) -> &[Value] {
    base.get("components")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn set_key(target: &mut Value, key: &str, value: Value) {
    if let Some(map) = target.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}

/// Name-keyed overlay: merge each matching base component, keep the
/// base's order and untouched components as-is
fn merge_components_dict(base: &[Value], overlay: &Map<String, Value>) -> Vec<Value> {
    base.iter()
        .map(|comp| match overlay.get(component_name(comp)) {
            Some(patch) => deep_merge(comp, patch),
            None => comp.clone(),
        })
        .collect()
}

/// List overlay: match by name and merge; overlay components that have
/// no base counterpart are appended after all base components
fn merge_components_list(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::with_capacity(base.len());

    for comp in base {
        let name = component_name(comp);
        match overlay.iter().find(|o| component_name(o) == name) {
            Some(patch) => result.push(deep_merge(comp, patch)),
            None => result.push(comp.clone()),
        }
    }

    for comp in overlay {
        let name = component_name(comp);
        if !base.iter().any(|b| component_name(b) == name) {
            result.push(comp.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn dict_overlay_merges_matching_component_values() {
        let base = yaml(
            "metadata:\n  name: proj\n\
             components:\n\
             - chart: postgresql\n  name: main-db\n  values:\n    storage: 50Gi\n    replicas: 2\n",
        );
        let overlay = yaml(
            "components:\n  main-db:\n    values:\n      storage: 200Gi\n",
        );

        let merged = merge_overlay(&base, &overlay);
        let comp = &merged["components"][0];
        assert_eq!(comp["name"], "main-db");
        assert_eq!(comp["values"]["storage"], "200Gi");
        assert_eq!(comp["values"]["replicas"], 2);
    }

    #[test]
    fn dict_overlay_leaves_unknown_names_alone() {
        let base = yaml(
            "metadata:\n  name: proj\n\
             components:\n- chart: redis\n  name: cache\n",
        );
        let overlay = yaml("components:\n  missing:\n    values:\n      x: 1\n");

        let merged = merge_overlay(&base, &overlay);
        assert_eq!(merged["components"], base["components"]);
    }

    #[test]
    fn list_overlay_appends_new_components_after_base() {
        let base = yaml(
            "metadata:\n  name: proj\n\
             components:\n\
             - chart: postgresql\n  name: db\n  values:\n    replicas: 1\n",
        );
        let overlay = yaml(
            "components:\n\
             - chart: postgresql\n  name: db\n  values:\n    replicas: 3\n\
             - chart: redis\n  name: cache\n",
        );

        let merged = merge_overlay(&base, &overlay);
        let components = merged["components"].as_array().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["values"]["replicas"], 3);
        assert_eq!(components[1]["name"], "cache");
    }

    #[test]
    fn metadata_overlay_is_deep_merged() {
        let base = yaml("metadata:\n  name: proj\n  namespace: dev\ncomponents: []\n");
        let overlay = yaml("metadata:\n  namespace: prod\n");

        let merged = merge_overlay(&base, &overlay);
        assert_eq!(merged["metadata"], json!({"name": "proj", "namespace": "prod"}));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = merge_stack_files(&["/nonexistent/stack.yaml"]).unwrap_err();
        assert!(matches!(err, StackError::FileNotFound { .. }));
    }

    #[test]
    fn later_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let stack = dir.path().join("stack.yaml");
        let prod = dir.path().join("values.prod.yaml");
        std::fs::write(
            &stack,
            "metadata:\n  name: proj\ncomponents:\n- chart: redis\n  values:\n    storage: 5Gi\n",
        )
        .unwrap();
        std::fs::write(
            &prod,
            "components:\n  redis:\n    values:\n      storage: 20Gi\n",
        )
        .unwrap();

        let merged = merge_stack_files(&[stack, prod]).unwrap();
        assert_eq!(merged["components"][0]["values"]["storage"], "20Gi");
    }
}
