//! Stack file parser
//!
//! stack.yaml format:
//!
//! ```yaml
//! apiVersion: bow.io/v1
//! kind: Stack
//! metadata:
//!   name: my-project
//!   namespace: my-project
//! components:
//!   - chart: postgresql
//!     name: main-db
//!     values:
//!       storage: 50Gi
//!   - chart: redis
//!     name: cache
//! ```
//!
//! Schema tags are optional; when present they must match exactly.

use std::collections::HashSet;
use std::path::Path;

use bow_core::Values;
use serde_json::Value;

use crate::error::{Result, StackError};

pub const API_VERSION: &str = "bow.io/v1";
pub const STACK_KIND: &str = "Stack";

/// A single stack component
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub chart: String,
    pub name: String,
    pub values: Values,
}

/// Parsed stack definition
#[derive(Debug, Clone)]
pub struct StackSpec {
    pub name: String,
    pub namespace: Option<String>,
    pub components: Vec<ComponentSpec>,
}

/// Parse a stack.yaml file
pub fn parse_stack_file<P: AsRef<Path>>(path: P) -> Result<StackSpec> {
    let path = path.as_ref();
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
    parse_stack_value(&data)
}

/// Build a StackSpec from an already-merged stack document
pub fn parse_stack_value(data: &Value) -> Result<StackSpec> {
    if let Some(api_version) = data.get("apiVersion").and_then(Value::as_str) {
        if !api_version.is_empty() && api_version != API_VERSION {
            return Err(StackError::Parse(format!(
                "unsupported apiVersion: '{api_version}'. Expected '{API_VERSION}'"
            )));
        }
    }
    if let Some(kind) = data.get("kind").and_then(Value::as_str) {
        if !kind.is_empty() && kind != STACK_KIND {
            return Err(StackError::Parse(format!(
                "unsupported kind: '{kind}'. Expected '{STACK_KIND}'"
            )));
        }
    }

    if let Some(metadata) = data.get("metadata") {
        if !metadata.is_object() {
            return Err(StackError::Parse("metadata must be a mapping".to_string()));
        }
    }

    let metadata = data.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(StackError::Parse("metadata.name is required".to_string()));
    }

    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(components) = data.get("components") {
        if !components.is_array() {
            return Err(StackError::Parse("components must be a list".to_string()));
        }
    }

    let empty = Vec::new();
    let components_raw = data
        .get("components")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut components = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for (i, comp) in components_raw.iter().enumerate() {
        if !comp.is_object() {
            return Err(StackError::Parse(format!(
                "components[{i}] must be a mapping"
            )));
        }

        let chart = comp
            .get("chart")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if chart.is_empty() {
            return Err(StackError::Parse(format!(
                "components[{i}].chart is required"
            )));
        }

        let comp_name = comp
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(chart)
            .to_string();

        if !seen_names.insert(comp_name.clone()) {
            return Err(StackError::Parse(format!(
                "duplicate component name: '{comp_name}'. \
                 Use the 'name' field to distinguish multiple instances of the same chart"
            )));
        }

        let values = match comp.get("values") {
            None => Values::new(),
            Some(v) if v.is_object() => Values(v.clone()),
            Some(_) => {
                return Err(StackError::Parse(format!(
                    "components[{i}].values must be a mapping"
                )))
            }
        };

        components.push(ComponentSpec {
            chart: chart.to_string(),
            name: comp_name,
            values,
        });
    }

    Ok(StackSpec {
        name: name.to_string(),
        namespace,
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Result<StackSpec> {
        let data: Value = serde_yaml::from_str(yaml).unwrap();
        parse_stack_value(&data)
    }

    #[test]
    fn minimal_stack_parses() {
        let stack = parse(
            "apiVersion: bow.io/v1\n\
             kind: Stack\n\
             metadata:\n  name: my-project\n  namespace: prod\n\
             components:\n\
             - chart: postgresql\n  name: main-db\n  values:\n    storage: 50Gi\n\
             - chart: redis\n",
        )
        .unwrap();

        assert_eq!(stack.name, "my-project");
        assert_eq!(stack.namespace.as_deref(), Some("prod"));
        assert_eq!(stack.components.len(), 2);
        assert_eq!(stack.components[0].name, "main-db");
        assert_eq!(stack.components[0].values.get("storage").unwrap(), "50Gi");
        // Name defaults to the chart name
        assert_eq!(stack.components[1].name, "redis");
    }

    #[test]
    fn schema_tags_are_optional_but_checked() {
        assert!(parse("metadata:\n  name: x\n").is_ok());

        let err = parse("apiVersion: helm/v3\nmetadata:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("unsupported apiVersion"));

        let err = parse("kind: Release\nmetadata:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("unsupported kind"));
    }

    #[test]
    fn missing_name_is_fatal() {
        let err = parse("components: []\n").unwrap_err();
        assert!(err.to_string().contains("metadata.name is required"));
    }

    #[test]
    fn duplicate_names_are_fatal_with_disambiguation_hint() {
        let err = parse(
            "metadata:\n  name: x\n\
             components:\n- chart: redis\n- chart: redis\n",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate component name: 'redis'"));
        assert!(message.contains("'name' field"));
    }

    #[test]
    fn component_without_chart_is_fatal() {
        let err = parse(
            "metadata:\n  name: x\ncomponents:\n- name: db\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("components[0].chart is required"));
    }
}
