//! Stack render pipeline
//!
//! merge files -> apply --set -> parse -> resolve references -> render
//! each component into one shared manifest scope, in declaration order.
//! Cross-component ordering is exactly the declared sequence; reference
//! resolution is a values-text pass that happens before any rendering
//! and has no bearing on render order.

use std::path::Path;

use bow_chart::{render_dependencies, ChartRegistry};
use bow_core::{deep_merge, parse_set_values, Context, Manifest, Tracking};
use serde_json::Value;

use crate::error::{Result, StackError};
use crate::merger::merge_stack_files;
use crate::parser::parse_stack_value;
use crate::refs::resolve_refs;

/// Render a stack from its file list
pub fn render_stack<P: AsRef<Path>>(
    registry: &ChartRegistry,
    file_paths: &[P],
    set_args: &[String],
    namespace: Option<&str>,
) -> Result<Manifest> {
    let mut merged = merge_stack_files(file_paths)?;

    let (component_args, _other_args) = split_set_args(set_args);
    // Overrides outside the components.* shape are currently inert in
    // stack mode; they are parsed for validity and otherwise ignored.
    apply_component_overrides(&mut merged, &component_args)?;

    let mut stack = parse_stack_value(&merged)?;
    if let Some(ns) = namespace {
        stack.namespace = Some(ns.to_string());
    }

    let components = resolve_refs(&stack.components)?;

    let mut ctx = Context::new();
    if let Some(ns) = &stack.namespace {
        ctx.set_namespace(ns);
    }

    let stack_name = stack.name.clone();
    ctx.manifest(|ctx| {
        for comp in &components {
            let chart = registry.get(&comp.chart).map_err(|source| {
                StackError::ComponentChart {
                    component: comp.name.clone(),
                    source,
                }
            })?;

            ctx.set_tracking(
                Tracking::chart(&comp.chart, chart.version()).stack(&stack_name),
            );

            let values =
                bow_core::Values(deep_merge(chart.default_values().inner(), comp.values.inner()));

            render_dependencies(chart, registry, ctx, &values)?;
            chart.render(ctx, &values)?;
        }
        Ok(())
    })
}

/// Split --set arguments into component-addressed and other
fn split_set_args(set_args: &[String]) -> (Vec<String>, Vec<String>) {
    set_args
        .iter()
        .cloned()
        .partition(|arg| arg.starts_with("components."))
}

/// Apply `components.<name>.values.<dotted-key>=<value>` overrides to
/// the merged stack document. Overrides naming an unknown component are
/// silently ignored; that lenience is intentional.
fn apply_component_overrides(data: &mut Value, set_args: &[String]) -> Result<()> {
    for arg in set_args {
        let (key, value) = match arg.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };

        let parts: Vec<&str> = key.split('.').collect();
        if parts.len() < 4 || parts[0] != "components" || parts[2] != "values" {
            continue;
        }
        let comp_name = parts[1];
        let value_key = parts[3..].join(".");

        let components = match data.get_mut("components").and_then(Value::as_array_mut) {
            Some(components) => components,
            None => return Ok(()),
        };

        for comp in components {
            let name = comp
                .get("name")
                .or_else(|| comp.get("chart"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if name != comp_name {
                continue;
            }

            let override_values = parse_set_values(&[format!("{value_key}={value}")])?;
            let base = comp.get("values").cloned().unwrap_or(Value::Null);
            let merged = deep_merge(&base, override_values.inner());
            if let Some(map) = comp.as_object_mut() {
                map.insert("values".to_string(), merged);
            }
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_stack(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const BASE_STACK: &str = "\
apiVersion: bow.io/v1
kind: Stack
metadata:
  name: my-project
  namespace: my-project
components:
  - chart: postgresql
    name: main-db
    values:
      database: tracker
      storage: 50Gi
  - chart: redis
    name: cache
    values:
      persistence:
        enabled: false
";

    #[test]
    fn stack_renders_components_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(&dir, "stack.yaml", BASE_STACK);
        let registry = ChartRegistry::builtin();

        let docs = render_stack(&registry, &[stack], &[], None)
            .unwrap()
            .to_documents();

        let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "PersistentVolumeClaim",
                "Deployment",
                "Service",
                "Deployment",
                "Service",
            ]
        );
        // Resource names come from each chart's own values; the
        // component name is only an addressing handle
        assert_eq!(docs[1]["metadata"]["name"], "postgresql");
        assert_eq!(docs[3]["metadata"]["name"], "redis");
    }

    #[test]
    fn stack_tracking_and_namespace_are_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(&dir, "stack.yaml", BASE_STACK);
        let registry = ChartRegistry::builtin();

        let docs = render_stack(&registry, &[stack], &[], None)
            .unwrap()
            .to_documents();

        let labels = &docs[1]["spec"]["template"]["metadata"]["labels"];
        assert_eq!(labels["bow.io/managed-by"], "bow");
        assert_eq!(labels["bow.io/chart"], "postgresql");
        assert_eq!(labels["bow.io/stack"], "my-project");
        assert_eq!(docs[1]["metadata"]["namespace"], "my-project");
    }

    #[test]
    fn namespace_override_wins_over_stack_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(&dir, "stack.yaml", BASE_STACK);
        let registry = ChartRegistry::builtin();

        let docs = render_stack(&registry, &[stack], &[], Some("staging"))
            .unwrap()
            .to_documents();
        assert_eq!(docs[1]["metadata"]["namespace"], "staging");
    }

    #[test]
    fn component_set_overrides_route_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(&dir, "stack.yaml", BASE_STACK);
        let registry = ChartRegistry::builtin();

        let docs = render_stack(
            &registry,
            &[stack],
            &[
                "components.main-db.values.replicas=3".to_string(),
                "components.nope.values.replicas=9".to_string(),
                "plain=ignored".to_string(),
            ],
            None,
        )
        .unwrap()
        .to_documents();

        assert_eq!(docs[1]["spec"]["replicas"], 3);
        // Unknown component and non-component overrides left no trace
        assert_eq!(docs[3]["spec"]["replicas"], 1);
    }

    #[test]
    fn overlay_file_feeds_the_render() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(&dir, "stack.yaml", BASE_STACK);
        let prod = write_stack(
            &dir,
            "values.prod.yaml",
            "components:\n  main-db:\n    values:\n      storage: 200Gi\n",
        );
        let registry = ChartRegistry::builtin();

        let docs = render_stack(&registry, &[stack, prod], &[], None)
            .unwrap()
            .to_documents();
        assert_eq!(docs[0]["spec"]["resources"]["requests"]["storage"], "200Gi");
    }

    #[test]
    fn references_resolve_across_components() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(
            &dir,
            "stack.yaml",
            "\
metadata:
  name: refs
components:
  - chart: postgresql
    name: db
    values:
      database: myapp
  - chart: redis
    name: cache
    values:
      config:
        maxmemory: \"${db.values.database}-cache\"
",
        );
        let registry = ChartRegistry::builtin();

        let docs = render_stack(&registry, &[stack], &[], None)
            .unwrap()
            .to_documents();
        let redis = docs
            .iter()
            .find(|d| d["kind"] == "Deployment" && d["metadata"]["name"] == "redis")
            .unwrap();
        let command = redis["spec"]["template"]["spec"]["containers"][0]["command"]
            .as_array()
            .unwrap();
        assert_eq!(command[2], "myapp-cache");
    }

    #[test]
    fn unknown_chart_names_the_component() {
        let dir = tempfile::tempdir().unwrap();
        let stack = write_stack(
            &dir,
            "stack.yaml",
            "metadata:\n  name: x\ncomponents:\n- chart: mariadb\n  name: db\n",
        );
        let registry = ChartRegistry::builtin();

        let err = render_stack(&registry, &[stack], &[], None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("component 'db'"));
    }
}
