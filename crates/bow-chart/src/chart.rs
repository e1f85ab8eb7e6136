//! Chart contract and render orchestration
//!
//! A chart is a named, versioned unit whose `render` adds resources to
//! the context's currently open manifest scope. [`template`] is the
//! orchestration entrypoint: it merges values, stamps tracking labels,
//! renders declared dependencies and then the chart itself, and returns
//! the collected manifest.

use std::path::PathBuf;

use bow_core::{merge_all, Context, Manifest, Tracking, Values};

use crate::dependency::{dependency_values, resolve_condition, ChartDependency};
use crate::error::Result;
use crate::registry::ChartRegistry;

pub trait Chart {
    fn name(&self) -> &str;

    /// Semver string
    fn version(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn default_values(&self) -> Values {
        Values::new()
    }

    fn dependencies(&self) -> Vec<ChartDependency> {
        Vec::new()
    }

    /// Create resources in the context's open manifest scope
    fn render(&self, ctx: &mut Context, values: &Values) -> Result<()>;
}

/// Render a chart and return its manifest without applying anything.
///
/// Values precedence: chart defaults, then value files in order, then
/// --set overrides.
pub fn template(
    chart: &dyn Chart,
    registry: &ChartRegistry,
    value_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
) -> Result<Manifest> {
    let values = merge_all(chart.default_values(), value_files, set_args)?;

    let mut ctx = Context::new();
    ctx.set_tracking(Tracking::chart(chart.name(), chart.version()));
    if let Some(ns) = namespace {
        ctx.set_namespace(ns);
    }

    ctx.manifest(|ctx| {
        render_dependencies(chart, registry, ctx, &values)?;
        chart.render(ctx, &values)
    })
}

/// Render a chart's declared dependencies into the already-open scope.
///
/// Dependencies render via `render`, not `template`: their resources
/// land in the same top-level scope as the parent's, under the parent's
/// tracking labels.
pub fn render_dependencies(
    chart: &dyn Chart,
    registry: &ChartRegistry,
    ctx: &mut Context,
    values: &Values,
) -> Result<()> {
    for dep in chart.dependencies() {
        if !resolve_condition(values, dep.condition.as_deref()) {
            continue;
        }
        if !dep.deploy {
            continue;
        }

        let dep_chart = registry.get(&dep.chart)?;
        let dep_values = dependency_values(values, &dep);
        dep_chart.render(ctx, &dep_values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use bow_core::{ConfigMap, Deployment, Container};
    use serde_json::json;

    struct MinimalChart;

    impl Chart for MinimalChart {
        fn name(&self) -> &str {
            "minimal"
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn default_values(&self) -> Values {
            Values(json!({"replicas": 2, "image": "app:v1"}))
        }

        fn render(&self, ctx: &mut Context, values: &Values) -> Result<()> {
            let replicas = values.get_i64("replicas", 1);
            let image = values.get_str("image", "app:latest");
            ctx.deployment(Deployment::new("minimal").replicas(replicas), |ctx| {
                ctx.container(Container::new("minimal", image), |_| Ok(()))
            })?;
            Ok(())
        }
    }

    struct ParentChart;

    impl Chart for ParentChart {
        fn name(&self) -> &str {
            "parent"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn dependencies(&self) -> Vec<ChartDependency> {
            vec![ChartDependency::new("minimal")
                .condition("minimal.enabled")
                .default_values(Values(json!({"replicas": 5})))]
        }

        fn render(&self, ctx: &mut Context, _values: &Values) -> Result<()> {
            ctx.config_map(ConfigMap::new("parent-config"))?;
            Ok(())
        }
    }

    fn registry() -> ChartRegistry {
        let mut registry = ChartRegistry::new();
        registry.register(Box::new(MinimalChart));
        registry.register(Box::new(ParentChart));
        registry
    }

    #[test]
    fn template_applies_defaults_and_overrides() {
        let registry = registry();
        let chart = registry.get("minimal").unwrap();
        let manifest =
            template(chart, &registry, &[], &["replicas=7".to_string()], None).unwrap();
        let docs = manifest.to_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["spec"]["replicas"], 7);
        assert_eq!(
            docs[0]["spec"]["template"]["spec"]["containers"][0]["image"],
            "app:v1"
        );
    }

    #[test]
    fn template_stamps_tracking_labels() {
        let registry = registry();
        let chart = registry.get("minimal").unwrap();
        let docs = template(chart, &registry, &[], &[], None)
            .unwrap()
            .to_documents();
        let labels = &docs[0]["spec"]["template"]["metadata"]["labels"];
        assert_eq!(labels["bow.io/managed-by"], "bow");
        assert_eq!(labels["bow.io/chart"], "minimal");
        assert_eq!(labels["bow.io/version"], "0.1.0");
    }

    #[test]
    fn dependency_renders_into_the_same_scope() {
        let registry = registry();
        let chart = registry.get("parent").unwrap();
        let docs = template(chart, &registry, &[], &[], None)
            .unwrap()
            .to_documents();
        // Dependency first, then the chart's own resources
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["kind"], "Deployment");
        assert_eq!(docs[0]["spec"]["replicas"], 5);
        assert_eq!(docs[1]["kind"], "ConfigMap");
    }

    #[test]
    fn dependency_condition_false_skips_entirely() {
        let registry = registry();
        let chart = registry.get("parent").unwrap();
        let docs = template(
            chart,
            &registry,
            &[],
            &["minimal.enabled=false".to_string()],
            None,
        )
        .unwrap()
        .to_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["kind"], "ConfigMap");
    }

    #[test]
    fn missing_dependency_chart_is_instructive() {
        struct BrokenChart;
        impl Chart for BrokenChart {
            fn name(&self) -> &str {
                "broken"
            }
            fn version(&self) -> &str {
                "0.0.1"
            }
            fn dependencies(&self) -> Vec<ChartDependency> {
                vec![ChartDependency::new("mariadb")]
            }
            fn render(&self, _ctx: &mut Context, _values: &Values) -> Result<()> {
                Ok(())
            }
        }

        let registry = registry();
        let err = template(&BrokenChart, &registry, &[], &[], None).unwrap_err();
        match err {
            ChartError::NotFound { name, .. } => assert_eq!(name, "mariadb"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
