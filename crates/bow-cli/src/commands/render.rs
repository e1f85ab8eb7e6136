//! Shared render dispatch for template and up
//!
//! Both commands accept the same three targets and resolve them the
//! same way:
//!
//! - `bow <cmd> <chart>`        renders a single chart
//! - `bow <cmd> -f stack.yaml`  renders a stack (no bow.lock present)
//! - `bow <cmd>`                renders the workspace named by bow.lock

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use bow_chart::{template, ChartRegistry};
use bow_core::Manifest;
use bow_stack::render_stack;
use bow_workspace::{resolve_workspace, LOCK_FILE};

#[derive(Debug)]
pub struct Rendered {
    pub manifest: Manifest,
    pub label: String,
    pub namespace: Option<String>,
    pub create_namespace: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn render_target(
    registry: &ChartRegistry,
    chart_name: Option<&str>,
    value_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
    stages: &[String],
    workspace_dir: &Path,
    debug: bool,
) -> Result<Rendered> {
    if let Some(name) = chart_name {
        return render_chart(registry, name, value_files, set_args, namespace, None);
    }
    if !value_files.is_empty() && !workspace_dir.join(LOCK_FILE).exists() {
        return render_stack_target(registry, value_files, set_args, namespace, "stack");
    }
    render_workspace(
        registry,
        workspace_dir,
        stages,
        value_files,
        set_args,
        namespace,
        debug,
    )
}

fn render_chart(
    registry: &ChartRegistry,
    name: &str,
    value_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
    locked_version: Option<&str>,
) -> Result<Rendered> {
    let chart = registry.get(name).into_diagnostic()?;

    if let Some(locked) = locked_version {
        if locked != chart.version() {
            eprintln!(
                "{} version mismatch: lock={} registered={}",
                style("warning:").yellow().bold(),
                locked,
                chart.version()
            );
        }
    }

    let manifest = template(chart, registry, value_files, set_args, namespace).into_diagnostic()?;

    Ok(Rendered {
        manifest,
        label: format!("{}@{}", chart.name(), chart.version()),
        namespace: namespace.map(str::to_string),
        create_namespace: false,
    })
}

fn render_stack_target<P: AsRef<Path>>(
    registry: &ChartRegistry,
    file_paths: &[P],
    set_args: &[String],
    namespace: Option<&str>,
    label: &str,
) -> Result<Rendered> {
    let manifest = render_stack(registry, file_paths, set_args, namespace).into_diagnostic()?;

    Ok(Rendered {
        manifest,
        label: label.to_string(),
        namespace: namespace.map(str::to_string),
        create_namespace: false,
    })
}

fn render_workspace(
    registry: &ChartRegistry,
    workspace_dir: &Path,
    stages: &[String],
    extra_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
    debug: bool,
) -> Result<Rendered> {
    let plan = resolve_workspace(workspace_dir, stages, extra_files, set_args).into_diagnostic()?;

    // The -n flag beats the namespace recorded in the lock
    let ns = namespace
        .map(str::to_string)
        .or_else(|| plan.namespace().map(str::to_string));

    if plan.has_drift {
        eprintln!(
            "{} drift detected: files changed since last lock. Run 'bow lock' to update the checksum.",
            style("warning:").yellow().bold()
        );
    }
    if debug && !plan.stages.is_empty() {
        eprintln!("{} stage: {}", style("DEBUG").dim(), plan.stages.join(", "));
    }

    let mut rendered = if plan.is_stack() {
        render_stack_target(
            registry,
            &plan.files,
            &plan.set_args,
            ns.as_deref(),
            &format!("stack ({})", plan.lock.display_name()),
        )?
    } else {
        // Chart workspaces always carry a chart name past parse_lock
        let chart_name = plan.lock.chart.clone().unwrap_or_default();
        render_chart(
            registry,
            &chart_name,
            &plan.files,
            &plan.set_args,
            ns.as_deref(),
            plan.lock.version.as_deref(),
        )?
    };

    rendered.create_namespace = plan.lock.create_namespace;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bow_workspace::{compute_checksum, write_lock, LockSpec};

    #[test]
    fn chart_name_wins_over_everything() {
        let registry = ChartRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();

        let rendered = render_target(
            &registry,
            Some("redis"),
            &[],
            &[],
            Some("cache"),
            &[],
            dir.path(),
            false,
        )
        .unwrap();

        assert_eq!(rendered.label, "redis@7.2.0");
        assert_eq!(rendered.namespace.as_deref(), Some("cache"));
        assert!(!rendered.manifest.is_empty());
    }

    #[test]
    fn values_files_without_a_lock_mean_stack_mode() {
        let registry = ChartRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let stack = dir.path().join("stack.yaml");
        std::fs::write(
            &stack,
            "metadata:\n  name: demo\ncomponents:\n  - chart: redis\n",
        )
        .unwrap();

        let rendered = render_target(
            &registry,
            None,
            &[stack],
            &[],
            None,
            &[],
            dir.path(),
            false,
        )
        .unwrap();

        assert_eq!(rendered.label, "stack");
        let text = rendered.manifest.to_text().unwrap();
        assert!(text.starts_with("---\n"));
    }

    #[test]
    fn lock_file_routes_to_the_workspace_resolver() {
        let registry = ChartRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("values.yaml"), "name: cache\n").unwrap();

        let mut lock = LockSpec::for_chart("redis");
        lock.version = Some("7.2.0".to_string());
        lock.namespace = Some("cache".to_string());
        lock.create_namespace = true;
        lock.checksum = Some(compute_checksum(dir.path()).unwrap());
        write_lock(&lock, dir.path().join(LOCK_FILE)).unwrap();

        let rendered =
            render_target(&registry, None, &[], &[], None, &[], dir.path(), false).unwrap();

        assert_eq!(rendered.label, "redis@7.2.0");
        assert_eq!(rendered.namespace.as_deref(), Some("cache"));
        assert!(rendered.create_namespace);
    }

    #[test]
    fn unknown_chart_is_a_diagnostic() {
        let registry = ChartRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();

        let err = render_target(
            &registry,
            Some("postgresq"),
            &[],
            &[],
            None,
            &[],
            dir.path(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Did you mean 'postgresql'?"));
    }
}
