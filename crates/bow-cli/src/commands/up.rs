//! Up command - deploy a chart, stack, or workspace via kubectl

use console::style;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use bow_chart::ChartRegistry;

use super::render::render_target;

#[allow(clippy::too_many_arguments)]
pub fn run(
    chart_name: Option<&str>,
    value_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
    create_namespace: bool,
    dry_run: bool,
    stages: &[String],
    workspace_dir: &Path,
    debug: bool,
) -> Result<()> {
    let registry = ChartRegistry::builtin();

    let rendered = render_target(
        &registry,
        chart_name,
        value_files,
        set_args,
        namespace,
        stages,
        workspace_dir,
        debug,
    )?;

    let yaml = rendered.manifest.to_text().into_diagnostic()?;
    if yaml.is_empty() {
        eprintln!(
            "{} no resources produced, nothing to deploy",
            style("warning:").yellow().bold()
        );
        return Ok(());
    }

    let ns = rendered.namespace.as_deref();
    if create_namespace || rendered.create_namespace {
        if let Some(ns) = ns {
            ensure_namespace(ns, dry_run)?;
        }
    }

    eprintln!("Deploying {}...", style(&rendered.label).cyan());
    kubectl_apply(&yaml, ns, dry_run)?;
    eprintln!(
        "{} {} deployed",
        style("✓").green().bold(),
        rendered.label
    );

    Ok(())
}

fn kubectl_apply(yaml: &str, namespace: Option<&str>, dry_run: bool) -> Result<()> {
    let mut cmd = Command::new("kubectl");
    cmd.args(["apply", "-f", "-"]);
    if let Some(ns) = namespace {
        cmd.args(["-n", ns]);
    }
    if dry_run {
        cmd.arg("--dry-run=client");
    }

    let mut child = cmd
        .stdin(Stdio::piped())
        .spawn()
        .into_diagnostic()
        .wrap_err("failed to start kubectl; is it on PATH?")?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(yaml.as_bytes())
            .into_diagnostic()
            .wrap_err("failed to stream manifests to kubectl")?;
    }

    let status = child.wait().into_diagnostic()?;
    if !status.success() {
        return Err(miette!("kubectl apply exited with {status}"));
    }
    Ok(())
}

/// Idempotent namespace creation: render the Namespace client-side and
/// apply it, so an existing namespace is not an error
fn ensure_namespace(namespace: &str, dry_run: bool) -> Result<()> {
    let output = Command::new("kubectl")
        .args([
            "create",
            "namespace",
            namespace,
            "--dry-run=client",
            "-o",
            "yaml",
        ])
        .output()
        .into_diagnostic()
        .wrap_err("failed to start kubectl; is it on PATH?")?;

    if !output.status.success() {
        return Err(miette!(
            "kubectl could not render namespace '{namespace}': {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let rendered = String::from_utf8_lossy(&output.stdout);
    kubectl_apply(&rendered, None, dry_run)
}
