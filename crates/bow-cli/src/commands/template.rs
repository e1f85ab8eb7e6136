//! Template command - render a chart, stack, or workspace as YAML

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};

use bow_chart::ChartRegistry;

use super::render::render_target;

#[allow(clippy::too_many_arguments)]
pub fn run(
    chart_name: Option<&str>,
    value_files: &[PathBuf],
    set_args: &[String],
    namespace: Option<&str>,
    output: Option<&Path>,
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

    if debug {
        eprintln!(
            "{} rendered {} ({} resources)",
            style("DEBUG").dim(),
            rendered.label,
            rendered.manifest.resources().len()
        );
    }

    let yaml = rendered.manifest.to_text().into_diagnostic()?;
    if yaml.is_empty() {
        eprintln!(
            "{} no resources produced",
            style("warning:").yellow().bold()
        );
        return Ok(());
    }

    match output {
        Some(path) => {
            fs::write(path, &yaml)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", style("wrote").green().bold(), path.display());
        }
        None => print!("{yaml}"),
    }

    Ok(())
}
