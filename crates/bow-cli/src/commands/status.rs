//! Status command - lock target, stage, files and drift

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use bow_chart::ChartRegistry;
use bow_workspace::{
    check_drift, compute_checksum, parse_lock, resolve_stages, LOCK_FILE, STAGE_ENV_VAR,
};

pub fn run(stages: &[String], workspace_dir: &Path) -> Result<()> {
    let lock_path = workspace_dir.join(LOCK_FILE);
    if !lock_path.exists() {
        println!("No {} found in {}", LOCK_FILE, workspace_dir.display());
        println!("Run 'bow lock --init <chart>' to initialize.");
        return Ok(());
    }

    let lock = parse_lock(&lock_path).into_diagnostic()?;

    println!("{:<11} {}", style("Workspace:").bold(), workspace_dir.display());
    if let Some(chart) = &lock.chart {
        println!("{:<11} {}", style("Chart:").bold(), chart);
    }
    if let Some(stack) = &lock.stack {
        println!("{:<11} {}", style("Stack:").bold(), stack);
    }
    if let Some(version) = &lock.version {
        println!("{:<11} {}", style("Version:").bold(), version);
    }
    if let Some(namespace) = &lock.namespace {
        println!("{:<11} {}", style("Namespace:").bold(), namespace);
    }

    let env_value = std::env::var(STAGE_ENV_VAR).ok();
    let resolved = resolve_stages(stages, env_value.as_deref());
    if !resolved.is_empty() {
        println!("{:<11} {}", style("Stage:").bold(), resolved.join(", "));
    }

    println!();
    println!("{}", style("Files:").bold());
    for name in workspace_files(workspace_dir)? {
        println!("  {name}");
    }

    println!();
    match &lock.checksum {
        Some(stored) => {
            if check_drift(workspace_dir, &lock).into_diagnostic()? {
                let current = compute_checksum(workspace_dir).into_diagnostic()?;
                println!("{}", style("DRIFT DETECTED").red().bold());
                println!("  locked:  {stored}");
                println!("  current: {current}");
                println!("  Run 'bow lock' to update.");
            } else {
                println!("{} No drift. Checksum: {stored}", style("✓").green().bold());
            }
        }
        None => println!("No checksum in lock file. Run 'bow lock' to set one."),
    }

    // Flag a registry mismatch against the locked chart
    if let Some(chart_name) = &lock.chart {
        match ChartRegistry::builtin().get(chart_name) {
            Ok(chart) => {
                if let Some(locked) = &lock.version {
                    if locked != chart.version() {
                        println!(
                            "\n{} version mismatch: lock={locked} registered={}",
                            style("warning:").yellow().bold(),
                            chart.version()
                        );
                    }
                }
            }
            Err(_) => println!(
                "\n{} chart '{chart_name}' is not registered",
                style("warning:").yellow().bold()
            ),
        }
    }

    Ok(())
}

/// Deploy inputs present in the workspace: stack.yaml plus the values
/// files, sorted by name
fn workspace_files(workspace_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(workspace_dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_values = name.starts_with("values") && name.ends_with(".yaml");
        if is_values || name == "stack.yaml" {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
