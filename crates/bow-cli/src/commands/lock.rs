//! Lock command - create or refresh the workspace lock file

use console::style;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::Path;

use bow_chart::ChartRegistry;
use bow_workspace::{compute_checksum, parse_lock, write_lock, LockSpec, LOCK_FILE};

pub fn run(
    init_chart: Option<&str>,
    stack: bool,
    namespace: Option<&str>,
    create_namespace: bool,
    workspace_dir: &Path,
) -> Result<()> {
    let lock_path = workspace_dir.join(LOCK_FILE);

    if init_chart.is_some() || stack {
        init_lock(
            &lock_path,
            init_chart,
            stack,
            namespace,
            create_namespace,
            workspace_dir,
        )
    } else {
        update_checksum(&lock_path, workspace_dir)
    }
}

fn init_lock(
    lock_path: &Path,
    chart_name: Option<&str>,
    stack: bool,
    namespace: Option<&str>,
    create_namespace: bool,
    workspace_dir: &Path,
) -> Result<()> {
    if lock_path.exists() {
        return Err(miette!(
            "lock file already exists: {}. Delete it first, or run 'bow lock' to refresh the checksum.",
            lock_path.display()
        ));
    }

    let mut lock = if stack {
        LockSpec::for_stack("stack.yaml")
    } else {
        // init_chart is present here, run() checked
        let name = chart_name.unwrap_or_default();
        let mut lock = LockSpec::for_chart(name);
        match ChartRegistry::builtin().get(name) {
            Ok(chart) => lock.version = Some(chart.version().to_string()),
            Err(_) => eprintln!(
                "{} chart '{name}' is not registered; lock created without a version",
                style("warning:").yellow().bold()
            ),
        }
        lock
    };

    lock.namespace = namespace.map(str::to_string);
    lock.create_namespace = create_namespace;
    lock.checksum = Some(
        compute_checksum(workspace_dir)
            .into_diagnostic()
            .wrap_err("failed to checksum the workspace")?,
    );

    write_lock(&lock, lock_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {}", lock_path.display()))?;

    eprintln!(
        "{} {} ({})",
        style("wrote").green().bold(),
        lock_path.display(),
        lock.display_name()
    );
    if let Some(checksum) = &lock.checksum {
        eprintln!("checksum: {checksum}");
    }
    Ok(())
}

fn update_checksum(lock_path: &Path, workspace_dir: &Path) -> Result<()> {
    let mut lock = parse_lock(lock_path)
        .into_diagnostic()
        .wrap_err("run 'bow lock --init <chart>' to create a lock file")?;

    let current = compute_checksum(workspace_dir)
        .into_diagnostic()
        .wrap_err("failed to checksum the workspace")?;

    if lock.checksum.as_deref() == Some(current.as_str()) {
        eprintln!("Lock is up to date. No changes detected.");
        return Ok(());
    }

    let old = lock.checksum.replace(current.clone());
    write_lock(&lock, lock_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {}", lock_path.display()))?;

    eprintln!("Checksum updated:");
    eprintln!("  old: {}", old.as_deref().unwrap_or("(none)"));
    eprintln!("  new: {current}");
    Ok(())
}
