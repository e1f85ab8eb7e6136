//! Stage resolution
//!
//! A stage maps to an overlay file: `--stage prod` pulls in
//! `values.prod.yaml`. Multiple stages compose in order. Priority:
//! --stage flags, then the BOW_STAGE environment variable
//! (comma-separated), then base files only.

use std::path::{Path, PathBuf};

/// Resolve the effective stage list from flags and the environment
/// variable value. Flags win outright when non-empty.
pub fn resolve_stages(flag_stages: &[String], env_value: Option<&str>) -> Vec<String> {
    if !flag_stages.is_empty() {
        return flag_stages.to_vec();
    }

    match env_value {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Values file list for a chart workspace, low to high precedence:
/// values.yaml (if present), one overlay per stage in order, then the
/// explicit -f files. A missing stage overlay warns and is skipped.
pub fn resolve_value_files(
    workspace_dir: &Path,
    stages: &[String],
    extra_files: &[PathBuf],
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let base = workspace_dir.join("values.yaml");
    if base.exists() {
        files.push(base);
    }

    for stage in stages {
        let stage_file = workspace_dir.join(format!("values.{stage}.yaml"));
        if stage_file.exists() {
            files.push(stage_file);
        } else {
            tracing::warn!(stage = %stage, file = %stage_file.display(), "stage file not found, skipping");
        }
    }

    files.extend(extra_files.iter().cloned());
    files
}

/// File list for a stack workspace: the stack file first, then the
/// chart-style values list
pub fn resolve_stack_files(
    workspace_dir: &Path,
    stack_file: &Path,
    stages: &[String],
    extra_files: &[PathBuf],
) -> Vec<PathBuf> {
    let mut files = vec![stack_file.to_path_buf()];
    files.extend(resolve_value_files(workspace_dir, stages, extra_files));
    files
}
