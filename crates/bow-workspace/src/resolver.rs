//! Workspace resolver
//!
//! Reads bow.lock from a directory, resolves stages and the file list,
//! checks drift, and returns a plan ready for the template/deploy
//! orchestration. The plan itself never renders anything.

use std::path::{Path, PathBuf};

use crate::error::{Result, WorkspaceError};
use crate::lock::{check_drift, parse_lock, LockSpec, LOCK_FILE};
use crate::stage::{resolve_stack_files, resolve_stages, resolve_value_files};

pub const STAGE_ENV_VAR: &str = "BOW_STAGE";

/// Resolved workspace deploy plan
#[derive(Debug)]
pub struct WorkspacePlan {
    pub workspace_dir: PathBuf,
    pub lock: LockSpec,
    pub stages: Vec<String>,
    pub files: Vec<PathBuf>,
    pub set_args: Vec<String>,
    pub has_drift: bool,
}

impl WorkspacePlan {
    pub fn namespace(&self) -> Option<&str> {
        self.lock.namespace.as_deref()
    }

    pub fn is_stack(&self) -> bool {
        self.lock.is_stack()
    }
}

/// Resolve a workspace directory into a deploy plan
pub fn resolve_workspace(
    workspace_dir: &Path,
    stage_flags: &[String],
    extra_files: &[PathBuf],
    set_args: &[String],
) -> Result<WorkspacePlan> {
    if !workspace_dir.is_dir() {
        return Err(WorkspaceError::NotADirectory {
            path: workspace_dir.display().to_string(),
        });
    }

    let lock = parse_lock(workspace_dir.join(LOCK_FILE))?;

    let env_value = std::env::var(STAGE_ENV_VAR).ok();
    let stages = resolve_stages(stage_flags, env_value.as_deref());

    let files = if lock.is_stack() {
        let stack_file = find_stack_file(workspace_dir, &lock)?;
        resolve_stack_files(workspace_dir, &stack_file, &stages, extra_files)
    } else {
        resolve_value_files(workspace_dir, &stages, extra_files)
    };

    let has_drift = check_drift(workspace_dir, &lock)?;

    Ok(WorkspacePlan {
        workspace_dir: workspace_dir.to_path_buf(),
        lock,
        stages,
        files,
        set_args: set_args.to_vec(),
        has_drift,
    })
}

/// stack.yaml when present, else the filename the lock names
fn find_stack_file(workspace_dir: &Path, lock: &LockSpec) -> Result<PathBuf> {
    let default = workspace_dir.join("stack.yaml");
    if default.exists() {
        return Ok(default);
    }
    if let Some(name) = &lock.stack {
        let named = workspace_dir.join(name);
        if named.exists() {
            return Ok(named);
        }
    }
    Err(WorkspaceError::StackFileNotFound {
        path: default.display().to_string(),
    })
}
