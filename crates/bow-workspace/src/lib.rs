//! Bow Workspace - bow.lock management, stage overlays and drift detection
//!
//! A workspace is a directory holding a bow.lock plus values and stack
//! files. The resolver turns it into a deploy plan: target, stages,
//! ordered file list and a drift flag.

pub mod error;
pub mod lock;
pub mod resolver;
pub mod stage;

pub use error::{Result, WorkspaceError};
pub use lock::{check_drift, compute_checksum, parse_lock, write_lock, LockSpec, LOCK_FILE};
pub use resolver::{resolve_workspace, WorkspacePlan, STAGE_ENV_VAR};
pub use stage::{resolve_stack_files, resolve_stages, resolve_value_files};
