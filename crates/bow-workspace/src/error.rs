//! Workspace error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("lock file not found: {path}")]
    LockNotFound { path: String },

    #[error("invalid lock file: {0}")]
    LockInvalid(String),

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("stack file not found: {path}")]
    StackFileNotFound { path: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;
