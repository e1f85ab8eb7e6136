//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{leaf} must be used inside {expected} scope")]
    ScopeMismatch {
        leaf: &'static str,
        expected: &'static str,
    },

    #[error("a {parent} scope cannot adopt a {child}")]
    Adoption {
        child: &'static str,
        parent: &'static str,
    },

    #[error("unknown probe type '{kind}', expected liveness, readiness or startup")]
    UnknownProbe { kind: String },

    #[error("invalid --set format: '{arg}' (expected key=value)")]
    InvalidOverride { arg: String },

    #[error("values file not found: {path}")]
    ValuesFileNotFound { path: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
