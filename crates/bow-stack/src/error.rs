//! Stack error types

use bow_chart::ChartError;
use bow_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("at least one stack file is required")]
    NoFiles,

    #[error("stack file not found: {path}")]
    FileNotFound { path: String },

    #[error("expected a YAML mapping in {path}")]
    NotAMapping { path: String },

    #[error("stack parse error: {0}")]
    Parse(String),

    #[error("reference error: {0}")]
    Ref(String),

    #[error("component '{component}': {source}")]
    ComponentChart {
        component: String,
        #[source]
        source: ChartError,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;
