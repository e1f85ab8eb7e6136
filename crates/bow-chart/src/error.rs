//! Chart error types

use bow_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("chart '{name}' not found. {hint}")]
    NotFound { name: String, hint: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, ChartError>;
