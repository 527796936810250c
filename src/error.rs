use std::path::PathBuf;

#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Data file not found: {}", .0.display())]
    DataFileNotFound(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Malformed value in column '{column}' at row {row}: '{value}'")]
    MalformedField {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<ChurnError> for PyErr {
    fn from(err: ChurnError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}
