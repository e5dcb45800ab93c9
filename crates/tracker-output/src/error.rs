//! Error types for the tracker-output crate.

use thiserror::Error;

/// Errors that can occur while writing tracker outputs.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
