//! Error types for the grid-fields crate.

use thiserror::Error;

/// Errors that can occur while building or decoding grids.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to decode GRIB2 data: {0}")]
    Grib2Decode(String),

    #[error("No GRIB2 message matches {0}")]
    ProductNotFound(String),

    #[error("Unsupported grid: {0}")]
    UnsupportedGrid(String),

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl From<grib::GribError> for GridError {
    fn from(err: grib::GribError) -> Self {
        Self::Grib2Decode(err.to_string())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
