//! Error types for edge and ridge detection.

use thiserror::Error;

/// Errors raised by the detectors before any slice is processed.
///
/// An empty detection is not an error; it is an all-false [`crate::ResultField`].
#[derive(Error, Debug)]
pub enum DrylineError {
    /// A coordinate axis is too short or not strictly monotonic.
    #[error("invalid grid: {axis} axis {reason}")]
    InvalidGrid { axis: &'static str, reason: String },

    /// Field, mask or coordinate dimensions disagree.
    #[error("shape mismatch: {what} is {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A detection parameter is out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The diagnostic sink failed to record a frame.
    #[error("diagnostics error: {0}")]
    Diagnostics(String),
}

impl DrylineError {
    pub fn invalid_grid(axis: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidGrid {
            axis,
            reason: reason.into(),
        }
    }

    pub fn shape_mismatch(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for DrylineError {
    fn from(err: image::ImageError) -> Self {
        Self::Diagnostics(err.to_string())
    }
}

impl From<std::io::Error> for DrylineError {
    fn from(err: std::io::Error) -> Self {
        Self::Diagnostics(err.to_string())
    }
}

/// Result type for detector operations.
pub type Result<T> = std::result::Result<T, DrylineError>;
