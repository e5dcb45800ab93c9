//! Error types for the regions crate.

use thiserror::Error;

/// Errors that can occur while building masks and polygons.
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Failed to read boundary: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse GeoJSON: {0}")]
    GeoJson(String),

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl From<geojson::Error> for RegionError {
    fn from(err: geojson::Error) -> Self {
        Self::GeoJson(err.to_string())
    }
}

/// Result type for region operations.
pub type Result<T> = std::result::Result<T, RegionError>;

pub(crate) fn check_shape(what: &'static str, actual: (usize, usize), lon: &[f64], lat: &[f64]) -> Result<()> {
    let expected = (lat.len(), lon.len());
    if actual != expected {
        return Err(RegionError::ShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
