//! Gridded meteorological fields on rectilinear lon/lat grids.
//!
//! Decodes single products out of GRIB2 files (GDAS/GEFS pressure-level
//! and near-surface fields) and provides the array operations the tracker
//! pipelines apply before detection: longitude normalisation, NaN-aware
//! smoothing, quantiles, masking and specific-humidity derivation.

pub mod error;
pub mod grib;
pub mod grid;
pub mod humidity;
pub mod smoothing;
pub mod stats;

pub use error::{GridError, Result};
pub use grib::{decode_grib2_field, level_types, read_grib2_field, ProductSelector};
pub use grid::LatLonGrid;
pub use humidity::{saturation_vapour_pressure, specific_humidity, specific_humidity_field};
pub use smoothing::rolling_mean;
pub use stats::{nan_mean, nan_quantile};
