//! Spatial masks and polygons on lon/lat grids.
//!
//! - [`LonLatBox`]: inclusive coordinate boxes with open sides
//! - [`Boundary`]: polygons from GeoJSON, strict point-in-polygon masks
//! - [`extract_polygons`]: marching-squares outlines of boolean rasters
//! - [`region_outline`]: every ring of a region as one multipolygon
//! - [`largest_region`]: the biggest 8-connected region and its statistics

pub mod bbox;
pub mod boundary;
pub mod contour;
pub mod error;
pub mod region;

pub use bbox::LonLatBox;
pub use boundary::Boundary;
pub use contour::{extract_polygons, largest_polygon, region_outline};
pub use error::{RegionError, Result};
pub use region::{largest_region, RegionStats};
