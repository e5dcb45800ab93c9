//! Fetch-compute-write pipelines, one per subcommand.
//!
//! Each module splits into pure functions over grids (tested on synthetic
//! fields) and an async `run` that does the downloads and writes.

pub mod drylines;
pub mod forecast;
pub mod heat_lows;
pub mod rainbelt;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ::drylines::{find_edge, DetectionParams, ScalarField, SpatialMask};
use grid_fields::{nan_mean, read_grib2_field, LatLonGrid, ProductSelector};
use ndarray::{Array2, ArrayView2};

use crate::config::RegimeConfig;

/// Source label written into tile properties.
pub const GDAS_SOURCE: &str = "NCEP GDAS 0.25°";

/// Decode one product and move it onto -180..180 longitudes.
pub fn load_field(path: &Path, selector: &ProductSelector) -> Result<LatLonGrid> {
    let grid = read_grib2_field(path, selector)
        .with_context(|| format!("Failed to decode {} from {}", selector, path.display()))?;
    Ok(grid.normalize_longitudes())
}

/// Cells a regime may occur in: its box, and Africa if it asks for it.
pub fn regime_mask(regime: &RegimeConfig, africa: &SpatialMask, lon: &[f64], lat: &[f64]) -> Result<SpatialMask> {
    let boxed = regime.region.mask(lon, lat);
    if !regime.inside_africa {
        return Ok(boxed);
    }
    africa.intersect(&boxed).ok_or_else(|| {
        anyhow!(
            "Africa mask has shape {:?}, grid has {:?}",
            africa.dim(),
            boxed.dim()
        )
    })
}

/// Run the edge detector on a single field.
pub fn detect_regime(q: &LatLonGrid, mask: &SpatialMask, params: &DetectionParams) -> Result<Array2<bool>> {
    let field = ScalarField::from(q.values().to_owned());
    let detection = find_edge(&field, q.lon(), q.lat(), params, Some(mask), None)?;
    Ok(detection.result.slice(0).to_owned())
}

/// Size and mean latitude of a detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeSummary {
    pub cells: usize,
    /// NaN when nothing was detected.
    pub mean_lat: f64,
}

impl RegimeSummary {
    pub fn of(cells: ArrayView2<'_, bool>, lat: &[f64]) -> Self {
        let lats: Vec<f64> = cells
            .indexed_iter()
            .filter(|(_, on)| **on)
            .map(|((r, _), _)| lat[r])
            .collect();
        Self {
            cells: lats.len(),
            mean_lat: nan_mean(lats).unwrap_or(f64::NAN),
        }
    }
}

/// Round half away from zero to `digits` decimals.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use regions::LonLatBox;

    #[test]
    fn test_regime_summary() {
        let cells = array![[true, false], [true, true]];
        let summary = RegimeSummary::of(cells.view(), &[-10.0, -11.0]);
        assert_eq!(summary.cells, 3);
        assert!((summary.mean_lat - (-32.0 / 3.0)).abs() < 1e-12);

        let none = RegimeSummary::of(Array2::from_elem((2, 2), false).view(), &[0.0, 1.0]);
        assert_eq!(none.cells, 0);
        assert!(none.mean_lat.is_nan());
    }

    #[test]
    fn test_regime_mask_respects_africa_flag() {
        let lon = [10.0, 20.0, 30.0];
        let lat = [0.0, -10.0];
        let africa = SpatialMask::new(array![[false, true, true], [true, true, false]]);
        let mut regime = RegimeConfig::cab();
        regime.region = LonLatBox::new(15.0, 30.0, -18.0, 0.0);

        let mask = regime_mask(&regime, &africa, &lon, &lat).unwrap();
        assert_eq!(mask.view(), array![[false, true, true], [false, true, false]]);

        regime.inside_africa = false;
        let mask = regime_mask(&regime, &africa, &lon, &lat).unwrap();
        assert_eq!(mask.count(), 4);

        regime.inside_africa = true;
        let small = SpatialMask::all(1, 3);
        assert!(regime_mask(&regime, &small, &lon, &lat).is_err());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(21.123456, 4), 21.1235);
        assert_eq!(round_to(-19.25, 4), -19.25);
        assert_eq!(round_to(301.4567, 3), 301.457);
    }
}
