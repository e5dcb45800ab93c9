//! GRIB2 decoding into [`LatLonGrid`].
//!
//! A product is picked by fixed codes (discipline, parameter category and
//! number, first fixed surface) rather than by name lookup tables.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info};

use crate::error::{GridError, Result};
use crate::grid::LatLonGrid;

/// GRIB2 fixed surface type codes (code table 4.5).
pub mod level_types {
    /// Isobaric level, value in Pa
    pub const ISOBARIC: u8 = 100;
    /// Height above ground, value in m
    pub const HEIGHT_ABOVE_GROUND: u8 = 103;
}

/// Fixed codes identifying one GRIB2 product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductSelector {
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    pub surface_type: u8,
    /// Surface value in SI units (Pa, m); `None` accepts any value.
    pub surface_value: Option<f64>,
}

impl ProductSelector {
    /// Specific humidity (SPFH) at 2 m above ground.
    pub const SPFH_2M: Self = Self::meteorological(1, 0, level_types::HEIGHT_ABOVE_GROUND, 2.0);

    /// Specific humidity (SPFH) at 850 hPa.
    pub const SPFH_850: Self = Self::meteorological(1, 0, level_types::ISOBARIC, 85000.0);

    /// Temperature (TMP) at 850 hPa.
    pub const TMP_850: Self = Self::meteorological(0, 0, level_types::ISOBARIC, 85000.0);

    /// Relative humidity (RH) at 850 hPa.
    pub const RH_850: Self = Self::meteorological(1, 1, level_types::ISOBARIC, 85000.0);

    const fn meteorological(category: u8, number: u8, surface_type: u8, value: f64) -> Self {
        Self {
            discipline: 0,
            category,
            number,
            surface_type,
            surface_value: Some(value),
        }
    }

    fn matches_surface(&self, surface_type: u8, value: f64) -> bool {
        if surface_type != self.surface_type {
            return false;
        }
        match self.surface_value {
            Some(expected) => (value - expected).abs() <= 1e-6 * expected.abs().max(1.0),
            None => true,
        }
    }
}

impl fmt::Display for ProductSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discipline {} category {} number {} on surface {}",
            self.discipline, self.category, self.number, self.surface_type
        )?;
        if let Some(value) = self.surface_value {
            write!(f, " at {}", value)?;
        }
        Ok(())
    }
}

/// Decode the first message in the file at `path` that matches `selector`.
pub fn read_grib2_field(path: impl AsRef<Path>, selector: &ProductSelector) -> Result<LatLonGrid> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let grid = decode_grib2_field(BufReader::new(file), selector)?;
    info!(
        path = %path.display(),
        product = %selector,
        rows = grid.dim().0,
        cols = grid.dim().1,
        "Decoded GRIB2 field"
    );
    Ok(grid)
}

/// Decode the first message read from `reader` that matches `selector`.
///
/// Only regular lat/lon grids are supported; missing points decode to NaN.
pub fn decode_grib2_field<R: Read + Seek>(reader: R, selector: &ProductSelector) -> Result<LatLonGrid> {
    let grib2 = grib::from_reader(reader)?;

    for (index, submessage) in grib2.iter() {
        if submessage.indicator().discipline != selector.discipline {
            continue;
        }
        let prod_def = submessage.prod_def();
        if prod_def.parameter_category() != Some(selector.category)
            || prod_def.parameter_number() != Some(selector.number)
        {
            continue;
        }
        let Some((surface, _)) = prod_def.fixed_surfaces() else {
            continue;
        };
        if !selector.matches_surface(surface.surface_type, surface.value()) {
            continue;
        }

        debug!(message = ?index, product = %selector, "Matched GRIB2 submessage");

        let (ni, nj) = submessage.grid_shape()?;
        let latlons: Vec<(f32, f32)> = submessage.latlons()?.collect();
        let values: Vec<f64> = grib::Grib2SubmessageDecoder::from(submessage)?
            .dispatch()?
            .map(f64::from)
            .collect();

        return grid_from_points(ni, nj, &latlons, values);
    }

    Err(GridError::ProductNotFound(selector.to_string()))
}

/// Build a grid from scan-ordered points, longitude varying fastest.
fn grid_from_points(ni: usize, nj: usize, latlons: &[(f32, f32)], values: Vec<f64>) -> Result<LatLonGrid> {
    if ni < 2 || nj < 2 {
        return Err(GridError::UnsupportedGrid(format!("{}x{} points", ni, nj)));
    }
    if latlons.len() != ni * nj || values.len() != ni * nj {
        return Err(GridError::UnsupportedGrid(format!(
            "{} coordinates and {} values for a {}x{} grid",
            latlons.len(),
            values.len(),
            ni,
            nj
        )));
    }

    let lon: Vec<f64> = latlons[..ni].iter().map(|&(_, lon)| f64::from(lon)).collect();
    let lat: Vec<f64> = latlons.iter().step_by(ni).map(|&(lat, _)| f64::from(lat)).collect();

    // A regular grid repeats the first row's longitudes on every row.
    let regular = latlons
        .chunks(ni)
        .all(|row| row.iter().zip(&lon).all(|(&(_, l), &l0)| (f64::from(l) - l0).abs() < 1e-4));
    if !regular {
        return Err(GridError::UnsupportedGrid(
            "longitudes vary between rows".to_string(),
        ));
    }

    let values = Array2::from_shape_vec((nj, ni), values)
        .map_err(|e| GridError::UnsupportedGrid(e.to_string()))?;
    LatLonGrid::new(lon, lat, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_surface_match() {
        let s = ProductSelector::TMP_850;
        assert!(s.matches_surface(100, 85000.0));
        assert!(!s.matches_surface(100, 50000.0));
        assert!(!s.matches_surface(103, 85000.0));

        let any = ProductSelector {
            surface_value: None,
            ..ProductSelector::SPFH_2M
        };
        assert!(any.matches_surface(103, 10.0));
    }

    #[test]
    fn test_selector_display() {
        assert_eq!(
            ProductSelector::SPFH_2M.to_string(),
            "discipline 0 category 1 number 0 on surface 103 at 2"
        );
    }

    #[test]
    fn test_grid_from_points() {
        let latlons = [(10.0, 0.0), (10.0, 1.0), (10.0, 2.0), (9.0, 0.0), (9.0, 1.0), (9.0, 2.0)];
        let grid = grid_from_points(3, 2, &latlons, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(grid.lon(), &[0.0, 1.0, 2.0]);
        assert_eq!(grid.lat(), &[10.0, 9.0]);
        assert_eq!(grid.values()[[1, 0]], 4.0);
    }

    #[test]
    fn test_grid_from_points_rejects_irregular() {
        let latlons = [(10.0, 0.0), (10.0, 1.0), (9.0, 0.5), (9.0, 1.5)];
        assert!(grid_from_points(2, 2, &latlons, vec![0.0; 4]).is_err());
        assert!(grid_from_points(2, 2, &latlons[..3], vec![0.0; 4]).is_err());
    }
}
