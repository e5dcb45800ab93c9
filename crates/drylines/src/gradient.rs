//! Finite-difference gradients on rectilinear lon/lat grids.
//!
//! Interior cells use centred differences, boundary cells one-sided
//! differences, so every output has the shape of its input.
//!
//! Two scalings are supported:
//!
//! - [`GradientMode::GridCell`]: differences per grid step. Thresholds such
//!   as `mag_min = 0.003` are tuned against this mode.
//! - [`GradientMode::Degree`]: differences per degree of arc, with the
//!   longitude spacing scaled by `cos(latitude)`.
//!
//! In both modes the result is oriented geographically: `ddx` is positive
//! when the field increases eastward and `ddy` when it increases northward,
//! whatever the storage order of the coordinate arrays. A direction of `0`
//! points east and `π/2` points north.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{DrylineError, Result};

/// Smallest `cos(latitude)` used when scaling longitude spacing.
const MIN_COS_LAT: f64 = 1e-6;

/// How differences are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Differences per grid step ("Grid Cell").
    #[default]
    GridCell,
    /// Differences per degree of arc.
    Degree,
}

impl fmt::Display for GradientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridCell => write!(f, "Grid Cell"),
            Self::Degree => write!(f, "Degree"),
        }
    }
}

impl FromStr for GradientMode {
    type Err = DrylineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "grid cell" | "gridcell" | "cell" => Ok(Self::GridCell),
            "degree" | "degrees" | "geodesic" => Ok(Self::Degree),
            other => Err(DrylineError::invalid_parameter(
                "relative",
                format!("unknown gradient mode '{}'", other),
            )),
        }
    }
}

/// Check a coordinate axis: at least two points, strictly monotonic.
pub(crate) fn validate_axis(axis: &'static str, coords: &[f64]) -> Result<()> {
    if coords.len() < 2 {
        return Err(DrylineError::invalid_grid(
            axis,
            format!("has {} point(s), at least 2 required", coords.len()),
        ));
    }
    let ascending = coords[1] > coords[0];
    let monotonic = coords.windows(2).all(|w| {
        if ascending {
            w[1] > w[0]
        } else {
            w[1] < w[0]
        }
    });
    if !monotonic {
        return Err(DrylineError::invalid_grid(axis, "is not strictly monotonic"));
    }
    Ok(())
}

/// Check that `field` is `(lat.len(), lon.len())` and both axes are valid.
pub(crate) fn validate_grid(field: (usize, usize), lon: &[f64], lat: &[f64]) -> Result<()> {
    validate_axis("longitude", lon)?;
    validate_axis("latitude", lat)?;
    let expected = (lat.len(), lon.len());
    if field != expected {
        return Err(DrylineError::shape_mismatch("field", expected, field));
    }
    Ok(())
}

/// Difference at `i` of a sequence of length `n >= 2`, and the pair of
/// indices it spans. Centred in the interior, one-sided at the ends.
#[inline]
fn stencil(n: usize, i: usize) -> (usize, usize, f64) {
    if i == 0 {
        (0, 1, 1.0)
    } else if i == n - 1 {
        (n - 2, n - 1, 1.0)
    } else {
        (i - 1, i + 1, 2.0)
    }
}

#[inline]
fn axis_sign(coords: &[f64]) -> f64 {
    if coords[1] > coords[0] {
        1.0
    } else {
        -1.0
    }
}

/// Partial derivative along the longitude (column) axis.
pub fn ddx(field: ArrayView2<'_, f64>, lon: &[f64], lat: &[f64], mode: GradientMode) -> Result<Array2<f64>> {
    validate_grid(field.dim(), lon, lat)?;
    Ok(ddx_unchecked(field, lon, lat, mode))
}

/// Partial derivative along the latitude (row) axis.
pub fn ddy(field: ArrayView2<'_, f64>, lon: &[f64], lat: &[f64], mode: GradientMode) -> Result<Array2<f64>> {
    validate_grid(field.dim(), lon, lat)?;
    Ok(ddy_unchecked(field, lat, mode))
}

/// Gradient direction (radians, `(-π, π]`) and magnitude at every cell.
pub fn dxdy(
    field: ArrayView2<'_, f64>,
    lon: &[f64],
    lat: &[f64],
    mode: GradientMode,
) -> Result<(Array2<f64>, Array2<f64>)> {
    validate_grid(field.dim(), lon, lat)?;
    Ok(dxdy_unchecked(field, lon, lat, mode))
}

pub(crate) fn ddx_unchecked(
    field: ArrayView2<'_, f64>,
    lon: &[f64],
    lat: &[f64],
    mode: GradientMode,
) -> Array2<f64> {
    let (rows, cols) = field.dim();
    let sign = axis_sign(lon);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (lo, hi, steps) = stencil(cols, c);
        let diff = field[[r, hi]] - field[[r, lo]];
        match mode {
            GradientMode::GridCell => sign * diff / steps,
            GradientMode::Degree => {
                let cos_lat = lat[r].to_radians().cos().abs().max(MIN_COS_LAT);
                diff / ((lon[hi] - lon[lo]) * cos_lat)
            }
        }
    })
}

pub(crate) fn ddy_unchecked(field: ArrayView2<'_, f64>, lat: &[f64], mode: GradientMode) -> Array2<f64> {
    let (rows, cols) = field.dim();
    let sign = axis_sign(lat);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (lo, hi, steps) = stencil(rows, r);
        let diff = field[[hi, c]] - field[[lo, c]];
        match mode {
            GradientMode::GridCell => sign * diff / steps,
            GradientMode::Degree => diff / (lat[hi] - lat[lo]),
        }
    })
}

pub(crate) fn dxdy_unchecked(
    field: ArrayView2<'_, f64>,
    lon: &[f64],
    lat: &[f64],
    mode: GradientMode,
) -> (Array2<f64>, Array2<f64>) {
    let gx = ddx_unchecked(field, lon, lat, mode);
    let gy = ddy_unchecked(field, lat, mode);

    let mut direction = Array2::zeros(gx.dim());
    let mut magnitude = Array2::zeros(gx.dim());
    ndarray::Zip::from(&mut direction)
        .and(&mut magnitude)
        .and(&gx)
        .and(&gy)
        .for_each(|d, m, &x, &y| {
            *d = direction_of(x, y);
            *m = x.hypot(y);
        });
    (direction, magnitude)
}

/// `atan2(dy, dx)` folded into `(-π, π]`.
#[inline]
pub fn direction_of(dx: f64, dy: f64) -> f64 {
    let angle = dy.atan2(dx);
    if angle <= -PI {
        angle + 2.0 * PI
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_ramp_in_longitude() {
        let field = Array2::from_shape_fn((4, 5), |(_, c)| c as f64);
        let (lon, lat) = (axis(5), axis(4));
        let (direction, magnitude) = dxdy(field.view(), &lon, &lat, GradientMode::GridCell).unwrap();
        for (&d, &m) in direction.iter().zip(magnitude.iter()) {
            assert_relative_eq!(d, 0.0);
            assert_relative_eq!(m, 1.0);
        }
    }

    #[test]
    fn test_boundary_uses_one_sided_difference() {
        let field = Array2::from_shape_fn((3, 4), |(_, c)| (c * c) as f64);
        let gx = ddx(field.view(), &axis(4), &axis(3), GradientMode::GridCell).unwrap();
        assert_relative_eq!(gx[[0, 0]], 1.0);
        assert_relative_eq!(gx[[0, 1]], 2.0);
        assert_relative_eq!(gx[[0, 3]], 5.0);
    }

    #[test]
    fn test_descending_latitude_points_north() {
        // Rows run north to south, value grows northward.
        let lat = vec![10.0, 9.0, 8.0, 7.0];
        let field = Array2::from_shape_fn((4, 3), |(r, _)| lat[r]);
        let gy = ddy(field.view(), &axis(3), &lat, GradientMode::GridCell).unwrap();
        assert!(gy.iter().all(|&v| (v - 1.0).abs() < 1e-12));

        let gy_deg = ddy(field.view(), &axis(3), &lat, GradientMode::Degree).unwrap();
        assert!(gy_deg.iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_degree_mode_scales_by_spacing_and_latitude() {
        let lon = vec![0.0, 0.5, 1.0, 1.5];
        let lat = vec![60.0, 60.5];
        let field = Array2::from_shape_fn((2, 4), |(_, c)| c as f64);
        let gx = ddx(field.view(), &lon, &lat, GradientMode::Degree).unwrap();
        let expected = 2.0 / 60.0_f64.to_radians().cos();
        assert_relative_eq!(gx[[0, 1]], expected, epsilon = 1e-9);
    }

    #[test]
    fn test_direction_range() {
        assert_relative_eq!(direction_of(-1.0, -0.0), PI);
        assert_relative_eq!(direction_of(-1.0, 0.0), PI);
        assert_relative_eq!(direction_of(0.0, 1.0), PI / 2.0);
    }

    #[test]
    fn test_short_axis_is_invalid_grid() {
        let field = Array2::<f64>::zeros((1, 3));
        let err = dxdy(field.view(), &axis(3), &[0.0], GradientMode::GridCell).unwrap_err();
        assert!(matches!(err, DrylineError::InvalidGrid { axis: "latitude", .. }));
    }

    #[test]
    fn test_non_monotonic_axis_is_invalid_grid() {
        let field = Array2::<f64>::zeros((2, 3));
        let err = ddx(field.view(), &[0.0, 2.0, 1.0], &axis(2), GradientMode::GridCell).unwrap_err();
        assert!(matches!(err, DrylineError::InvalidGrid { axis: "longitude", .. }));
    }

    #[test]
    fn test_coordinate_length_mismatch() {
        let field = Array2::<f64>::zeros((3, 3));
        let err = ddy(field.view(), &axis(4), &axis(3), GradientMode::GridCell).unwrap_err();
        assert!(matches!(err, DrylineError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Grid Cell".parse::<GradientMode>().unwrap(), GradientMode::GridCell);
        assert_eq!("grid_cell".parse::<GradientMode>().unwrap(), GradientMode::GridCell);
        assert_eq!("degree".parse::<GradientMode>().unwrap(), GradientMode::Degree);
        assert!("metres".parse::<GradientMode>().is_err());
    }
}
