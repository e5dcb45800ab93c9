//! Rectilinear lon/lat grid.

use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

use crate::error::{GridError, Result};
use crate::smoothing::rolling_mean;

/// Values on a rectilinear grid, indexed `[lat, lon]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGrid {
    lon: Vec<f64>,
    lat: Vec<f64>,
    values: Array2<f64>,
}

impl LatLonGrid {
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, values: Array2<f64>) -> Result<Self> {
        let expected = (lat.len(), lon.len());
        if values.dim() != expected {
            return Err(GridError::ShapeMismatch {
                what: "values",
                expected,
                actual: values.dim(),
            });
        }
        Ok(Self { lon, lat, values })
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// `(rows, cols)` = `(lat.len(), lon.len())`.
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Same axes, new values.
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self> {
        Self::new(self.lon.clone(), self.lat.clone(), values)
    }

    /// Map longitudes from `[0, 360)` to `[-180, 180)` and reorder columns
    /// so longitude ascends. Grids already in `[-180, 180]` are unchanged.
    pub fn normalize_longitudes(self) -> Self {
        if !self.lon.iter().any(|&l| l > 180.0) {
            return self;
        }

        let wrapped: Vec<f64> = self
            .lon
            .iter()
            .map(|&l| (l + 180.0).rem_euclid(360.0) - 180.0)
            .collect();
        let mut order: Vec<usize> = (0..wrapped.len()).collect();
        order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));

        let lon = order.iter().map(|&i| wrapped[i]).collect();
        let values = self.values.select(Axis(1), &order);
        debug!(cols = order.len(), "Normalized longitudes to [-180, 180)");
        Self {
            lon,
            lat: self.lat,
            values,
        }
    }

    /// Centred moving average over `window_lon` x `window_lat` cells,
    /// skipping NaN, with at least one valid cell required.
    pub fn rolling_mean(&self, window_lon: usize, window_lat: usize) -> Result<Self> {
        if window_lon == 0 || window_lat == 0 {
            return Err(GridError::InvalidParameter {
                name: "window",
                reason: format!("{}x{} has an empty side", window_lon, window_lat),
            });
        }
        self.with_values(rolling_mean(self.values.view(), window_lat, window_lon))
    }

    /// Set every value outside `mask` to NaN.
    pub fn clip(&self, mask: ArrayView2<'_, bool>) -> Result<Self> {
        if mask.dim() != self.dim() {
            return Err(GridError::ShapeMismatch {
                what: "mask",
                expected: self.dim(),
                actual: mask.dim(),
            });
        }
        let mut values = self.values.clone();
        values.zip_mut_with(&mask, |v, &inside| {
            if !inside {
                *v = f64::NAN;
            }
        });
        self.with_values(values)
    }

    /// Set every row whose latitude fails `keep` to NaN.
    pub fn where_lat(&self, keep: impl Fn(f64) -> bool) -> Self {
        let mut values = self.values.clone();
        for (mut row, &lat) in values.axis_iter_mut(Axis(0)).zip(&self.lat) {
            if !keep(lat) {
                row.fill(f64::NAN);
            }
        }
        Self {
            lon: self.lon.clone(),
            lat: self.lat.clone(),
            values,
        }
    }

    /// Finite values, row-major.
    pub fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied().filter(|v| v.is_finite())
    }

    /// Cells with a value strictly greater than `threshold`. NaN is false.
    pub fn above(&self, threshold: f64) -> Array2<bool> {
        self.values.mapv(|v| v > threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> LatLonGrid {
        LatLonGrid::new(
            vec![0.0, 90.0, 180.0, 270.0],
            vec![10.0, 0.0],
            array![[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        let err = LatLonGrid::new(vec![0.0, 1.0], vec![0.0], Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { what: "values", .. }));
    }

    #[test]
    fn test_normalize_longitudes_reorders_columns() {
        let grid = sample().normalize_longitudes();
        assert_eq!(grid.lon(), &[-180.0, -90.0, 0.0, 90.0]);
        assert_eq!(grid.values(), array![[2.0, 3.0, 0.0, 1.0], [6.0, 7.0, 4.0, 5.0]]);
        assert_eq!(grid.lat(), &[10.0, 0.0]);
    }

    #[test]
    fn test_normalize_longitudes_keeps_signed_grid() {
        let grid = LatLonGrid::new(vec![-10.0, 0.0, 10.0], vec![0.0], array![[1.0, 2.0, 3.0]]).unwrap();
        assert_eq!(grid.clone().normalize_longitudes(), grid);
    }

    #[test]
    fn test_clip_and_where_lat() {
        let grid = sample();
        let mask = array![[true, false, true, false], [true, true, true, true]];
        let clipped = grid.clip(mask.view()).unwrap();
        assert!(clipped.values()[[0, 1]].is_nan());
        assert_eq!(clipped.values()[[0, 2]], 2.0);
        assert_eq!(clipped.finite_values().count(), 6);

        let north = grid.where_lat(|lat| lat > 5.0);
        assert_eq!(north.finite_values().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0]);

        let wrong = Array2::from_elem((1, 4), true);
        assert!(grid.clip(wrong.view()).is_err());
    }

    #[test]
    fn test_above_treats_nan_as_false() {
        let grid = LatLonGrid::new(vec![0.0, 1.0], vec![0.0], array![[f64::NAN, 2.0]]).unwrap();
        assert_eq!(grid.above(1.0), array![[false, true]]);
    }

    #[test]
    fn test_rolling_mean_rejects_empty_window() {
        assert!(sample().rolling_mean(0, 3).is_err());
    }
}
