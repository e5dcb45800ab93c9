//! Statistics of the largest connected region of a boolean raster.

use drylines::{label_components, Connectivity};
use ndarray::{Array2, ArrayView2};

use crate::error::{check_shape, Result};

/// The largest 8-connected region of a mask and what lies under it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStats {
    pub mask: Array2<bool>,
    pub cells: usize,
    /// Mean of the finite values under the region, NaN if there are none.
    pub mean_value: f64,
    /// Mean cell-centre latitude. On a regular grid this is the centroid
    /// latitude of the union of the region's cells.
    pub mean_lat: f64,
    pub mean_lon: f64,
}

/// Find the largest 8-connected region of `mask` (lowest label on ties)
/// and summarise `values` over it. `None` when `mask` is all false.
pub fn largest_region(
    mask: ArrayView2<'_, bool>,
    values: ArrayView2<'_, f64>,
    lon: &[f64],
    lat: &[f64],
) -> Result<Option<RegionStats>> {
    check_shape("mask", mask.dim(), lon, lat)?;
    check_shape("values", values.dim(), lon, lat)?;

    let labels = label_components(mask, Connectivity::Eight);
    let Some(label) = labels.largest() else {
        return Ok(None);
    };
    let region = labels.mask_of(label);

    let mut cells = 0usize;
    let (mut lat_sum, mut lon_sum) = (0.0, 0.0);
    let (mut value_sum, mut value_count) = (0.0, 0usize);
    for ((r, c), _) in region.indexed_iter().filter(|(_, inside)| **inside) {
        cells += 1;
        lat_sum += lat[r];
        lon_sum += lon[c];
        let v = values[[r, c]];
        if v.is_finite() {
            value_sum += v;
            value_count += 1;
        }
    }

    let mean_value = if value_count > 0 {
        value_sum / value_count as f64
    } else {
        f64::NAN
    };
    Ok(Some(RegionStats {
        mask: region,
        cells,
        mean_value,
        mean_lat: lat_sum / cells as f64,
        mean_lon: lon_sum / cells as f64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_largest_region_stats() {
        let mask = array![
            [true, false, false, false],
            [false, false, true, true],
            [false, false, false, true],
        ];
        let values = array![
            [100.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 300.0, 302.0],
            [0.0, 0.0, 0.0, 304.0],
        ];
        let lon = [0.0, 1.0, 2.0, 3.0];
        let lat = [10.0, 9.0, 8.0];

        let stats = largest_region(mask.view(), values.view(), &lon, &lat).unwrap().unwrap();
        assert_eq!(stats.cells, 3);
        assert_relative_eq!(stats.mean_value, 302.0);
        assert_relative_eq!(stats.mean_lat, (9.0 + 9.0 + 8.0) / 3.0);
        assert_relative_eq!(stats.mean_lon, (2.0 + 3.0 + 3.0) / 3.0);
        assert!(!stats.mask[[0, 0]]);
    }

    #[test]
    fn test_diagonal_neighbours_join() {
        let mask = array![[true, false], [false, true]];
        let values = array![[1.0, 0.0], [0.0, 3.0]];
        let stats = largest_region(mask.view(), values.view(), &[0.0, 1.0], &[0.0, 1.0])
            .unwrap()
            .unwrap();
        assert_eq!(stats.cells, 2);
        assert_relative_eq!(stats.mean_value, 2.0);
    }

    #[test]
    fn test_empty_mask() {
        let mask = Array2::from_elem((2, 2), false);
        let values = Array2::zeros((2, 2));
        assert!(largest_region(mask.view(), values.view(), &[0.0, 1.0], &[0.0, 1.0])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_shape_mismatch() {
        let mask = Array2::from_elem((2, 2), true);
        let values = Array2::zeros((2, 3));
        assert!(largest_region(mask.view(), values.view(), &[0.0, 1.0], &[0.0, 1.0]).is_err());
    }
}
