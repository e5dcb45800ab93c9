//! Grid operations chained the way the heat-low and rain-belt runs use them.

use approx::assert_relative_eq;
use grid_fields::{nan_quantile, LatLonGrid};
use ndarray::Array2;
use test_utils::fixtures::grid::SOUTHERN_AFRICA_HALF_DEG;

#[test]
fn test_smooth_clip_threshold() {
    let spec = SOUTHERN_AFRICA_HALF_DEG;
    let lon = spec.lon();
    let lat = spec.lat();
    // Warm pool centred on the middle of the grid.
    let (cr, cc) = (spec.height / 2, spec.width / 2);
    let values = Array2::from_shape_fn((spec.height, spec.width), |(r, c)| {
        let d2 = (r as f64 - cr as f64).powi(2) + (c as f64 - cc as f64).powi(2);
        290.0 + 10.0 * (-d2 / 20.0).exp()
    });
    let grid = LatLonGrid::new(lon, lat, values).unwrap();

    let smooth = grid.rolling_mean(8, 8).unwrap();
    assert_eq!(smooth.dim(), grid.dim());
    assert!(smooth.values()[[cr, cc]] < grid.values()[[cr, cc]]);
    assert!(smooth.values()[[cr, cc]] > 290.0);

    let inside = Array2::from_shape_fn(grid.dim(), |(r, _)| r >= 2);
    let clipped = smooth.clip(inside.view()).unwrap();
    assert!(clipped.values().row(0).iter().all(|v| v.is_nan()));

    let threshold = nan_quantile(clipped.finite_values(), 0.95).unwrap();
    let hot = clipped.above(threshold);
    let hot_count = hot.iter().filter(|&&h| h).count();
    let finite = clipped.finite_values().count();
    assert!(hot_count > 0);
    assert!((hot_count as f64) <= 0.06 * finite as f64);
    assert!(hot[[cr, cc]]);
}

#[test]
fn test_rolling_mean_of_constant_is_constant() {
    let grid = LatLonGrid::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0, 1.0],
        Array2::from_elem((2, 3), 7.0),
    )
    .unwrap();
    let smooth = grid.rolling_mean(8, 8).unwrap();
    for &v in smooth.values().iter() {
        assert_relative_eq!(v, 7.0, epsilon = 1e-12);
    }
}
