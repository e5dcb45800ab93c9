//! Decoding tests against sample GDAS files.
//!
//! The samples are not committed; each test skips when its file is absent.

use grid_fields::{read_grib2_field, GridError, ProductSelector};
use test_utils::require_test_file;

#[test]
fn test_decode_gdas_spfh_2m() {
    let path = require_test_file!("gdas_spfh_2m.grib2");
    let grid = read_grib2_field(&path, &ProductSelector::SPFH_2M).unwrap();

    let (rows, cols) = grid.dim();
    assert_eq!(rows, grid.lat().len());
    assert_eq!(cols, grid.lon().len());
    assert!(grid.finite_values().all(|q| (0.0..0.05).contains(&q)));

    let grid = grid.normalize_longitudes();
    assert!(grid.lon().windows(2).all(|w| w[0] < w[1]));
    assert!(grid.lon().iter().all(|&l| (-180.0..180.0).contains(&l)));
}

#[test]
fn test_missing_product_is_reported() {
    let path = require_test_file!("gdas_spfh_2m.grib2");
    let err = read_grib2_field(&path, &ProductSelector::TMP_850).unwrap_err();
    assert!(matches!(err, GridError::ProductNotFound(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = read_grib2_field("/nonexistent/gdas.grib2", &ProductSelector::SPFH_2M).unwrap_err();
    assert!(matches!(err, GridError::FileRead(_)));
}
