//! Moisture variables derived from temperature and relative humidity.

use ndarray::{Array2, ArrayView2, Zip};

use crate::error::{GridError, Result};

/// Ratio of the gas constants of dry air and water vapour.
pub const EPSILON: f64 = 0.622;

/// Saturation vapour pressure in hPa over water (Bolton 1980).
pub fn saturation_vapour_pressure(t_kelvin: f64) -> f64 {
    6.112 * (17.67 * (t_kelvin - 273.15) / (t_kelvin - 29.65)).exp()
}

/// Specific humidity in kg/kg from temperature (K), relative humidity (%)
/// and pressure (hPa).
pub fn specific_humidity(t_kelvin: f64, rh_percent: f64, p_hpa: f64) -> f64 {
    let e = rh_percent / 100.0 * saturation_vapour_pressure(t_kelvin);
    EPSILON * e / (p_hpa - (1.0 - EPSILON) * e)
}

/// [`specific_humidity`] cell by cell on one pressure level.
pub fn specific_humidity_field(
    t_kelvin: ArrayView2<'_, f64>,
    rh_percent: ArrayView2<'_, f64>,
    p_hpa: f64,
) -> Result<Array2<f64>> {
    if t_kelvin.dim() != rh_percent.dim() {
        return Err(GridError::ShapeMismatch {
            what: "relative humidity",
            expected: t_kelvin.dim(),
            actual: rh_percent.dim(),
        });
    }
    Ok(Zip::from(&t_kelvin)
        .and(&rh_percent)
        .map_collect(|&t, &rh| specific_humidity(t, rh, p_hpa)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_saturation_at_freezing() {
        assert_relative_eq!(saturation_vapour_pressure(273.15), 6.112);
    }

    #[test]
    fn test_specific_humidity_warm_saturated() {
        let q = specific_humidity(293.15, 100.0, 1000.0);
        assert_relative_eq!(q, 0.014665, epsilon = 1e-5);
        assert_relative_eq!(specific_humidity(293.15, 0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_field_matches_scalar() {
        let t = array![[280.0, 290.0], [300.0, 310.0]];
        let rh = array![[50.0, 60.0], [70.0, 80.0]];
        let q = specific_humidity_field(t.view(), rh.view(), 850.0).unwrap();
        assert_relative_eq!(q[[1, 0]], specific_humidity(300.0, 70.0, 850.0));

        let short = array![[50.0, 60.0]];
        assert!(specific_humidity_field(t.view(), short.view(), 850.0).is_err());
    }
}
