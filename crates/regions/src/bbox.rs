//! Longitude/latitude boxes.

use drylines::SpatialMask;
use serde::{Deserialize, Serialize};

/// A box with optional inclusive bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LonLatBox {
    #[serde(default)]
    pub lon_min: Option<f64>,
    #[serde(default)]
    pub lon_max: Option<f64>,
    #[serde(default)]
    pub lat_min: Option<f64>,
    #[serde(default)]
    pub lat_max: Option<f64>,
}

impl LonLatBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon_min: Some(lon_min),
            lon_max: Some(lon_max),
            lat_min: Some(lat_min),
            lat_max: Some(lat_max),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.lon_min.map_or(true, |b| lon >= b)
            && self.lon_max.map_or(true, |b| lon <= b)
            && self.lat_min.map_or(true, |b| lat >= b)
            && self.lat_max.map_or(true, |b| lat <= b)
    }

    /// Cells whose centre lies in the box.
    pub fn mask(&self, lon: &[f64], lat: &[f64]) -> SpatialMask {
        SpatialMask::from_fn(lat.len(), lon.len(), |(r, c)| self.contains(lon[c], lat[r]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let b = LonLatBox::new(15.0, 30.0, -18.0, 0.0);
        assert!(b.contains(15.0, -18.0));
        assert!(b.contains(30.0, 0.0));
        assert!(!b.contains(30.25, -5.0));
        assert!(!b.contains(20.0, 0.25));
    }

    #[test]
    fn test_open_bounds() {
        let b = LonLatBox {
            lon_max: Some(30.0),
            lat_max: Some(-12.0),
            ..Default::default()
        };
        assert!(b.contains(-170.0, -80.0));
        assert!(!b.contains(31.0, -20.0));
        assert!(!b.contains(20.0, -11.0));
    }

    #[test]
    fn test_mask_orientation() {
        let lon = [0.0, 1.0, 2.0];
        let lat = [1.0, 0.0];
        let mask = LonLatBox::new(1.0, 2.0, 0.5, 2.0).mask(&lon, &lat);
        assert_eq!(mask.dim(), (2, 3));
        assert!(mask.contains(0, 1));
        assert!(mask.contains(0, 2));
        assert!(!mask.contains(0, 0));
        assert!(!mask.contains(1, 1));
    }
}
