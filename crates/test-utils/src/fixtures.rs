//! Common test fixtures.
//!
//! Grids and boundaries shaped like the ones the tracker works with.

/// Common grid specifications for testing.
pub mod grid {
    /// Grid specification: first coordinate and signed step per axis.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub lon0: f64,
        pub dlon: f64,
        pub lat0: f64,
        pub dlat: f64,
    }

    impl GridSpec {
        pub fn lon(&self) -> Vec<f64> {
            crate::uniform_axis(self.lon0, self.dlon, self.width)
        }

        pub fn lat(&self) -> Vec<f64> {
            crate::uniform_axis(self.lat0, self.dlat, self.height)
        }
    }

    /// Africa at 1 degree, latitude north to south as in GDAS files.
    pub const AFRICA_1DEG: GridSpec = GridSpec {
        width: 76,
        height: 81,
        lon0: -20.0,
        dlon: 1.0,
        lat0: 40.0,
        dlat: -1.0,
    };

    /// Southern Africa at 0.5 degree.
    pub const SOUTHERN_AFRICA_HALF_DEG: GridSpec = GridSpec {
        width: 81,
        height: 81,
        lon0: 5.0,
        dlon: 0.5,
        lat0: 0.0,
        dlat: -0.5,
    };
}

/// Boundary documents for mask tests.
pub mod boundaries {
    /// A FeatureCollection holding one square polygon, lon 0..10, lat 0..10.
    pub const SQUARE_10: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"name": "square"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
      }
    }
  ]
}"#;

    /// A coarse outline of the African continent.
    pub const AFRICA_COARSE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {"name": "africa"},
      "geometry": {
        "type": "Polygon",
        "coordinates": [[
          [-17.5, 14.7], [-16.0, 24.0], [-9.8, 31.0], [-5.9, 35.8], [10.0, 37.3],
          [11.0, 33.0], [20.0, 30.5], [32.3, 31.3], [34.2, 27.8], [43.3, 12.6],
          [51.3, 11.8], [39.5, -4.7], [40.5, -15.0], [35.5, -24.0], [32.9, -26.0],
          [30.0, -31.3], [20.0, -34.8], [18.4, -34.3], [15.0, -27.0], [11.8, -17.3],
          [13.5, -10.0], [8.8, -1.0], [9.4, 3.5], [4.0, 6.3], [-7.5, 4.4],
          [-13.2, 8.5], [-17.5, 14.7]
        ]]
      }
    }
  ]
}"#;
}
