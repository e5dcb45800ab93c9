//! GeoJSON feature collections.

use std::io::Write;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use ndarray::ArrayView2;
use tracing::info;

use crate::error::{OutputError, Result};
use crate::fs::create;

/// Collects one `Point` feature per true cell of named boolean layers.
///
/// Every feature carries `{"source": <layer name>, "date": <date>}`.
#[derive(Debug, Clone)]
pub struct PointCollectionWriter {
    date: String,
    features: Vec<Feature>,
}

impl PointCollectionWriter {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            features: Vec::new(),
        }
    }

    /// Add the true cells of `cells` in row-major order. Returns how many
    /// points the layer contributed.
    pub fn add_layer(&mut self, source: &str, cells: ArrayView2<'_, bool>, lon: &[f64], lat: &[f64]) -> Result<usize> {
        let expected = (lat.len(), lon.len());
        if cells.dim() != expected {
            return Err(OutputError::ShapeMismatch {
                what: format!("layer '{}'", source),
                expected,
                actual: cells.dim(),
            });
        }

        let before = self.features.len();
        for ((r, c), _) in cells.indexed_iter().filter(|(_, on)| **on) {
            let mut properties = JsonObject::new();
            properties.insert("source".to_string(), JsonValue::from(source));
            properties.insert("date".to_string(), JsonValue::from(self.date.as_str()));
            self.features.push(feature(Value::Point(vec![lon[c], lat[r]]), properties));
        }
        Ok(self.features.len() - before)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Write every collected point as one FeatureCollection. Returns the
    /// number of features written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        write_collection(path, self.features.clone())?;
        info!(path = %path.display(), features = self.features.len(), "Wrote point collection");
        Ok(self.features.len())
    }
}

/// Write `geometry` (a polygon or multipolygon) as a single-feature
/// collection to every path in `paths`.
pub fn write_polygon_collection<G, P>(geometry: G, properties: JsonObject, paths: &[P]) -> Result<()>
where
    G: Into<geo::Geometry<f64>>,
    P: AsRef<Path>,
{
    let geometry: geo::Geometry<f64> = geometry.into();
    let feature = feature(Value::from(&geometry), properties);
    for path in paths {
        let path = path.as_ref();
        write_collection(path, vec![feature.clone()])?;
        info!(path = %path.display(), "Wrote polygon collection");
    }
    Ok(())
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn write_collection(path: &Path, features: Vec<Feature>) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, &collection)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use geojson::GeoJson;
    use ndarray::array;

    fn read(path: &Path) -> FeatureCollection {
        let text = std::fs::read_to_string(path).unwrap();
        match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            other => panic!("expected a FeatureCollection, got {:?}", other),
        }
    }

    #[test]
    fn test_points_per_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles").join("drylines.geojson");
        let lon = [10.0, 10.25, 10.5];
        let lat = [0.0, -0.25];

        let mut writer = PointCollectionWriter::new("2025-10-21");
        let cab = array![[false, true, false], [false, true, true]];
        let kd = array![[false, false, false], [false, false, false]];
        assert_eq!(writer.add_layer("cab", cab.view(), &lon, &lat).unwrap(), 3);
        assert_eq!(writer.add_layer("kd", kd.view(), &lon, &lat).unwrap(), 0);
        assert_eq!(writer.write(&path).unwrap(), 3);

        let fc = read(&path);
        assert_eq!(fc.features.len(), 3);
        let first = &fc.features[0];
        assert_eq!(first.property("source").unwrap(), "cab");
        assert_eq!(first.property("date").unwrap(), "2025-10-21");
        match &first.geometry.as_ref().unwrap().value {
            Value::Point(coords) => assert_eq!(coords, &vec![10.25, 0.0]),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_empty_collection_is_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drylines.geojson");
        let writer = PointCollectionWriter::new("2025-10-21");
        assert!(writer.is_empty());
        assert_eq!(writer.write(&path).unwrap(), 0);
        assert!(read(&path).features.is_empty());
    }

    #[test]
    fn test_layer_shape_is_checked() {
        let mut writer = PointCollectionWriter::new("2025-10-21");
        let cells = array![[true, false]];
        assert!(writer.add_layer("cab", cells.view(), &[0.0], &[0.0]).is_err());
    }

    #[test]
    fn test_polygon_written_to_every_path() {
        let dir = tempfile::tempdir().unwrap();
        let dated = dir.path().join("belt_2025102100.geojson");
        let latest = dir.path().join("belt_latest.geojson");
        let poly = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 0.0)];
        let mut properties = JsonObject::new();
        properties.insert("threshold".to_string(), JsonValue::from(0.01));

        write_polygon_collection(poly, properties, &[&dated, &latest]).unwrap();

        for path in [&dated, &latest] {
            let fc = read(path);
            assert_eq!(fc.features.len(), 1);
            assert_eq!(fc.features[0].property("threshold").unwrap(), 0.01);
            assert!(matches!(
                fc.features[0].geometry.as_ref().unwrap().value,
                Value::Polygon(_)
            ));
        }
    }

    #[test]
    fn test_multipolygon_keeps_every_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("north_heat_low.geojson");
        let parts = MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)],
            polygon![(x: 2.0, y: 2.0), (x: 3.0, y: 2.0), (x: 3.0, y: 3.0), (x: 2.0, y: 2.0)],
        ]);

        write_polygon_collection(parts, JsonObject::new(), &[&path]).unwrap();

        let fc = read(&path);
        match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polygons) => assert_eq!(polygons.len(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
