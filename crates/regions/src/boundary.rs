//! Boundary polygons loaded from GeoJSON.

use std::path::Path;

use drylines::SpatialMask;
use geo::{BoundingRect, Contains, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{RegionError, Result};

/// The union of every polygon in a GeoJSON document.
#[derive(Debug, Clone)]
pub struct Boundary {
    parts: Vec<(Rect<f64>, Polygon<f64>)>,
}

impl Boundary {
    pub fn from_polygons(polygons: MultiPolygon<f64>) -> Self {
        let parts = polygons
            .into_iter()
            .filter_map(|p| p.bounding_rect().map(|rect| (rect, p)))
            .collect();
        Self { parts }
    }

    /// Parse a FeatureCollection, Feature or bare Geometry. Only Polygon,
    /// MultiPolygon and collections of them are accepted.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse()?;
        let mut polygons = Vec::new();
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for feature in collection.features {
                    if let Some(geometry) = feature.geometry {
                        collect_polygons(geo::Geometry::try_from(geometry)?, &mut polygons)?;
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = feature.geometry {
                    collect_polygons(geo::Geometry::try_from(geometry)?, &mut polygons)?;
                }
            }
            GeoJson::Geometry(geometry) => {
                collect_polygons(geo::Geometry::try_from(geometry)?, &mut polygons)?;
            }
        }
        if polygons.is_empty() {
            return Err(RegionError::UnsupportedGeometry(
                "document holds no polygon".to_string(),
            ));
        }
        debug!(polygons = polygons.len(), "Parsed boundary");
        Ok(Self::from_polygons(MultiPolygon::new(polygons)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let boundary = Self::from_geojson_str(&text)?;
        info!(path = %path.display(), polygons = boundary.parts.len(), "Loaded boundary");
        Ok(boundary)
    }

    pub fn polygon_count(&self) -> usize {
        self.parts.len()
    }

    /// True if the point lies strictly inside one of the polygons; points
    /// on an edge are outside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = Point::new(lon, lat);
        self.parts.iter().any(|(rect, polygon)| {
            let (min, max) = (rect.min(), rect.max());
            lon >= min.x && lon <= max.x && lat >= min.y && lat <= max.y && polygon.contains(&point)
        })
    }

    /// Cells whose centre lies strictly inside the boundary.
    pub fn mask(&self, lon: &[f64], lat: &[f64]) -> SpatialMask {
        let rows: Vec<Vec<bool>> = lat
            .par_iter()
            .map(|&y| lon.iter().map(|&x| self.contains(x, y)).collect())
            .collect();
        SpatialMask::new(Array2::from_shape_fn((lat.len(), lon.len()), |(r, c)| rows[r][c]))
    }
}

fn collect_polygons(geometry: geo::Geometry<f64>, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match geometry {
        geo::Geometry::Polygon(p) => out.push(p),
        geo::Geometry::MultiPolygon(mp) => out.extend(mp),
        geo::Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, out)?;
            }
        }
        other => {
            return Err(RegionError::UnsupportedGeometry(kind(&other).to_string()));
        }
    }
    Ok(())
}

fn kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
        _ => "unknown",
    }
}
