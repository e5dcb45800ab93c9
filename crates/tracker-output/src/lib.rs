//! Files the tracker publishes: GeoJSON tiles for the map front end and
//! CSV tables for the history and forecast charts.

pub mod ensemble;
pub mod error;
mod fs;
pub mod geojson_out;
pub mod history;

pub use ensemble::EnsembleTable;
pub use error::{OutputError, Result};
pub use geojson_out::{write_polygon_collection, PointCollectionWriter};
pub use history::HistoryTable;

/// Property map attached to GeoJSON features.
pub use geojson::JsonObject;
/// Property value attached to GeoJSON features.
pub use geojson::JsonValue;
