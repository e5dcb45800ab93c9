//! Saharan and southern African heat lows from GDAS 850 hPa temperature.

use anyhow::{Context, Result};
use chrono::Utc;
use drylines::SpatialMask;
use geo::MultiPolygon;
use grid_fields::{nan_quantile, LatLonGrid, ProductSelector};
use regions::{largest_region, region_outline};
use tracing::{debug, info};
use tracker_output::{write_polygon_collection, HistoryTable, JsonObject, JsonValue};

use super::{load_field, round_to, GDAS_SOURCE};
use crate::config::{HeatLowConfig, LatBand};
use crate::context::{Outcome, RunContext};
use crate::sources::{GdasFile, GdasRequest};

pub const HISTORY_NAME: &str = "heatlow_history.csv";
pub const HISTORY_COLUMNS: [&str; 4] = [
    "northheatlow_lat",
    "northheatlow_temp",
    "southheatlow_lat",
    "southheatlow_temp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
        }
    }

    /// Rows a heat low may occur in; the equator belongs to both.
    pub fn contains(&self, lat: f64) -> bool {
        match self {
            Self::North => lat >= 0.0,
            Self::South => lat <= 0.0,
        }
    }

    /// Band the temperature threshold is computed over.
    pub fn threshold_band(&self, config: &HeatLowConfig) -> LatBand {
        match self {
            Self::North => config.north_band,
            Self::South => config.south_band,
        }
    }

    pub fn tile_name(&self) -> String {
        format!("{}_heat_low.geojson", self.name())
    }
}

/// One detected heat low.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatLow {
    pub hemisphere: Hemisphere,
    pub threshold: f64,
    pub cells: usize,
    /// Mean temperature under the region, K.
    pub mean_temp: f64,
    /// Mean latitude of the region's cells.
    pub mean_lat: f64,
    /// Every ring of the region, including cells joined only at a corner.
    pub outline: MultiPolygon<f64>,
}

/// Smooth and clip the temperature field the way both hemispheres use it.
pub fn prepare_temperature(t: &LatLonGrid, africa: &SpatialMask, config: &HeatLowConfig) -> Result<LatLonGrid> {
    let window = config.smoothing_window;
    let smoothed = t.rolling_mean(window, window)?;
    Ok(smoothed.clip(africa.view())?)
}

/// The warmest region of one hemisphere of a prepared field: cells above
/// the hemisphere's quantile, largest 8-connected region. `None` when the
/// band has no data or no cell exceeds the threshold.
pub fn find_heat_low(t: &LatLonGrid, hemisphere: Hemisphere, config: &HeatLowConfig) -> Result<Option<HeatLow>> {
    let band = hemisphere.threshold_band(config);
    let Some(threshold) = nan_quantile(t.where_lat(|lat| band.contains(lat)).finite_values(), config.quantile)
    else {
        debug!(hemisphere = hemisphere.name(), "No data in threshold band");
        return Ok(None);
    };

    let candidates = t.where_lat(|lat| hemisphere.contains(lat)).above(threshold);
    let Some(region) = largest_region(candidates.view(), t.values(), t.lon(), t.lat())? else {
        return Ok(None);
    };
    let outline = region_outline(region.mask.view(), t.lon(), t.lat())?;
    if outline.0.is_empty() {
        return Ok(None);
    }

    info!(
        hemisphere = hemisphere.name(),
        threshold,
        cells = region.cells,
        mean_temp = region.mean_value,
        mean_lat = region.mean_lat,
        polygons = outline.0.len(),
        "Heat low found"
    );
    Ok(Some(HeatLow {
        hemisphere,
        threshold,
        cells: region.cells,
        mean_temp: region.mean_value,
        mean_lat: region.mean_lat,
        outline,
    }))
}

/// Tile properties of a heat low.
pub fn heat_low_properties(heat_low: &HeatLow, run_date: &str, cycle: &str) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("source".to_string(), JsonValue::from(GDAS_SOURCE));
    properties.insert("level_hPa".to_string(), JsonValue::from(850));
    properties.insert("var".to_string(), JsonValue::from("t"));
    properties.insert("temp".to_string(), JsonValue::from(round_to(heat_low.mean_temp, 3)));
    properties.insert("run_date".to_string(), JsonValue::from(run_date));
    properties.insert("run_cycle".to_string(), JsonValue::from(cycle));
    properties.insert(
        "generated_at".to_string(),
        JsonValue::from(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
    );
    properties
}

/// Both heat lows are required: a run missing either writes nothing, so
/// the tiles and the history never disagree.
pub async fn run(ctx: &RunContext) -> Result<Outcome> {
    let file = GdasFile::new(ctx.date, ctx.cycle.clone(), GdasRequest::Level850);
    let path = ctx
        .downloader
        .download(&file.url(&ctx.config.sources), &file.filename())
        .await
        .context("Failed to fetch GDAS 850 hPa fields")?;

    let t = load_field(&path, &ProductSelector::TMP_850)?;
    let africa = ctx.africa().await?.mask(t.lon(), t.lat());
    let prepared = prepare_temperature(&t, &africa, &ctx.config.heat_lows)?;

    let mut found = Vec::with_capacity(2);
    for hemisphere in [Hemisphere::North, Hemisphere::South] {
        match find_heat_low(&prepared, hemisphere, &ctx.config.heat_lows)? {
            Some(heat_low) => found.push(heat_low),
            None => {
                return Ok(Outcome::NothingDetected(format!("{} heat low", hemisphere.name())));
            }
        }
    }

    let run_date = ctx.date.format("%Y%m%d").to_string();
    let mut written = Vec::new();
    for heat_low in &found {
        let tile = ctx.tile_path(&heat_low.hemisphere.tile_name());
        write_polygon_collection(
            heat_low.outline.clone(),
            heat_low_properties(heat_low, &run_date, &ctx.cycle),
            &[&tile],
        )
        .with_context(|| format!("Failed to write {}", tile.display()))?;
        written.push(tile);
    }

    let history = ctx.database_path(HISTORY_NAME);
    let mut table = HistoryTable::load(&history, &HISTORY_COLUMNS)
        .with_context(|| format!("Failed to read {}", history.display()))?;
    let row: Vec<(&str, f64)> = found
        .iter()
        .zip(HISTORY_COLUMNS.chunks(2))
        .flat_map(|(heat_low, columns)| {
            [(columns[0], heat_low.mean_lat), (columns[1], heat_low.mean_temp)]
        })
        .collect();
    table.upsert(&run_date, &row);
    table
        .save(&history)
        .with_context(|| format!("Failed to write {}", history.display()))?;
    written.push(history);

    Ok(Outcome::Written(written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Polygon};
    use ndarray::Array2;

    #[test]
    fn test_hemisphere_rows() {
        assert!(Hemisphere::North.contains(0.0));
        assert!(Hemisphere::South.contains(0.0));
        assert!(!Hemisphere::North.contains(-0.25));
        assert_eq!(Hemisphere::South.tile_name(), "south_heat_low.geojson");
    }

    #[test]
    fn test_corner_joined_heat_low_keeps_whole_outline() {
        // Two hot 3x3 blocks touching at one corner form one 8-connected region.
        let lon: Vec<f64> = (0..8).map(f64::from).collect();
        let lat: Vec<f64> = (10..18).map(f64::from).collect();
        let values = Array2::from_shape_fn((8, 8), |(r, c)| {
            let a = (1..4).contains(&r) && (1..4).contains(&c);
            let b = (4..7).contains(&r) && (4..7).contains(&c);
            if a || b {
                310.0
            } else {
                290.0
            }
        });
        let t = LatLonGrid::new(lon, lat, values).unwrap();
        let config = HeatLowConfig {
            quantile: 0.5,
            ..HeatLowConfig::default()
        };

        let heat_low = find_heat_low(&t, Hemisphere::North, &config).unwrap().unwrap();
        assert_eq!(heat_low.cells, 18);
        assert!((heat_low.mean_lat - 13.5).abs() < 1e-9);
        assert_eq!(heat_low.outline.0.len(), 2);
        assert!((heat_low.outline.unsigned_area() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_properties_round_temperature() {
        let heat_low = HeatLow {
            hemisphere: Hemisphere::North,
            threshold: 300.0,
            cells: 4,
            mean_temp: 301.23456,
            mean_lat: 21.0,
            outline: MultiPolygon::new(vec![Polygon::new(
                vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)].into(),
                vec![],
            )]),
        };
        let properties = heat_low_properties(&heat_low, "20251021", "00");
        assert_eq!(properties["temp"], 301.235);
        assert_eq!(properties["var"], "t");
        assert_eq!(properties["run_date"], "20251021");
        assert!(properties["generated_at"].as_str().unwrap().ends_with('Z'));
    }
}
