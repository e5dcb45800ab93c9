//! Rain belt outline from GDAS 850 hPa specific humidity.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate};
use geo::{Area, Polygon};
use grid_fields::{LatLonGrid, ProductSelector};
use ndarray::ArrayView2;
use regions::{extract_polygons, largest_polygon};
use tracing::{info, warn};
use tracker_output::{write_polygon_collection, JsonObject, JsonValue};

use super::{load_field, GDAS_SOURCE};
use crate::context::{Outcome, RunContext};
use crate::sources::{GdasFile, GdasRequest};

pub const LATEST_TILE_NAME: &str = "belt_latest.geojson";

/// Outline of the largest region of `field` above `threshold` inside
/// `region`. `None` when no cell qualifies.
pub fn belt_polygon(field: &LatLonGrid, region: ArrayView2<'_, bool>, threshold: f64) -> Result<Option<Polygon<f64>>> {
    let clipped = field.clip(region)?;
    let belt = clipped.above(threshold);
    let polygons = extract_polygons(belt.view(), field.lon(), field.lat())?;
    info!(
        cells = belt.iter().filter(|&&b| b).count(),
        polygons = polygons.len(),
        "Thresholded rain belt"
    );
    Ok(largest_polygon(polygons))
}

/// Tile properties of a belt outline.
pub fn belt_properties(run_date: NaiveDate, cycle: &str, threshold: f64) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("source".to_string(), JsonValue::from(GDAS_SOURCE));
    properties.insert("level_hPa".to_string(), JsonValue::from(850));
    properties.insert("var".to_string(), JsonValue::from("q"));
    properties.insert("threshold".to_string(), JsonValue::from(threshold));
    properties.insert(
        "run_date".to_string(),
        JsonValue::from(run_date.format("%Y-%m-%d").to_string()),
    );
    properties.insert("run_cycle".to_string(), JsonValue::from(cycle));
    properties
}

/// Fetch the run date's analysis, falling back to the day before.
async fn fetch_latest(ctx: &RunContext) -> Result<(GdasFile, PathBuf)> {
    for date in [ctx.date, ctx.date - Duration::days(1)] {
        let file = GdasFile::new(date, ctx.cycle.clone(), GdasRequest::Level850);
        match ctx
            .downloader
            .download(&file.url(&ctx.config.sources), &file.filename())
            .await
        {
            Ok(path) => return Ok((file, path)),
            Err(e) => warn!(date = %date, cycle = %ctx.cycle, error = %e, "GDAS file not available"),
        }
    }
    Err(anyhow!(
        "Could not fetch GDAS file for {} or the day before",
        ctx.date
    ))
}

pub async fn run(ctx: &RunContext) -> Result<Outcome> {
    let (file, path) = fetch_latest(ctx).await?;
    info!(run_date = %file.date, cycle = %file.cycle, "Using GDAS run");

    let q = load_field(&path, &ProductSelector::SPFH_850)?;
    let africa = ctx.africa().await?.mask(q.lon(), q.lat());

    let threshold = ctx.config.rainbelt.threshold;
    let Some(polygon) = belt_polygon(&q, africa.view(), threshold)? else {
        return Ok(Outcome::NothingDetected("rain belt polygon".to_string()));
    };
    info!(area_deg2 = polygon.unsigned_area(), "Largest rain belt polygon");

    let dated = ctx.tile_path(&format!("belt_{}.geojson", file.stamp()));
    let latest = ctx.tile_path(LATEST_TILE_NAME);
    let paths = [dated, latest];
    write_polygon_collection(polygon, belt_properties(file.date, &file.cycle, threshold), &paths)
        .context("Failed to write rain belt tiles")?;
    Ok(Outcome::Written(paths.to_vec()))
}
