//! GEFS ensemble outlook: CAB size and rain belt latitude per member and
//! lead time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use drylines::SpatialMask;
use geo::Centroid;
use grid_fields::{specific_humidity_field, LatLonGrid, ProductSelector};
use regions::{extract_polygons, largest_polygon};
use tracing::{debug, info, warn};
use tracker_output::EnsembleTable;

use super::{detect_regime, load_field, regime_mask};
use crate::config::TrackerConfig;
use crate::context::{Outcome, RunContext};
use crate::sources::GefsFile;

pub const RAINBELT_TABLE_NAME: &str = "rainbelt_lat.csv";
pub const CAB_TABLE_NAME: &str = "cab_gridcells.csv";

/// What one member and lead time contributes to the tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadSummary {
    pub cab_cells: usize,
    pub kd_cells: usize,
    /// Centroid latitude of the largest rain belt polygon.
    pub rainbelt_lat: Option<f64>,
}

/// Derive 850 hPa specific humidity from temperature and relative humidity.
pub fn forecast_humidity(t: &LatLonGrid, rh: &LatLonGrid, pressure_hpa: f64) -> Result<LatLonGrid> {
    if t.lon() != rh.lon() || t.lat() != rh.lat() {
        anyhow::bail!("temperature and relative humidity are on different grids");
    }
    let q = specific_humidity_field(t.values(), rh.values(), pressure_hpa)?;
    Ok(t.with_values(q)?)
}

/// Detect CAB and KD with the forecast minimum lengths, then locate the
/// rain belt on the smoothed, clipped humidity field.
pub fn analyse_lead(q: &LatLonGrid, africa: &SpatialMask, config: &TrackerConfig) -> Result<LeadSummary> {
    let regimes = &config.regimes;
    let cab_mask = regime_mask(&regimes.cab, africa, q.lon(), q.lat())?;
    let cab = detect_regime(q, &cab_mask, &regimes.cab.forecast_params())?;
    let kd_mask = regime_mask(&regimes.kd, africa, q.lon(), q.lat())?;
    let kd = detect_regime(q, &kd_mask, &regimes.kd.forecast_params())?;

    let window = config.forecast.smoothing_window;
    let belt = q
        .rolling_mean(window, window)?
        .clip(africa.view())?
        .above(config.rainbelt.threshold);
    let polygon = largest_polygon(extract_polygons(belt.view(), q.lon(), q.lat())?);
    let rainbelt_lat = polygon.and_then(|p| p.centroid()).map(|c| c.y());

    Ok(LeadSummary {
        cab_cells: cab.iter().filter(|&&c| c).count(),
        kd_cells: kd.iter().filter(|&&c| c).count(),
        rainbelt_lat,
    })
}

/// Download every member and lead in turn, analyse it and delete the file.
/// A lead without a rain belt leaves an empty cell; a run with no rain belt
/// at all writes nothing.
pub async fn run(ctx: &RunContext) -> Result<Outcome> {
    let forecast = &ctx.config.forecast;
    let leads = forecast.lead_hours.hours();
    let mut rainbelt = EnsembleTable::new("mean_lat");
    let mut cab = EnsembleTable::new("cab_gridcells");
    let mut africa: Option<SpatialMask> = None;
    let mut belts_found = 0usize;

    for member in &forecast.members {
        for &lead in &leads {
            let file = GefsFile::new(ctx.date, ctx.cycle.clone(), member.clone(), lead);
            info!(member = %member, lead, "Processing ensemble member");
            let path = ctx
                .downloader
                .download(&file.url(&ctx.config.sources), &file.filename())
                .await
                .with_context(|| format!("Failed to fetch GEFS {} f{:03}", member, lead))?;

            let t = load_field(&path, &ProductSelector::TMP_850)?;
            let rh = load_field(&path, &ProductSelector::RH_850)?;
            let q = forecast_humidity(&t, &rh, forecast.pressure_hpa)?;

            let mask = match africa.take() {
                Some(mask) if mask.dim() == q.dim() => mask,
                _ => ctx.africa().await?.mask(q.lon(), q.lat()),
            };
            let summary = analyse_lead(&q, &mask, &ctx.config)?;
            africa = Some(mask);

            debug!(member = %member, lead, kd_cells = summary.kd_cells, "KD cells");
            cab.record(member, lead, summary.cab_cells as f64);
            match summary.rainbelt_lat {
                Some(lat) => {
                    belts_found += 1;
                    rainbelt.record(member, lead, lat);
                }
                None => {
                    warn!(member = %member, lead, "No rain belt polygon");
                    rainbelt.record(member, lead, f64::NAN);
                }
            }

            if !forecast.keep_downloads {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to delete download");
                }
            }
        }
    }

    if belts_found == 0 {
        return Ok(Outcome::NothingDetected("rain belt in any forecast".to_string()));
    }

    let rainbelt_path: PathBuf = ctx.database_path(RAINBELT_TABLE_NAME);
    let cab_path: PathBuf = ctx.database_path(CAB_TABLE_NAME);
    rainbelt
        .save(&rainbelt_path)
        .with_context(|| format!("Failed to write {}", rainbelt_path.display()))?;
    cab.save(&cab_path)
        .with_context(|| format!("Failed to write {}", cab_path.display()))?;
    Ok(Outcome::Written(vec![rainbelt_path, cab_path]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_forecast_humidity_matches_point_formula() {
        let lon = vec![0.0, 0.5];
        let lat = vec![0.0];
        let t = LatLonGrid::new(lon.clone(), lat.clone(), array![[293.15, 283.15]]).unwrap();
        let rh = LatLonGrid::new(lon, lat, array![[100.0, 50.0]]).unwrap();
        let q = forecast_humidity(&t, &rh, 1000.0).unwrap();
        assert!((q.values()[[0, 0]] - 0.014665).abs() < 1e-5);
        assert!(q.values()[[0, 1]] < q.values()[[0, 0]]);
    }

    #[test]
    fn test_forecast_humidity_rejects_other_grid() {
        let t = LatLonGrid::new(vec![0.0, 0.5], vec![0.0], array![[293.0, 293.0]]).unwrap();
        let rh = LatLonGrid::new(vec![1.0, 1.5], vec![0.0], array![[50.0, 50.0]]).unwrap();
        assert!(forecast_humidity(&t, &rh, 850.0).is_err());
    }
}
