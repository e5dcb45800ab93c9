//! CAB, KD and generic dryline detection on GDAS 2 m specific humidity.

use anyhow::{Context, Result};
use drylines::SpatialMask;
use grid_fields::{LatLonGrid, ProductSelector};
use ndarray::Array2;
use tracing::info;
use tracker_output::{HistoryTable, PointCollectionWriter};

use super::{detect_regime, load_field, regime_mask, RegimeSummary};
use crate::config::{RegimeConfig, RegimesConfig};
use crate::context::{Outcome, RunContext};
use crate::sources::{GdasFile, GdasRequest};

pub const TILE_NAME: &str = "drylines.geojson";
pub const HISTORY_NAME: &str = "cab_history.csv";
pub const HISTORY_COLUMNS: [&str; 4] = ["cab_len", "cab_lat", "kd_len", "kd_lat"];

/// Retained cells of each regime on one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct DrylineDetections {
    pub cab: Array2<bool>,
    pub kd: Array2<bool>,
    pub dryline: Array2<bool>,
}

impl DrylineDetections {
    /// Layers in the order they are written, with their `source` labels.
    pub fn layers(&self) -> [(&'static str, &Array2<bool>); 3] {
        [("cab", &self.cab), ("kd", &self.kd), ("dryline", &self.dryline)]
    }

    /// History columns: cell count and mean latitude of CAB and KD.
    pub fn history_row(&self, lat: &[f64]) -> [(&'static str, f64); 4] {
        let cab = RegimeSummary::of(self.cab.view(), lat);
        let kd = RegimeSummary::of(self.kd.view(), lat);
        [
            ("cab_len", cab.cells as f64),
            ("cab_lat", cab.mean_lat),
            ("kd_len", kd.cells as f64),
            ("kd_lat", kd.mean_lat),
        ]
    }
}

/// Run the three analysis regimes on `q`.
pub fn detect_drylines(q: &LatLonGrid, africa: &SpatialMask, regimes: &RegimesConfig) -> Result<DrylineDetections> {
    let detect = |name: &str, regime: &RegimeConfig| -> Result<Array2<bool>> {
        let mask = regime_mask(regime, africa, q.lon(), q.lat())?;
        let cells = detect_regime(q, &mask, &regime.params())
            .with_context(|| format!("{} detection failed", name))?;
        info!(
            regime = name,
            eligible = mask.count(),
            cells = cells.iter().filter(|&&c| c).count(),
            "Regime detected"
        );
        Ok(cells)
    };

    Ok(DrylineDetections {
        cab: detect("cab", &regimes.cab)?,
        kd: detect("kd", &regimes.kd)?,
        dryline: detect("dryline", &regimes.dryline)?,
    })
}

/// Download today's analysis, detect, write the point tile and upsert the
/// history row. A day without detections still writes both: zero cells is
/// a valid history value.
pub async fn run(ctx: &RunContext) -> Result<Outcome> {
    let file = GdasFile::new(ctx.date, ctx.cycle.clone(), GdasRequest::SurfaceHumidity);
    let path = ctx
        .downloader
        .download(&file.url(&ctx.config.sources), &file.filename())
        .await
        .context("Failed to fetch GDAS 2 m specific humidity")?;

    let q = load_field(&path, &ProductSelector::SPFH_2M)?;
    let africa = ctx.africa().await?.mask(q.lon(), q.lat());
    let detections = detect_drylines(&q, &africa, &ctx.config.regimes)?;

    let tile = ctx.tile_path(TILE_NAME);
    let mut points = PointCollectionWriter::new(ctx.date.format("%Y-%m-%d").to_string());
    for (source, cells) in detections.layers() {
        points.add_layer(source, cells.view(), q.lon(), q.lat())?;
    }
    points
        .write(&tile)
        .with_context(|| format!("Failed to write {}", tile.display()))?;

    let history = ctx.database_path(HISTORY_NAME);
    let mut table = HistoryTable::load(&history, &HISTORY_COLUMNS)
        .with_context(|| format!("Failed to read {}", history.display()))?;
    table.upsert(&ctx.date.format("%Y%m%d").to_string(), &detections.history_row(q.lat()));
    table
        .save(&history)
        .with_context(|| format!("Failed to write {}", history.display()))?;

    info!(points = points.len(), rows = table.len(), "Dryline run complete");
    Ok(Outcome::Written(vec![tile, history]))
}
