//! Tracker pipelines for African moisture boundaries.
//!
//! Each subcommand of the `tracker` binary is one linear run:
//! download a GDAS analysis or GEFS forecast, compute, write GeoJSON tiles
//! and CSV tables.
//!
//! - `drylines`: CAB, KD and generic drylines on 2 m specific humidity
//! - `rainbelt`: largest 850 hPa moist region
//! - `heat-lows`: warmest 850 hPa region per hemisphere
//! - `forecast`: CAB size and rain belt latitude across the GEFS ensemble

pub mod config;
pub mod context;
pub mod download;
pub mod pipelines;
pub mod sources;

pub use config::TrackerConfig;
pub use context::{OnEmpty, Outcome, RunContext};
