//! State shared by one pipeline run.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use regions::Boundary;
use tracing::{info, warn};

use crate::config::TrackerConfig;
use crate::download::DownloadManager;

/// What a run does when it detects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OnEmpty {
    /// Log and exit 0 without writing outputs.
    #[default]
    Succeed,
    /// Exit non-zero.
    Fail,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written(Vec<PathBuf>),
    NothingDetected(String),
}

impl Outcome {
    /// Apply the empty-result policy.
    pub fn resolve(self, policy: OnEmpty) -> Result<Vec<PathBuf>> {
        match (self, policy) {
            (Outcome::Written(files), _) => Ok(files),
            (Outcome::NothingDetected(what), OnEmpty::Succeed) => {
                warn!(what = %what, "Nothing detected; exiting without changes");
                Ok(Vec::new())
            }
            (Outcome::NothingDetected(what), OnEmpty::Fail) => {
                bail!("Nothing detected: {}", what)
            }
        }
    }
}

pub struct RunContext {
    pub config: TrackerConfig,
    pub downloader: DownloadManager,
    /// Analysis (or forecast initialisation) date.
    pub date: NaiveDate,
    /// "00", "06", "12" or "18".
    pub cycle: String,
    pub tiles_dir: PathBuf,
    pub database_dir: PathBuf,
    pub africa_url: String,
    pub africa_cache: PathBuf,
}

impl RunContext {
    /// The Africa outline, downloaded once and cached on disk.
    pub async fn africa(&self) -> Result<Boundary> {
        let path = self
            .downloader
            .fetch_cached(&self.africa_url, &self.africa_cache)
            .await
            .context("Failed to fetch the Africa boundary")?;
        let boundary = Boundary::from_path(&path)
            .with_context(|| format!("Failed to load boundary from {}", path.display()))?;
        info!(polygons = boundary.polygon_count(), "Africa boundary ready");
        Ok(boundary)
    }

    pub fn tile_path(&self, name: &str) -> PathBuf {
        self.tiles_dir.join(name)
    }

    pub fn database_path(&self, name: &str) -> PathBuf {
        self.database_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_policy() {
        let written = Outcome::Written(vec![PathBuf::from("tiles/a.geojson")]);
        assert_eq!(written.clone().resolve(OnEmpty::Fail).unwrap().len(), 1);

        let empty = Outcome::NothingDetected("rain belt".to_string());
        assert!(empty.clone().resolve(OnEmpty::Succeed).unwrap().is_empty());
        let err = empty.resolve(OnEmpty::Fail).unwrap_err();
        assert!(err.to_string().contains("rain belt"));
    }
}
