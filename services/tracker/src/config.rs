//! Configuration loading for the tracker pipelines.
//!
//! Loads detection regimes and pipeline thresholds from a YAML file
//! (config/tracker.yaml). Every field has a default, so a partial file or
//! no file at all is valid.

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{bail, Context, Result};
use drylines::{DetectionParams, GradientMode};
use regions::LonLatBox;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub regimes: RegimesConfig,
    #[serde(default)]
    pub rainbelt: RainbeltConfig,
    #[serde(default)]
    pub heat_lows: HeatLowConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// NOMADS filter endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_gdas_filter_url")]
    pub gdas_filter_url: String,
    #[serde(default = "default_gefs_filter_url")]
    pub gefs_filter_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gdas_filter_url() -> String {
    "https://nomads.ncep.noaa.gov/cgi-bin/filter_gdas_0p25.pl".to_string()
}

fn default_gefs_filter_url() -> String {
    "https://nomads.ncep.noaa.gov/cgi-bin/filter_gefs_atmos_0p50a.pl".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            gdas_filter_url: default_gdas_filter_url(),
            gefs_filter_url: default_gefs_filter_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// One dryline regime: a gradient band, thresholds and where it may occur.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegimeConfig {
    /// Radians, inclusive.
    pub theta_min: f64,
    /// Radians, inclusive. Below `theta_min` the band wraps through ±π.
    pub theta_max: f64,
    #[serde(default = "default_mag_min")]
    pub mag_min: f64,
    /// Minimum component size on the 0.25° analysis grid.
    pub minlen: usize,
    /// Minimum component size on the 0.5° forecast grid; falls back to
    /// `minlen`.
    #[serde(default)]
    pub forecast_minlen: Option<usize>,
    #[serde(default)]
    pub region: LonLatBox,
    #[serde(default = "default_inside_africa")]
    pub inside_africa: bool,
    #[serde(default)]
    pub relative: GradientMode,
}

fn default_mag_min() -> f64 {
    0.003
}

fn default_inside_africa() -> bool {
    true
}

impl RegimeConfig {
    /// Congo Air Boundary.
    pub fn cab() -> Self {
        Self {
            theta_min: -PI / 4.0,
            theta_max: PI / 6.0,
            mag_min: default_mag_min(),
            minlen: 15,
            forecast_minlen: Some(7),
            region: LonLatBox::new(15.0, 30.0, -18.0, 0.0),
            inside_africa: true,
            relative: GradientMode::GridCell,
        }
    }

    /// Kalahari discontinuity.
    pub fn kd() -> Self {
        Self {
            theta_min: PI / 6.0,
            theta_max: PI / 2.0,
            mag_min: default_mag_min(),
            minlen: 10,
            forecast_minlen: Some(5),
            region: LonLatBox {
                lon_max: Some(30.0),
                lat_max: Some(-12.0),
                ..Default::default()
            },
            inside_africa: true,
            relative: GradientMode::GridCell,
        }
    }

    /// Any moisture boundary, no directional constraint.
    pub fn dryline() -> Self {
        Self {
            theta_min: -PI,
            theta_max: PI,
            mag_min: default_mag_min(),
            minlen: 30,
            forecast_minlen: None,
            region: LonLatBox::default(),
            inside_africa: true,
            relative: GradientMode::GridCell,
        }
    }

    /// Parameters for the analysis grid.
    pub fn params(&self) -> DetectionParams {
        DetectionParams::new(self.theta_min, self.theta_max, self.mag_min, self.minlen)
            .with_relative(self.relative)
    }

    /// Parameters for the forecast grid.
    pub fn forecast_params(&self) -> DetectionParams {
        DetectionParams {
            minlen: self.forecast_minlen.unwrap_or(self.minlen),
            ..self.params()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegimesConfig {
    #[serde(default = "RegimeConfig::cab")]
    pub cab: RegimeConfig,
    #[serde(default = "RegimeConfig::kd")]
    pub kd: RegimeConfig,
    #[serde(default = "RegimeConfig::dryline")]
    pub dryline: RegimeConfig,
}

impl Default for RegimesConfig {
    fn default() -> Self {
        Self {
            cab: RegimeConfig::cab(),
            kd: RegimeConfig::kd(),
            dryline: RegimeConfig::dryline(),
        }
    }
}

/// Rain belt: where 850 hPa specific humidity exceeds a threshold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RainbeltConfig {
    /// kg/kg, strict.
    #[serde(default = "default_rainbelt_threshold")]
    pub threshold: f64,
}

fn default_rainbelt_threshold() -> f64 {
    0.01
}

impl Default for RainbeltConfig {
    fn default() -> Self {
        Self {
            threshold: default_rainbelt_threshold(),
        }
    }
}

/// Inclusive latitude band.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatBand {
    pub min: f64,
    pub max: f64,
}

impl LatBand {
    pub fn contains(&self, lat: f64) -> bool {
        lat >= self.min && lat <= self.max
    }
}

/// Heat lows: the warmest 850 hPa region in each hemisphere.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatLowConfig {
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    /// Rolling-mean window, cells per side.
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// Band the northern threshold is computed over.
    #[serde(default = "default_north_band")]
    pub north_band: LatBand,
    /// Band the southern threshold is computed over.
    #[serde(default = "default_south_band")]
    pub south_band: LatBand,
}

fn default_quantile() -> f64 {
    0.95
}

fn default_smoothing_window() -> usize {
    8
}

fn default_north_band() -> LatBand {
    LatBand { min: 0.0, max: 35.0 }
}

fn default_south_band() -> LatBand {
    LatBand { min: -35.0, max: 0.0 }
}

impl Default for HeatLowConfig {
    fn default() -> Self {
        Self {
            quantile: default_quantile(),
            smoothing_window: default_smoothing_window(),
            north_band: default_north_band(),
            south_band: default_south_band(),
        }
    }
}

/// GEFS ensemble forecast run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_members")]
    pub members: Vec<String>,
    #[serde(default)]
    pub lead_hours: LeadHoursConfig,
    /// Level of the RH and TMP fields, hPa.
    #[serde(default = "default_pressure")]
    pub pressure_hpa: f64,
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// Keep each GRIB file after it has been processed.
    #[serde(default)]
    pub keep_downloads: bool,
}

fn default_members() -> Vec<String> {
    let mut members = vec!["geavg".to_string(), "gec00".to_string()];
    members.extend((1..=15).map(|n| format!("gep{:02}", n)));
    members
}

fn default_pressure() -> f64 {
    850.0
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            members: default_members(),
            lead_hours: LeadHoursConfig::default(),
            pressure_hpa: default_pressure(),
            smoothing_window: default_smoothing_window(),
            keep_downloads: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LeadHoursConfig {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl Default for LeadHoursConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: 240,
            step: 24,
        }
    }
}

impl LeadHoursConfig {
    /// Generate the list of lead hours.
    pub fn hours(&self) -> Vec<u32> {
        (self.start..=self.end).step_by(self.step.max(1) as usize).collect()
    }
}

impl TrackerConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: TrackerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded tracker config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            info!(path = %path.display(), "Using tracker config file");
            Ok(config)
        } else {
            warn!(path = %path.display(), "Config file not found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Reject values no pipeline can run with. Detection thresholds are
    /// checked again by the detectors themselves.
    pub fn validate(&self) -> Result<()> {
        for (name, regime) in [
            ("cab", &self.regimes.cab),
            ("kd", &self.regimes.kd),
            ("dryline", &self.regimes.dryline),
        ] {
            if regime.minlen == 0 || regime.forecast_minlen == Some(0) {
                bail!("regime {}: minlen must be at least 1", name);
            }
        }
        if !(0.0..=1.0).contains(&self.heat_lows.quantile) {
            bail!("heat_lows.quantile {} is outside [0, 1]", self.heat_lows.quantile);
        }
        if self.heat_lows.smoothing_window == 0 || self.forecast.smoothing_window == 0 {
            bail!("smoothing_window must be at least 1");
        }
        if self.forecast.lead_hours.step == 0 {
            bail!("forecast.lead_hours.step must be at least 1");
        }
        if self.forecast.members.is_empty() {
            bail!("forecast.members is empty");
        }
        Ok(())
    }
}
