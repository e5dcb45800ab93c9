//! Detection parameters.
//!
//! Every threshold is an explicit value here; the detectors never read
//! process-wide configuration.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DrylineError, Result};
use crate::gradient::GradientMode;

/// Tolerance applied at both band edges so inclusive bounds survive
/// rounding in `atan2`.
const ANGLE_EPSILON: f64 = 1e-12;

/// An inclusive angular band `[theta_min, theta_max]` in radians.
///
/// When `theta_max < theta_min` the band wraps through ±π.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularBand {
    pub theta_min: f64,
    pub theta_max: f64,
}

impl AngularBand {
    pub fn new(theta_min: f64, theta_max: f64) -> Self {
        Self {
            theta_min,
            theta_max,
        }
    }

    /// A band accepting every direction.
    pub fn full() -> Self {
        Self::new(-PI, PI)
    }

    /// True if the band covers the whole circle.
    pub fn is_full(&self) -> bool {
        self.theta_min <= -PI + ANGLE_EPSILON && self.theta_max >= PI - ANGLE_EPSILON
    }

    /// Inclusive membership test for a direction in `(-π, π]`.
    #[inline]
    pub fn contains(&self, direction: f64) -> bool {
        if direction.is_nan() {
            return false;
        }
        if self.is_full() {
            return true;
        }
        let lo = self.theta_min - ANGLE_EPSILON;
        let hi = self.theta_max + ANGLE_EPSILON;
        if self.theta_min <= self.theta_max {
            let inside = direction >= lo && direction <= hi;
            // π and -π are the same direction.
            inside || (direction >= PI - ANGLE_EPSILON && self.theta_min <= -PI + ANGLE_EPSILON)
        } else {
            direction >= lo || direction <= hi
        }
    }
}

/// Result representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Only the boolean result field.
    #[default]
    Sparse,
    /// Result field plus per-slice direction and magnitude.
    Dense,
}

impl FromStr for OutputMode {
    type Err = DrylineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sparse" => Ok(Self::Sparse),
            "dense" | "diagnostic" => Ok(Self::Dense),
            other => Err(DrylineError::invalid_parameter(
                "output",
                format!("unknown output mode '{}'", other),
            )),
        }
    }
}

/// Which time slices are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeIndexPolicy {
    /// Every slice independently.
    #[default]
    All,
    /// Only slice `t`; the others stay all-false in the result.
    Only(usize),
}

impl TimeIndexPolicy {
    pub(crate) fn selects(&self, t: usize) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == t,
        }
    }
}

/// Parameters shared by [`crate::find_edge`] and [`crate::find_ridge`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    pub band: AngularBand,
    /// Cells pass the magnitude gate iff `magnitude >= mag_min`.
    pub mag_min: f64,
    /// Minimum component size, in grid cells.
    pub minlen: usize,
    pub relative: GradientMode,
    pub output: OutputMode,
    /// Emit a diagnostic frame every `plotfreq` slices; 0 disables.
    pub plotfreq: usize,
    pub time_index_policy: TimeIndexPolicy,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            band: AngularBand::full(),
            mag_min: 0.0,
            minlen: 1,
            relative: GradientMode::GridCell,
            output: OutputMode::Sparse,
            plotfreq: 0,
            time_index_policy: TimeIndexPolicy::All,
        }
    }
}

impl DetectionParams {
    pub fn new(theta_min: f64, theta_max: f64, mag_min: f64, minlen: usize) -> Self {
        Self {
            band: AngularBand::new(theta_min, theta_max),
            mag_min,
            minlen,
            ..Default::default()
        }
    }

    pub fn with_relative(mut self, relative: GradientMode) -> Self {
        self.relative = relative;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_plotfreq(mut self, plotfreq: usize) -> Self {
        self.plotfreq = plotfreq;
        self
    }

    pub fn with_time_index_policy(mut self, policy: TimeIndexPolicy) -> Self {
        self.time_index_policy = policy;
        self
    }

    /// Reject thresholds the detectors cannot honour.
    pub fn validate(&self, time_len: usize) -> Result<()> {
        let AngularBand {
            theta_min,
            theta_max,
        } = self.band;
        if !theta_min.is_finite() || !theta_max.is_finite() {
            return Err(DrylineError::invalid_parameter(
                "theta",
                format!("band [{}, {}] is not finite", theta_min, theta_max),
            ));
        }
        if theta_min < -PI - ANGLE_EPSILON || theta_max > PI + ANGLE_EPSILON {
            return Err(DrylineError::invalid_parameter(
                "theta",
                format!("band [{}, {}] leaves [-π, π]", theta_min, theta_max),
            ));
        }
        if !(self.mag_min >= 0.0) {
            return Err(DrylineError::invalid_parameter(
                "mag_min",
                format!("{} is not a non-negative number", self.mag_min),
            ));
        }
        if self.minlen == 0 {
            return Err(DrylineError::invalid_parameter("minlen", "must be at least 1"));
        }
        if let TimeIndexPolicy::Only(t) = self.time_index_policy {
            if t >= time_len {
                return Err(DrylineError::invalid_parameter(
                    "time_index_policy",
                    format!("slice {} requested but field has {}", t, time_len),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_simple_band_inclusive() {
        let band = AngularBand::new(-FRAC_PI_4, PI / 6.0);
        assert!(band.contains(-FRAC_PI_4));
        assert!(band.contains(PI / 6.0));
        assert!(band.contains(0.0));
        assert!(!band.contains(PI / 2.0));
        assert!(!band.contains(-PI / 2.0));
    }

    #[test]
    fn test_wrapping_band() {
        let band = AngularBand::new(3.0, -3.0);
        assert!(band.contains(PI));
        assert!(band.contains(3.1));
        assert!(band.contains(-3.1));
        assert!(!band.contains(0.0));
        assert!(!band.contains(2.0));
    }

    #[test]
    fn test_full_band_accepts_everything() {
        let band = AngularBand::full();
        for d in [-3.0, -1.0, 0.0, 1.0, PI] {
            assert!(band.contains(d));
        }
        assert!(!band.contains(f64::NAN));
    }

    #[test]
    fn test_band_starting_at_minus_pi_accepts_pi() {
        let band = AngularBand::new(-PI, -3.0);
        assert!(band.contains(PI));
        assert!(!band.contains(0.0));
    }

    #[test]
    fn test_validate() {
        assert!(DetectionParams::new(-1.0, 1.0, 0.003, 15).validate(1).is_ok());
        assert!(DetectionParams::new(-1.0, 1.0, -0.1, 15).validate(1).is_err());
        assert!(DetectionParams::new(-1.0, 1.0, f64::NAN, 15).validate(1).is_err());
        assert!(DetectionParams::new(-1.0, 1.0, 0.1, 0).validate(1).is_err());
        assert!(DetectionParams::new(-4.0, 1.0, 0.1, 1).validate(1).is_err());

        let params = DetectionParams::default().with_time_index_policy(TimeIndexPolicy::Only(2));
        assert!(params.validate(2).is_err());
        assert!(params.validate(3).is_ok());
    }

    #[test]
    fn test_parse_output_mode() {
        assert_eq!("sparse".parse::<OutputMode>().unwrap(), OutputMode::Sparse);
        assert_eq!("Dense".parse::<OutputMode>().unwrap(), OutputMode::Dense);
        assert!("full".parse::<OutputMode>().is_err());
    }
}
