//! Slice loop shared by the edge and ridge detectors.
//!
//! Per slice: gradient, gating predicate, missing-value and spatial
//! masks, 8-connected labeling, minimum-length filter. The detectors
//! differ only in the gating predicate.

use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::{debug, info, warn};

use crate::diagnostics::{DiagnosticFrame, DiagnosticSink};
use crate::error::{DrylineError, Result};
use crate::gradient::{dxdy_unchecked, validate_grid};
use crate::labeling::{retain_min_size, Connectivity};
use crate::params::{DetectionParams, OutputMode};
use crate::types::{GradientSeries, ResultField, ScalarField, SpatialMask};

/// Output of one detector call.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub result: ResultField,
    /// Present only in [`OutputMode::Dense`].
    pub gradients: Option<GradientSeries>,
}

/// Inputs of the gating predicate for one slice.
pub(crate) struct SliceContext<'a> {
    pub field: ArrayView2<'a, f64>,
    pub direction: &'a Array2<f64>,
    pub magnitude: &'a Array2<f64>,
    pub lon: &'a [f64],
    pub lat: &'a [f64],
    pub params: &'a DetectionParams,
}

pub(crate) struct DetectorRun<'a> {
    pub name: &'static str,
    pub field: &'a ScalarField,
    pub lon: &'a [f64],
    pub lat: &'a [f64],
    pub params: &'a DetectionParams,
    pub spatial_mask: Option<&'a SpatialMask>,
    pub times: Option<&'a [DateTime<Utc>]>,
}

impl DetectorRun<'_> {
    fn validate(&self) -> Result<()> {
        let (time_len, rows, cols) = self.field.dim();
        if time_len == 0 {
            return Err(DrylineError::invalid_parameter(
                "field",
                "time dimension is empty",
            ));
        }
        validate_grid((rows, cols), self.lon, self.lat)?;
        if let Some(mask) = self.spatial_mask {
            if mask.dim() != (rows, cols) {
                return Err(DrylineError::shape_mismatch(
                    "spatial_mask",
                    (rows, cols),
                    mask.dim(),
                ));
            }
        }
        if let Some(times) = self.times {
            if times.len() != time_len {
                return Err(DrylineError::invalid_parameter(
                    "times",
                    format!("{} labels for {} slices", times.len(), time_len),
                ));
            }
        }
        self.params.validate(time_len)
    }

    pub fn execute<G>(&self, mut sink: Option<&mut dyn DiagnosticSink>, gate: G) -> Result<Detection>
    where
        G: Fn(&SliceContext<'_>) -> Array2<bool>,
    {
        self.validate()?;

        let (time_len, rows, cols) = self.field.dim();
        let params = self.params;
        let mut result = ResultField::empty(time_len, rows, cols);
        let mut gradients = match params.output {
            OutputMode::Dense => Some(GradientSeries {
                direction: Array3::from_elem((time_len, rows, cols), f64::NAN),
                magnitude: Array3::from_elem((time_len, rows, cols), f64::NAN),
            }),
            OutputMode::Sparse => None,
        };

        for t in (0..time_len).filter(|&t| params.time_index_policy.selects(t)) {
            let slice = self.field.slice(t);
            if slice.iter().all(|v| v.is_nan()) {
                warn!(detector = self.name, slice = t, "Slice has no finite values");
            }
            let (direction, magnitude) = dxdy_unchecked(slice, self.lon, self.lat, params.relative);

            let ctx = SliceContext {
                field: slice,
                direction: &direction,
                magnitude: &magnitude,
                lon: self.lon,
                lat: self.lat,
                params,
            };
            let mut gated = gate(&ctx);
            // Missing values are never part of a feature.
            gated.zip_mut_with(&slice, |g, v| *g = *g && !v.is_nan());
            if let Some(mask) = self.spatial_mask {
                gated.zip_mut_with(&mask.view(), |g, &m| *g = *g && m);
            }

            let retained = retain_min_size(gated.view(), params.minlen, Connectivity::Eight);
            result.set_slice(t, &retained);

            debug!(
                detector = self.name,
                slice = t,
                gated = gated.iter().filter(|&&g| g).count(),
                retained = retained.iter().filter(|&&r| r).count(),
                "Processed slice"
            );

            if params.plotfreq > 0 && t % params.plotfreq == 0 {
                if let Some(sink) = sink.as_deref_mut() {
                    sink.record(&DiagnosticFrame {
                        detector: self.name,
                        index: t,
                        time: self.times.map(|times| times[t]),
                        lat: self.lat,
                        field: slice,
                        magnitude: &magnitude,
                        gate: &gated,
                        retained: &retained,
                    })?;
                }
            }

            if let Some(series) = gradients.as_mut() {
                series.direction.index_axis_mut(Axis(0), t).assign(&direction);
                series.magnitude.index_axis_mut(Axis(0), t).assign(&magnitude);
            }
        }

        info!(
            detector = self.name,
            slices = time_len,
            cells = result.count(),
            "Detection complete"
        );

        Ok(Detection { result, gradients })
    }
}
