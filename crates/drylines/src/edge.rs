//! Edge detection: direction band plus magnitude threshold.

use chrono::{DateTime, Utc};
use ndarray::Array2;

use crate::detect::{Detection, DetectorRun, SliceContext};
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::params::DetectionParams;
use crate::types::{ScalarField, SpatialMask};

/// Find step-like features (drylines, air-mass boundaries) in `field`.
///
/// A cell is a candidate when its gradient direction lies in
/// `params.band` and its magnitude is at least `params.mag_min`.
/// Candidates outside `spatial_mask` are dropped, the rest are grouped
/// into 8-connected components and components smaller than
/// `params.minlen` cells are discarded.
///
/// Fails fast on malformed grids, masks or parameters; finding nothing
/// is a valid all-false result.
pub fn find_edge(
    field: &ScalarField,
    lon: &[f64],
    lat: &[f64],
    params: &DetectionParams,
    spatial_mask: Option<&SpatialMask>,
    times: Option<&[DateTime<Utc>]>,
) -> Result<Detection> {
    edge_run(field, lon, lat, params, spatial_mask, times).execute(None, edge_gate)
}

/// [`find_edge`] with a sink receiving a frame every `params.plotfreq` slices.
pub fn find_edge_with_diagnostics(
    field: &ScalarField,
    lon: &[f64],
    lat: &[f64],
    params: &DetectionParams,
    spatial_mask: Option<&SpatialMask>,
    times: Option<&[DateTime<Utc>]>,
    sink: &mut dyn DiagnosticSink,
) -> Result<Detection> {
    edge_run(field, lon, lat, params, spatial_mask, times).execute(Some(sink), edge_gate)
}

fn edge_run<'a>(
    field: &'a ScalarField,
    lon: &'a [f64],
    lat: &'a [f64],
    params: &'a DetectionParams,
    spatial_mask: Option<&'a SpatialMask>,
    times: Option<&'a [DateTime<Utc>]>,
) -> DetectorRun<'a> {
    DetectorRun {
        name: "edge",
        field,
        lon,
        lat,
        params,
        spatial_mask,
        times,
    }
}

/// Direction band AND `magnitude >= mag_min`.
pub(crate) fn edge_gate(ctx: &SliceContext<'_>) -> Array2<bool> {
    let band = ctx.params.band;
    let mag_min = ctx.params.mag_min;
    let mut gate = Array2::from_elem(ctx.magnitude.dim(), false);
    ndarray::Zip::from(&mut gate)
        .and(ctx.direction)
        .and(ctx.magnitude)
        .for_each(|g, &d, &m| *g = m >= mag_min && band.contains(d));
    gate
}
