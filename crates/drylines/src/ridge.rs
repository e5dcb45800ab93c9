//! Ridge detection: edge candidates thinned to the crest of the gradient.
//!
//! A candidate survives when its gradient magnitude is a local maximum
//! along its own gradient direction, compared with the two neighbouring
//! cells in the nearest of the eight compass directions. Ties are broken
//! toward the uphill cell so a two-cell plateau yields a single line.

use std::f64::consts::FRAC_PI_4;

use chrono::{DateTime, Utc};
use ndarray::Array2;

use crate::detect::{Detection, DetectorRun, SliceContext};
use crate::diagnostics::DiagnosticSink;
use crate::edge::edge_gate;
use crate::error::Result;
use crate::params::DetectionParams;
use crate::types::{ScalarField, SpatialMask};

/// Geographic unit steps (east, north) for the eight compass sectors,
/// starting at east and turning counter-clockwise.
const COMPASS: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Find ridge lines of the gradient in `field`.
///
/// Same contract as [`crate::find_edge`]: the direction band and
/// `mag_min` gate candidacy, then the extremum test is applied, then the
/// mask and minimum-length filter.
pub fn find_ridge(
    field: &ScalarField,
    lon: &[f64],
    lat: &[f64],
    params: &DetectionParams,
    spatial_mask: Option<&SpatialMask>,
    times: Option<&[DateTime<Utc>]>,
) -> Result<Detection> {
    ridge_run(field, lon, lat, params, spatial_mask, times).execute(None, ridge_gate)
}

/// [`find_ridge`] with a sink receiving a frame every `params.plotfreq` slices.
pub fn find_ridge_with_diagnostics(
    field: &ScalarField,
    lon: &[f64],
    lat: &[f64],
    params: &DetectionParams,
    spatial_mask: Option<&SpatialMask>,
    times: Option<&[DateTime<Utc>]>,
    sink: &mut dyn DiagnosticSink,
) -> Result<Detection> {
    ridge_run(field, lon, lat, params, spatial_mask, times).execute(Some(sink), ridge_gate)
}

fn ridge_run<'a>(
    field: &'a ScalarField,
    lon: &'a [f64],
    lat: &'a [f64],
    params: &'a DetectionParams,
    spatial_mask: Option<&'a SpatialMask>,
    times: Option<&'a [DateTime<Utc>]>,
) -> DetectorRun<'a> {
    DetectorRun {
        name: "ridge",
        field,
        lon,
        lat,
        params,
        spatial_mask,
        times,
    }
}

fn ridge_gate(ctx: &SliceContext<'_>) -> Array2<bool> {
    let mut gate = edge_gate(ctx);
    let (rows, cols) = gate.dim();
    let col_sign: isize = if ctx.lon[1] > ctx.lon[0] { 1 } else { -1 };
    let row_sign: isize = if ctx.lat[1] > ctx.lat[0] { 1 } else { -1 };
    let magnitude = ctx.magnitude;

    // Neighbour magnitude, or the cell's own value off the grid or at NaN.
    let neighbour = |r: usize, c: usize, dr: isize, dc: isize| -> f64 {
        let own = magnitude[[r, c]];
        let nr = r as isize + dr;
        let nc = c as isize + dc;
        if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
            return own;
        }
        let value = magnitude[[nr as usize, nc as usize]];
        if value.is_nan() {
            own
        } else {
            value
        }
    };

    for r in 0..rows {
        for c in 0..cols {
            if !gate[[r, c]] {
                continue;
            }
            let (east, north) = COMPASS[compass_sector(ctx.direction[[r, c]])];
            let (dr, dc) = (north * row_sign, east * col_sign);
            let own = magnitude[[r, c]];
            let uphill = neighbour(r, c, dr, dc);
            let downhill = neighbour(r, c, -dr, -dc);
            gate[[r, c]] = own > uphill && own >= downhill;
        }
    }
    gate
}

/// Nearest of the eight compass sectors for a direction in `(-π, π]`.
fn compass_sector(direction: f64) -> usize {
    ((direction / FRAC_PI_4).round() as isize).rem_euclid(8) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_compass_sector() {
        assert_eq!(compass_sector(0.0), 0);
        assert_eq!(compass_sector(PI / 2.0), 2);
        assert_eq!(compass_sector(PI), 4);
        assert_eq!(compass_sector(-PI / 2.0), 6);
        assert_eq!(compass_sector(-PI / 4.0), 7);
        assert_eq!(compass_sector(0.3), 0);
    }
}
