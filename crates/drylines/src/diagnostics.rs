//! Diagnostic frames emitted every `plotfreq` slices.
//!
//! Frames are a pure side effect: nothing a sink does can change the
//! detector result.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::{Rgb, RgbImage};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::Result;

const NAN_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const GATE_COLOR: Rgb<u8> = Rgb([40, 90, 220]);
const RETAINED_COLOR: Rgb<u8> = Rgb([230, 40, 30]);

/// Everything a detector knows about one processed slice.
#[derive(Debug)]
pub struct DiagnosticFrame<'a> {
    /// `"edge"` or `"ridge"`.
    pub detector: &'static str,
    pub index: usize,
    pub time: Option<DateTime<Utc>>,
    pub lat: &'a [f64],
    pub field: ArrayView2<'a, f64>,
    pub magnitude: &'a Array2<f64>,
    /// Cells that passed the gating predicate and the mask.
    pub gate: &'a Array2<bool>,
    /// Cells kept after the minimum-length filter.
    pub retained: &'a Array2<bool>,
}

/// Receives diagnostic frames from a detector.
pub trait DiagnosticSink {
    fn record(&mut self, frame: &DiagnosticFrame<'_>) -> Result<()>;
}

/// Writes each frame as a PNG: the field in grey, gated cells in blue,
/// retained cells in red, north up.
#[derive(Debug)]
pub struct PngDiagnostics {
    dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl PngDiagnostics {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            written: Vec::new(),
        }
    }

    /// Paths of the frames written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn frame_path(&self, frame: &DiagnosticFrame<'_>) -> PathBuf {
        let stamp = match frame.time {
            Some(time) => time.format("%Y%m%d%H%M").to_string(),
            None => format!("{:04}", frame.index),
        };
        self.dir
            .join(format!("{}_{}_{}.png", self.prefix, frame.detector, stamp))
    }
}

impl DiagnosticSink for PngDiagnostics {
    fn record(&mut self, frame: &DiagnosticFrame<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.frame_path(frame);
        render_frame(frame).save(&path)?;
        debug!(path = %path.display(), "Wrote diagnostic frame");
        self.written.push(path);
        Ok(())
    }
}

/// Render a frame to an RGB image, one pixel per grid cell.
pub fn render_frame(frame: &DiagnosticFrame<'_>) -> RgbImage {
    let (rows, cols) = frame.field.dim();
    let (min, max) = finite_range(frame.field);
    let span = if max > min { max - min } else { 1.0 };
    let north_at_bottom = frame.lat.len() >= 2 && frame.lat[1] > frame.lat[0];

    let mut img = RgbImage::new(cols as u32, rows as u32);
    for r in 0..rows {
        let y = if north_at_bottom { rows - 1 - r } else { r };
        for c in 0..cols {
            let color = if frame.retained[[r, c]] {
                RETAINED_COLOR
            } else if frame.gate[[r, c]] {
                GATE_COLOR
            } else {
                let v = frame.field[[r, c]];
                if v.is_finite() {
                    let grey = (((v - min) / span) * 255.0).round().clamp(0.0, 255.0) as u8;
                    Rgb([grey, grey, grey])
                } else {
                    NAN_COLOR
                }
            };
            img.put_pixel(c as u32, y as u32, color);
        }
    }
    img
}

fn finite_range(field: ArrayView2<'_, f64>) -> (f64, f64) {
    field
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

