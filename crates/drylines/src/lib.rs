//! Dryline and front detection on gridded meteorological fields.
//!
//! Given a scalar field on a rectilinear lon/lat grid (for example 2 m
//! specific humidity from a GDAS analysis), the detectors compute a
//! finite-difference gradient, gate cells by gradient direction and
//! magnitude, restrict them to an optional spatial mask, and keep the
//! 8-connected components of at least `minlen` cells.
//!
//! # Architecture
//!
//! ```text
//! ScalarField (time, lat, lon)
//!      │
//!      ▼  per time slice
//! gradient::dxdy ──► direction, magnitude
//!      │
//!      ├─► edge:  band(direction) AND magnitude >= mag_min
//!      └─► ridge: edge gate AND local maximum along the gradient
//!      │
//!      ├─► AND spatial mask
//!      │
//!      └─► labeling: 8-connected components, drop those < minlen
//!               │
//!               ▼
//!          ResultField (time, lat, lon) of bool
//! ```
//!
//! Every call is stateless: the same inputs always give the same output.
//!
//! # Example
//!
//! ```
//! use std::f64::consts::PI;
//! use drylines::{find_edge, DetectionParams, ScalarField};
//! use ndarray::Array2;
//!
//! let lon: Vec<f64> = (0..10).map(f64::from).collect();
//! let lat: Vec<f64> = (0..10).map(f64::from).collect();
//! let field = ScalarField::from(Array2::from_shape_fn((10, 10), |(_, c)| c as f64));
//!
//! let params = DetectionParams::new(-PI / 4.0, PI / 4.0, 0.5, 5);
//! let detection = find_edge(&field, &lon, &lat, &params, None, None).unwrap();
//! assert_eq!(detection.result.count(), 100);
//! ```

pub mod detect;
pub mod diagnostics;
pub mod edge;
pub mod error;
pub mod gradient;
pub mod labeling;
pub mod params;
pub mod ridge;
pub mod types;

pub use detect::Detection;
pub use diagnostics::{DiagnosticFrame, DiagnosticSink, PngDiagnostics};
pub use edge::{find_edge, find_edge_with_diagnostics};
pub use error::{DrylineError, Result};
pub use gradient::{ddx, ddy, direction_of, dxdy, GradientMode};
pub use labeling::{label_components, largest_component, retain_min_size, ComponentLabels, Connectivity};
pub use params::{AngularBand, DetectionParams, OutputMode, TimeIndexPolicy};
pub use ridge::{find_ridge, find_ridge_with_diagnostics};
pub use types::{GradientSeries, ResultField, ScalarField, SpatialMask};
