//! Synthetic field generators.
//!
//! These generators create predictable, verifiable fields whose gradients
//! can be worked out by hand. Every field is `(rows, cols)` with rows
//! mapped to latitude and columns to longitude.

use ndarray::Array2;

/// `n` evenly spaced coordinates starting at `start`.
///
/// ```
/// use test_utils::uniform_axis;
///
/// assert_eq!(uniform_axis(10.0, -0.5, 3), vec![10.0, 9.5, 9.0]);
/// ```
pub fn uniform_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Longitude and latitude axes equal to the column and row indices.
pub fn index_axes(rows: usize, cols: usize) -> (Vec<f64>, Vec<f64>) {
    (uniform_axis(0.0, 1.0, cols), uniform_axis(0.0, 1.0, rows))
}

/// A field with the same value everywhere.
pub fn constant_field(rows: usize, cols: usize, value: f64) -> Array2<f64> {
    Array2::from_elem((rows, cols), value)
}

/// `field[r, c] = slope * c`: a ramp increasing along longitude.
pub fn lon_ramp_field(rows: usize, cols: usize, slope: f64) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(_, c)| slope * c as f64)
}

/// An `n x n` field that jumps from 0 to `jump` across the main diagonal:
/// cells with `col > row` hold `jump`, the rest 0.
pub fn diagonal_step_field(n: usize, jump: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(r, c)| if c > r { jump } else { 0.0 })
}

/// Every row is a copy of `profile`.
pub fn profile_field(rows: usize, profile: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((rows, profile.len()), |(_, c)| profile[c])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_step_field() {
        let field = diagonal_step_field(3, 10.0);
        assert_eq!(field[[0, 0]], 0.0);
        assert_eq!(field[[0, 1]], 10.0);
        assert_eq!(field[[2, 1]], 0.0);
    }
}
