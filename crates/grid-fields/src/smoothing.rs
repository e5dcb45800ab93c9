//! NaN-aware centred moving average.

use ndarray::{Array2, ArrayView2};

/// Centred moving average with a `window_rows` x `window_cols` box.
///
/// The window at index `i` spans `[i - w/2, i + (w-1)/2]`, truncated at the
/// grid edges. NaN cells are skipped; a window with no finite cell yields
/// NaN. Box sums come from summed-area tables of the finite values and of
/// their count.
pub fn rolling_mean(values: ArrayView2<'_, f64>, window_rows: usize, window_cols: usize) -> Array2<f64> {
    let (rows, cols) = values.dim();
    let mut sum = Array2::<f64>::zeros((rows + 1, cols + 1));
    let mut count = Array2::<u32>::zeros((rows + 1, cols + 1));

    for r in 0..rows {
        for c in 0..cols {
            let v = values[[r, c]];
            let (s, n) = if v.is_finite() { (v, 1) } else { (0.0, 0) };
            sum[[r + 1, c + 1]] = s + sum[[r, c + 1]] + sum[[r + 1, c]] - sum[[r, c]];
            count[[r + 1, c + 1]] = n + count[[r, c + 1]] + count[[r + 1, c]] - count[[r, c]];
        }
    }

    let span = |i: usize, w: usize, n: usize| (i.saturating_sub(w / 2), (i + (w - 1) / 2 + 1).min(n));

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let (r0, r1) = span(r, window_rows, rows);
        let (c0, c1) = span(c, window_cols, cols);
        let n = count[[r1, c1]] + count[[r0, c0]] - count[[r0, c1]] - count[[r1, c0]];
        if n == 0 {
            return f64::NAN;
        }
        let s = sum[[r1, c1]] + sum[[r0, c0]] - sum[[r0, c1]] - sum[[r1, c0]];
        s / f64::from(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_window_of_one_is_identity() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(rolling_mean(values.view(), 1, 1), values);
    }

    #[test]
    fn test_odd_window_is_centred() {
        let values = array![[0.0, 3.0, 6.0, 9.0]];
        let mean = rolling_mean(values.view(), 1, 3);
        assert_relative_eq!(mean[[0, 0]], 1.5);
        assert_relative_eq!(mean[[0, 1]], 3.0);
        assert_relative_eq!(mean[[0, 2]], 6.0);
        assert_relative_eq!(mean[[0, 3]], 7.5);
    }

    #[test]
    fn test_even_window_leans_back() {
        // Window of 2 at i covers [i - 1, i].
        let values = array![[2.0, 4.0, 8.0]];
        let mean = rolling_mean(values.view(), 1, 2);
        assert_relative_eq!(mean[[0, 0]], 2.0);
        assert_relative_eq!(mean[[0, 1]], 3.0);
        assert_relative_eq!(mean[[0, 2]], 6.0);
    }

    #[test]
    fn test_nan_is_skipped() {
        let values = array![[f64::NAN, 2.0], [4.0, f64::NAN]];
        let mean = rolling_mean(values.view(), 3, 3);
        assert!(mean.iter().all(|&m| (m - 3.0).abs() < 1e-12));

        let all_nan = Array2::from_elem((2, 2), f64::NAN);
        assert!(rolling_mean(all_nan.view(), 8, 8).iter().all(|m| m.is_nan()));
    }

    #[test]
    fn test_two_dimensional_box() {
        let values = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f64);
        let mean = rolling_mean(values.view(), 3, 3);
        // Interior cell (1, 1): the 3x3 block around it.
        assert_relative_eq!(mean[[1, 1]], 5.0);
        // Corner (0, 0): the 2x2 block.
        assert_relative_eq!(mean[[0, 0]], 2.5);
    }
}
