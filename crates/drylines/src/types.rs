//! Field types shared by the gradient operators and the detectors.

use ndarray::{Array2, Array3, ArrayView2, Axis};

/// A scalar field on a rectilinear lon/lat grid.
///
/// Rows map to latitude, columns to longitude. A `Series` carries a leading
/// time axis whose slices are processed independently.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarField {
    /// A single analysis instant, shape `(rows, cols)`.
    Instant(Array2<f64>),
    /// A stack of instants, shape `(time, rows, cols)`.
    Series(Array3<f64>),
}

impl ScalarField {
    /// Number of time slices (1 for an `Instant`).
    pub fn time_len(&self) -> usize {
        match self {
            Self::Instant(_) => 1,
            Self::Series(values) => values.len_of(Axis(0)),
        }
    }

    /// Spatial shape `(rows, cols)` shared by every slice.
    pub fn spatial_dim(&self) -> (usize, usize) {
        match self {
            Self::Instant(values) => values.dim(),
            Self::Series(values) => {
                let (_, rows, cols) = values.dim();
                (rows, cols)
            }
        }
    }

    /// Full shape `(time, rows, cols)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        let (rows, cols) = self.spatial_dim();
        (self.time_len(), rows, cols)
    }

    /// View of one time slice.
    ///
    /// Panics if `t` is out of range; callers validate the index first.
    pub fn slice(&self, t: usize) -> ArrayView2<'_, f64> {
        match self {
            Self::Instant(values) => {
                assert_eq!(t, 0, "an instant field has a single slice");
                values.view()
            }
            Self::Series(values) => values.index_axis(Axis(0), t),
        }
    }
}

impl From<Array2<f64>> for ScalarField {
    fn from(values: Array2<f64>) -> Self {
        Self::Instant(values)
    }
}

impl From<Array3<f64>> for ScalarField {
    fn from(values: Array3<f64>) -> Self {
        Self::Series(values)
    }
}

/// Grid cells eligible for detection, constant across time.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMask {
    cells: Array2<bool>,
}

impl SpatialMask {
    pub fn new(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    /// A mask that admits every cell.
    pub fn all(rows: usize, cols: usize) -> Self {
        Self {
            cells: Array2::from_elem((rows, cols), true),
        }
    }

    /// Build a mask by evaluating `f(row, col)` on every cell.
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut((usize, usize)) -> bool) -> Self {
        Self {
            cells: Array2::from_shape_fn((rows, cols), f),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.cells.view()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).copied().unwrap_or(false)
    }

    /// Cell-wise AND of two masks of the same shape.
    ///
    /// Returns `None` when the shapes differ.
    pub fn intersect(&self, other: &SpatialMask) -> Option<SpatialMask> {
        if self.dim() != other.dim() {
            return None;
        }
        let mut cells = self.cells.clone();
        cells.zip_mut_with(&other.cells, |a, &b| *a = *a && b);
        Some(SpatialMask { cells })
    }

    /// Number of eligible cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Detector output: true where a cell belongs to a retained component.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultField {
    cells: Array3<bool>,
}

impl ResultField {
    pub(crate) fn empty(time: usize, rows: usize, cols: usize) -> Self {
        Self {
            cells: Array3::from_elem((time, rows, cols), false),
        }
    }

    pub(crate) fn set_slice(&mut self, t: usize, slice: &Array2<bool>) {
        self.cells.index_axis_mut(Axis(0), t).assign(slice);
    }

    /// Shape `(time, rows, cols)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.cells.dim()
    }

    pub fn get(&self, t: usize, row: usize, col: usize) -> bool {
        self.cells.get((t, row, col)).copied().unwrap_or(false)
    }

    pub fn slice(&self, t: usize) -> ArrayView2<'_, bool> {
        self.cells.index_axis(Axis(0), t)
    }

    /// Total number of true cells across all slices.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Number of true cells in slice `t`.
    pub fn count_slice(&self, t: usize) -> usize {
        self.slice(t).iter().filter(|&&c| c).count()
    }

    /// `(row, col)` of every true cell in slice `t`, in row-major order.
    pub fn true_cells(&self, t: usize) -> Vec<(usize, usize)> {
        self.slice(t)
            .indexed_iter()
            .filter(|(_, &on)| on)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    pub fn view(&self) -> ndarray::ArrayView3<'_, bool> {
        self.cells.view()
    }
}

/// Gradient direction (radians, `(-π, π]`) and magnitude for every slice.
///
/// Only returned by the detectors in dense output mode.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSeries {
    pub direction: Array3<f64>,
    pub magnitude: Array3<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_instant_dims() {
        let field = ScalarField::from(Array2::<f64>::zeros((3, 4)));
        assert_eq!(field.dim(), (1, 3, 4));
        assert_eq!(field.slice(0).dim(), (3, 4));
    }

    #[test]
    fn test_series_dims() {
        let field = ScalarField::from(Array3::<f64>::zeros((2, 3, 4)));
        assert_eq!(field.time_len(), 2);
        assert_eq!(field.spatial_dim(), (3, 4));
    }

    #[test]
    fn test_mask_intersect() {
        let a = SpatialMask::new(array![[true, true], [false, true]]);
        let b = SpatialMask::new(array![[true, false], [true, true]]);
        let both = a.intersect(&b).unwrap();
        assert_eq!(both.view(), array![[true, false], [false, true]].view());
        assert_eq!(both.count(), 2);

        let other = SpatialMask::all(3, 3);
        assert!(a.intersect(&other).is_none());
    }

    #[test]
    fn test_result_true_cells() {
        let mut result = ResultField::empty(1, 2, 3);
        result.set_slice(0, &array![[false, true, false], [true, false, false]]);
        assert_eq!(result.true_cells(0), vec![(0, 1), (1, 0)]);
        assert_eq!(result.count(), 2);
        assert!(!result.is_empty());
    }
}
