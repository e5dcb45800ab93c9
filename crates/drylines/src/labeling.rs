//! Connected-component labeling of boolean grids.
//!
//! Labels are assigned by an explicit-stack flood fill in row-major scan
//! order, so label numbering is deterministic for a given input.

use ndarray::{Array2, ArrayView2};

/// Neighbourhood used to join cells into components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge-sharing neighbours only.
    Four,
    /// Edge- and corner-sharing neighbours.
    #[default]
    Eight,
}

impl Connectivity {
    fn offsets(&self) -> &'static [(isize, isize)] {
        const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
        const EIGHT: [(isize, isize); 8] = [
            (-1, -1), (-1, 0), (-1, 1),
            (0, -1),           (0, 1),
            (1, -1),  (1, 0),  (1, 1),
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }
}

/// A label field plus the size of every component.
///
/// Label 0 is background; component `k` (1-based) has `sizes[k - 1]` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentLabels {
    pub labels: Array2<u32>,
    pub sizes: Vec<usize>,
}

impl ComponentLabels {
    /// Number of components found.
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn size_of(&self, label: u32) -> Option<usize> {
        if label == 0 {
            return None;
        }
        self.sizes.get(label as usize - 1).copied()
    }

    /// Label of the component with the most cells (lowest label on ties).
    pub fn largest(&self) -> Option<u32> {
        self.sizes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (idx, &size)| match best {
                Some((_, best_size)) if best_size >= size => best,
                _ => Some((idx, size)),
            })
            .map(|(idx, _)| idx as u32 + 1)
    }

    /// Boolean field of the cells carrying `label`.
    pub fn mask_of(&self, label: u32) -> Array2<bool> {
        self.labels.mapv(|l| l != 0 && l == label)
    }

    /// Boolean field of the components with at least `min_size` cells.
    pub fn retain_min_size(&self, min_size: usize) -> Array2<bool> {
        let keep: Vec<bool> = self.sizes.iter().map(|&s| s >= min_size).collect();
        self.labels
            .mapv(|l| l != 0 && keep[l as usize - 1])
    }
}

/// Label the connected components of `mask`.
pub fn label_components(mask: ArrayView2<'_, bool>, connectivity: Connectivity) -> ComponentLabels {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::<u32>::zeros((rows, cols));
    let mut sizes = Vec::new();
    let neighbors = connectivity.offsets();
    let mut stack = Vec::new();

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] || labels[[i, j]] != 0 {
                continue;
            }

            let label = sizes.len() as u32 + 1;
            let mut size = 0usize;
            labels[[i, j]] = label;
            stack.push((i, j));

            while let Some((y, x)) = stack.pop() {
                size += 1;
                for &(dy, dx) in neighbors {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny < 0 || nx < 0 || ny >= rows as isize || nx >= cols as isize {
                        continue;
                    }
                    let (ny, nx) = (ny as usize, nx as usize);
                    if mask[[ny, nx]] && labels[[ny, nx]] == 0 {
                        labels[[ny, nx]] = label;
                        stack.push((ny, nx));
                    }
                }
            }

            sizes.push(size);
        }
    }

    ComponentLabels { labels, sizes }
}

/// Keep only the components of `mask` with at least `min_size` cells.
pub fn retain_min_size(
    mask: ArrayView2<'_, bool>,
    min_size: usize,
    connectivity: Connectivity,
) -> Array2<bool> {
    label_components(mask, connectivity).retain_min_size(min_size)
}

/// The largest component of `mask`, or `None` if `mask` is all false.
pub fn largest_component(mask: ArrayView2<'_, bool>, connectivity: Connectivity) -> Option<Array2<bool>> {
    let labels = label_components(mask, connectivity);
    labels.largest().map(|label| labels.mask_of(label))
}
