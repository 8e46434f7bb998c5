//! Connected-component labelling of equal-valued pixels

use ndarray::Array2;
use std::collections::VecDeque;

use super::Connectivity;

/// Label assigned to pixels excluded by the mask
pub(crate) const UNLABELED: u32 = 0;

/// Regions of equal value, labelled `1..=len` in raster scan order of
/// their first pixel.
pub(crate) struct Components {
    pub labels: Array2<u32>,
    /// Value of region `k` at index `k - 1`
    pub values: Vec<f64>,
    pub sizes: Vec<usize>,
    /// Inclusive `(min_row, min_col, max_row, max_col)` per region
    pub extents: Vec<(usize, usize, usize, usize)>,
}

impl Components {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn index(label: u32) -> usize {
        label as usize - 1
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Offset `(row, col)` by `(dr, dc)` if the result stays inside the grid
pub(crate) fn neighbor(
    (row, col): (usize, usize),
    (dr, dc): (isize, isize),
    (rows, cols): (usize, usize),
) -> Option<(usize, usize)> {
    let r = row.checked_add_signed(dr)?;
    let c = col.checked_add_signed(dc)?;
    (r < rows && c < cols).then_some((r, c))
}

/// Label every unmasked pixel by flood fill.
pub(crate) fn label_components(
    values: &Array2<f64>,
    mask: Option<&Array2<bool>>,
    connectivity: Connectivity,
) -> Components {
    let dim = values.dim();
    let included = |r: usize, c: usize| mask.map_or(true, |m| m[(r, c)]);

    let mut labels = Array2::from_elem(dim, UNLABELED);
    let mut out = Components {
        labels: Array2::zeros((0, 0)),
        values: Vec::new(),
        sizes: Vec::new(),
        extents: Vec::new(),
    };
    let mut queue = VecDeque::new();

    for row in 0..dim.0 {
        for col in 0..dim.1 {
            if labels[(row, col)] != UNLABELED || !included(row, col) {
                continue;
            }

            let label = out.values.len() as u32 + 1;
            let value = values[(row, col)];
            let mut size = 0;
            let mut extent = (row, col, row, col);

            labels[(row, col)] = label;
            queue.push_back((row, col));

            while let Some(cell) = queue.pop_front() {
                size += 1;
                extent.0 = extent.0.min(cell.0);
                extent.1 = extent.1.min(cell.1);
                extent.2 = extent.2.max(cell.0);
                extent.3 = extent.3.max(cell.1);

                for &offset in connectivity.offsets() {
                    let Some((nr, nc)) = neighbor(cell, offset, dim) else {
                        continue;
                    };
                    if labels[(nr, nc)] == UNLABELED
                        && included(nr, nc)
                        && same_value(values[(nr, nc)], value)
                    {
                        labels[(nr, nc)] = label;
                        queue.push_back((nr, nc));
                    }
                }
            }

            out.values.push(value);
            out.sizes.push(size);
            out.extents.push(extent);
        }
    }

    out.labels = labels;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_diagonal_pixels_depend_on_connectivity() {
        let values = array![[1.0, 0.0], [0.0, 1.0]];
        let four = label_components(&values, None, Connectivity::Four);
        assert_eq!(four.len(), 4);

        let eight = label_components(&values, None, Connectivity::Eight);
        assert_eq!(eight.len(), 2);
        assert_eq!(eight.sizes, vec![2, 2]);
        assert_eq!(eight.values, vec![1.0, 0.0]);
    }

    #[test]
    fn test_mask_excludes_pixels() {
        let values = array![[5.0, 5.0, 5.0]];
        let mask = array![[true, false, true]];
        let comps = label_components(&values, Some(&mask), Connectivity::Four);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps.labels, array![[1, UNLABELED, 2]]);
        assert_eq!(comps.extents[1], (0, 2, 0, 2));
    }

    #[test]
    fn test_nan_regions_group() {
        let values = array![[f64::NAN, f64::NAN], [1.0, 1.0]];
        let comps = label_components(&values, None, Connectivity::Four);
        assert_eq!(comps.len(), 2);
    }
}
