//! Merging small regions into their neighbours

use ndarray::Array2;
use rasterfeat_core::raster::{RasterBuffer, RasterElement};
use rasterfeat_core::{with_buffer, Error, Result};

use super::label::{label_components, neighbor, Components, UNLABELED};
use super::Connectivity;

pub(super) fn sieve_merge(
    image: &RasterBuffer,
    min_size: usize,
    out: &mut RasterBuffer,
    mask: Option<&Array2<bool>>,
    connectivity: Connectivity,
) -> Result<()> {
    let (er, ec) = image.shape();
    for (ar, ac) in [Some(out.shape()), mask.map(|m| m.dim())].into_iter().flatten() {
        if (ar, ac) != (er, ec) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
    }

    let mut values = image.to_f64();
    let components = label_components(&values, mask, connectivity);

    let neighbors: Vec<Option<u32>> = (0..components.len())
        .map(|index| {
            if components.sizes[index] >= min_size {
                None
            } else {
                largest_neighbor(&components, index as u32 + 1, connectivity)
            }
        })
        .collect();

    for index in 0..components.len() {
        let Some(target) = merge_target(&components, &neighbors, index, min_size) else {
            continue;
        };
        let label = index as u32 + 1;
        let replacement = components.values[Components::index(target)];
        let (r0, c0, r1, c1) = components.extents[index];
        for r in r0..=r1 {
            for c in c0..=c1 {
                if components.labels[(r, c)] == label {
                    values[(r, c)] = replacement;
                }
            }
        }
    }

    with_buffer!(out, array => write_values(array, &values));
    Ok(())
}

/// Region whose value a small region ends up with: its largest neighbour,
/// followed through further small regions until one of at least
/// `min_size` pixels. A chain that loops among small regions stops after
/// visiting every region once.
fn merge_target(
    components: &Components,
    neighbors: &[Option<u32>],
    index: usize,
    min_size: usize,
) -> Option<u32> {
    let mut target = neighbors[index]?;
    for _ in 0..components.len() {
        let next = Components::index(target);
        if components.sizes[next] >= min_size {
            break;
        }
        match neighbors[next] {
            Some(further) => target = further,
            None => break,
        }
    }
    Some(target)
}

/// Label of the biggest region adjacent to `label`; ties go to the region
/// found first in scan order.
fn largest_neighbor(components: &Components, label: u32, connectivity: Connectivity) -> Option<u32> {
    let labels = &components.labels;
    let dim = labels.dim();
    let (r0, c0, r1, c1) = components.extents[Components::index(label)];

    let mut best: Option<(usize, u32)> = None;
    for r in r0..=r1 {
        for c in c0..=c1 {
            if labels[(r, c)] != label {
                continue;
            }
            for &offset in connectivity.offsets() {
                let Some(cell) = neighbor((r, c), offset, dim) else {
                    continue;
                };
                let other = labels[cell];
                if other == UNLABELED || other == label {
                    continue;
                }
                let size = components.sizes[Components::index(other)];
                let better = match best {
                    None => true,
                    Some((best_size, best_label)) => {
                        size > best_size || (size == best_size && other < best_label)
                    }
                };
                if better {
                    best = Some((size, other));
                }
            }
        }
    }
    best.map(|(_, l)| l)
}

fn write_values<T: RasterElement>(dst: &mut Array2<T>, src: &Array2<f64>) {
    dst.zip_mut_with(src, |d, &v| *d = T::cast_f64(v));
}
