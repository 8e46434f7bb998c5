//! Tracing region boundaries into polygons

use ndarray::Array2;
use rasterfeat_core::raster::{GeoTransform, RasterBuffer};
use rasterfeat_core::vector::Geometry;
use rasterfeat_core::{Error, Result};
use std::collections::HashMap;

use super::label::{label_components, Components};
use super::Connectivity;

type Vertex = (usize, usize);

/// A unit boundary edge between pixel corners `(x, y)`, with the region on
/// its right-hand side (y grows downwards).
#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn direction(&self) -> (i64, i64) {
        (
            self.to.0 as i64 - self.from.0 as i64,
            self.to.1 as i64 - self.from.1 as i64,
        )
    }
}

/// Lazy, single-pass sequence of `(polygon, value)` pairs, one per
/// connected region, in raster scan order of each region's first pixel.
///
/// Exterior rings come out counter-clockwise for north-up transforms and
/// holes clockwise.
pub struct PolygonTracer {
    components: Components,
    connectivity: Connectivity,
    transform: GeoTransform,
    next: usize,
}

impl PolygonTracer {
    pub(super) fn new(
        image: &RasterBuffer,
        mask: Option<&Array2<bool>>,
        connectivity: Connectivity,
        transform: GeoTransform,
    ) -> Result<Self> {
        if let Some(mask) = mask {
            if mask.dim() != image.shape() {
                let (er, ec) = image.shape();
                let (ar, ac) = mask.dim();
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        let components = label_components(&image.to_f64(), mask, connectivity);
        Ok(Self {
            components,
            connectivity,
            transform,
            next: 0,
        })
    }

    fn trace(&self, index: usize) -> Geometry {
        let label = index as u32 + 1;
        let rings = trace_rings(
            &self.components.labels,
            label,
            self.components.extents[index],
            self.connectivity,
        );

        let mut exterior: Option<(f64, Vec<Vertex>)> = None;
        let mut holes = Vec::new();
        for ring in rings {
            let area = signed_area(&ring);
            if area > 0.0 {
                match &exterior {
                    Some((best, _)) if *best >= area => {}
                    _ => exterior = Some((area, ring)),
                }
            } else {
                holes.push(ring);
            }
        }

        // pixel rows grow downwards; reverse so north-up output keeps the
        // usual exterior orientation
        let to_world = |ring: &[Vertex]| -> Vec<Vec<f64>> {
            ring.iter()
                .rev()
                .map(|&(x, y)| {
                    let (wx, wy) = self.transform.apply(x as f64, y as f64);
                    vec![wx, wy]
                })
                .collect()
        };

        let mut coordinates = Vec::with_capacity(holes.len() + 1);
        if let Some((_, ring)) = exterior {
            coordinates.push(to_world(&ring));
        }
        coordinates.extend(holes.iter().map(|h| to_world(h)));
        Geometry::Polygon { coordinates }
    }
}

impl Iterator for PolygonTracer {
    type Item = (Geometry, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.components.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((self.trace(index), self.components.values[index]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.components.len() - self.next;
        (left, Some(left))
    }
}

impl std::fmt::Debug for PolygonTracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonTracer")
            .field("regions", &self.components.len())
            .field("next", &self.next)
            .finish()
    }
}

/// Closed rings (first vertex repeated last) around the pixels carrying
/// `label`, with collinear vertices removed.
fn trace_rings(
    labels: &Array2<u32>,
    label: u32,
    (min_row, min_col, max_row, max_col): (usize, usize, usize, usize),
    connectivity: Connectivity,
) -> Vec<Vec<Vertex>> {
    let (rows, cols) = labels.dim();
    let inside = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && (r as usize) < rows
            && (c as usize) < cols
            && labels[(r as usize, c as usize)] == label
    };

    let mut edges = Vec::new();
    for r in min_row..=max_row {
        for c in min_col..=max_col {
            if labels[(r, c)] != label {
                continue;
            }
            let (ri, ci) = (r as isize, c as isize);
            if !inside(ri - 1, ci) {
                edges.push(Edge { from: (c, r), to: (c + 1, r) });
            }
            if !inside(ri, ci + 1) {
                edges.push(Edge { from: (c + 1, r), to: (c + 1, r + 1) });
            }
            if !inside(ri + 1, ci) {
                edges.push(Edge { from: (c + 1, r + 1), to: (c, r + 1) });
            }
            if !inside(ri, ci - 1) {
                edges.push(Edge { from: (c, r + 1), to: (c, r) });
            }
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();
    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut ring = vec![edges[start].from];
        let mut current = start;
        loop {
            used[current] = true;
            let edge = edges[current];
            ring.push(edge.to);
            let Some(next) = next_edge(&edges, &outgoing, edge, connectivity) else {
                break;
            };
            if next == start || used[next] {
                break;
            }
            current = next;
        }
        rings.push(simplify(ring));
    }
    rings
}

/// The edge continuing a boundary walk. Where two regions touch only at a
/// corner the walk turns so that diagonal pixels stay joined under
/// 8-connectivity and separate under 4-connectivity.
fn next_edge(
    edges: &[Edge],
    outgoing: &HashMap<Vertex, Vec<usize>>,
    incoming: Edge,
    connectivity: Connectivity,
) -> Option<usize> {
    let candidates = outgoing.get(&incoming.to)?;
    if candidates.len() == 1 {
        return Some(candidates[0]);
    }

    let (dx, dy) = incoming.direction();
    let preferred = match connectivity {
        Connectivity::Eight => (dy, -dx),
        Connectivity::Four => (-dy, dx),
    };
    candidates
        .iter()
        .copied()
        .find(|&i| edges[i].direction() == preferred)
        .or_else(|| candidates.first().copied())
}

/// Drop vertices in the middle of straight runs and re-close the ring.
fn simplify(ring: Vec<Vertex>) -> Vec<Vertex> {
    let open = &ring[..ring.len().saturating_sub(1)];
    let n = open.len();
    if n < 3 {
        return ring;
    }

    let step = |a: Vertex, b: Vertex| {
        (
            (b.0 as i64 - a.0 as i64).signum(),
            (b.1 as i64 - a.1 as i64).signum(),
        )
    };
    let mut out: Vec<Vertex> = (0..n)
        .filter(|&i| {
            let prev = open[(i + n - 1) % n];
            let next = open[(i + 1) % n];
            step(prev, open[i]) != step(open[i], next)
        })
        .map(|i| open[i])
        .collect();
    if let Some(&first) = out.first() {
        out.push(first);
    }
    out
}

/// Shoelace area in pixel space; positive for exterior rings.
fn signed_area(ring: &[Vertex]) -> f64 {
    ring.windows(2)
        .map(|w| {
            let (x0, y0) = (w[0].0 as f64, w[0].1 as f64);
            let (x1, y1) = (w[1].0 as f64, w[1].1 as f64);
            x0 * y1 - x1 * y0
        })
        .sum::<f64>()
        / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn polygons(data: Array2<u8>, connectivity: Connectivity) -> Vec<(Geometry, f64)> {
        let image = RasterBuffer::from(data);
        PolygonTracer::new(&image, None, connectivity, GeoTransform::identity())
            .unwrap()
            .collect()
    }

    fn rings(geometry: &Geometry) -> &Vec<Vec<Vec<f64>>> {
        match geometry {
            Geometry::Polygon { coordinates } => coordinates,
            other => panic!("expected polygon, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_single_block_is_rectangle() {
        let shapes = polygons(array![[0, 0, 0], [0, 7, 7], [0, 7, 7]], Connectivity::Four);
        assert_eq!(shapes.len(), 2);

        let (block, value) = &shapes[1];
        assert_eq!(*value, 7.0);
        let ring = &rings(block)[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert!(ring.contains(&vec![1.0, 1.0]));
        assert!(ring.contains(&vec![3.0, 3.0]));
    }

    #[test]
    fn test_surrounding_region_has_hole() {
        let shapes = polygons(array![[1, 1, 1], [1, 2, 1], [1, 1, 1]], Connectivity::Four);
        assert_eq!(shapes.len(), 2);
        let outer = rings(&shapes[0].0);
        assert_eq!(outer.len(), 2);
        // identity keeps rows growing downwards, so orientations are mirrored
        assert!(signed_area_world(&outer[0]) < 0.0);
        assert_eq!(signed_area_world(&outer[0]), -9.0);
        assert_eq!(signed_area_world(&outer[1]), 1.0);
    }

    fn signed_area_world(ring: &[Vec<f64>]) -> f64 {
        ring.windows(2)
            .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
            .sum::<f64>()
            / 2.0
    }

    #[test]
    fn test_diagonal_pinch() {
        let data = array![[1, 0], [0, 1]];
        let four = polygons(data.clone(), Connectivity::Four);
        assert_eq!(four.len(), 4);
        for (polygon, _) in &four {
            assert_eq!(rings(polygon).len(), 1);
            assert_eq!(rings(polygon)[0].len(), 5);
        }

        let eight = polygons(data, Connectivity::Eight);
        assert_eq!(eight.len(), 2);
        // the joined diagonal pair is one ring through the shared corner
        let ring = &rings(&eight[0].0)[0];
        assert_eq!(ring.len(), 9);
        assert_eq!(signed_area_world(ring).abs(), 2.0);
    }

    #[test]
    fn test_mask_skips_pixels() {
        let image = RasterBuffer::from(array![[3u8, 3], [3, 3]]);
        let mask = array![[true, true], [false, false]];
        let shapes: Vec<_> =
            PolygonTracer::new(&image, Some(&mask), Connectivity::Four, GeoTransform::identity())
                .unwrap()
                .collect();
        assert_eq!(shapes.len(), 1);
        assert_eq!(signed_area_world(&rings(&shapes[0].0)[0]).abs(), 2.0);
    }

    #[test]
    fn test_mask_shape_must_match() {
        let image = RasterBuffer::from(array![[3u8, 3], [3, 3]]);
        let mask = array![[true, true]];
        assert!(
            PolygonTracer::new(&image, Some(&mask), Connectivity::Four, GeoTransform::identity())
                .is_err()
        );
    }

    #[test]
    fn test_north_up_exterior_is_counter_clockwise() {
        let image = RasterBuffer::from(array![[1u8]]);
        let transform = GeoTransform::new(10.0, 20.0, 1.0, -1.0);
        let (polygon, _) = PolygonTracer::new(&image, None, Connectivity::Four, transform)
            .unwrap()
            .next()
            .unwrap();
        let ring = &rings(&polygon)[0];
        assert!(signed_area_world(ring) > 0.0);
        assert!(ring.contains(&vec![10.0, 20.0]));
        assert!(ring.contains(&vec![11.0, 19.0]));
    }
}
