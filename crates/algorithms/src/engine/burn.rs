//! Burning geometries into a pixel grid
//!
//! Geometries are moved into pixel space with the inverse transform. Polygons
//! burn every pixel whose centre lies inside (even-odd rule); lines burn the
//! pixels their path crosses; points burn the pixel that contains them. With
//! `all_touched` every pixel touched by a line or polygon edge is burned too.

use ndarray::Array2;
use rasterfeat_core::raster::{GeoTransform, RasterBuffer, RasterElement};
use rasterfeat_core::vector::{Geometry, Position};
use rasterfeat_core::{with_buffer, Result};

use super::MergeAlg;

type Cell = (usize, usize);

pub(super) fn rasterize_burn(
    shapes: &[(Geometry, f64)],
    out: &mut RasterBuffer,
    transform: &GeoTransform,
    all_touched: bool,
    merge_alg: MergeAlg,
) -> Result<()> {
    let inverse = transform.inverse()?;
    with_buffer!(out, array => burn_into(array, shapes, &inverse, all_touched, merge_alg));
    Ok(())
}

fn burn_into<T: RasterElement>(
    out: &mut Array2<T>,
    shapes: &[(Geometry, f64)],
    inverse: &GeoTransform,
    all_touched: bool,
    merge_alg: MergeAlg,
) {
    let dim = out.dim();
    let mut cells = Vec::new();

    for (geometry, value) in shapes {
        let pixel_geometry = geometry.map_coords(|x, y| inverse.apply(x, y));
        cells.clear();
        collect_cells(&pixel_geometry, dim, all_touched, &mut cells);
        // a geometry burns each of its pixels once, even where parts overlap
        cells.sort_unstable();
        cells.dedup();

        for &cell in &cells {
            let pixel = &mut out[cell];
            *pixel = match merge_alg {
                MergeAlg::Replace => T::cast_f64(*value),
                MergeAlg::Add => T::cast_f64(pixel.as_f64() + value),
            };
        }
    }
}

fn xy(positions: &[Position]) -> Vec<(f64, f64)> {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn collect_cells(geometry: &Geometry, dim: Cell, all_touched: bool, cells: &mut Vec<Cell>) {
    match geometry {
        Geometry::Point { coordinates } => {
            if coordinates.len() >= 2 {
                push_point(coordinates[0], coordinates[1], dim, cells);
            }
        }
        Geometry::MultiPoint { coordinates } => {
            for (x, y) in xy(coordinates) {
                push_point(x, y, dim, cells);
            }
        }
        Geometry::LineString { coordinates } | Geometry::LinearRing { coordinates } => {
            burn_path(&xy(coordinates), dim, all_touched, cells);
        }
        Geometry::MultiLineString { coordinates } => {
            for line in coordinates {
                burn_path(&xy(line), dim, all_touched, cells);
            }
        }
        Geometry::Polygon { coordinates } => burn_polygon(coordinates, dim, all_touched, cells),
        Geometry::MultiPolygon { coordinates } => {
            for polygon in coordinates {
                burn_polygon(polygon, dim, all_touched, cells);
            }
        }
        Geometry::GeometryCollection { geometries } => {
            for member in geometries {
                collect_cells(member, dim, all_touched, cells);
            }
        }
    }
}

fn push_cell(col: i64, row: i64, (rows, cols): Cell, cells: &mut Vec<Cell>) {
    if col >= 0 && row >= 0 && (row as usize) < rows && (col as usize) < cols {
        cells.push((row as usize, col as usize));
    }
}

fn push_point(x: f64, y: f64, dim: Cell, cells: &mut Vec<Cell>) {
    if x.is_finite() && y.is_finite() {
        push_cell(x.floor() as i64, y.floor() as i64, dim, cells);
    }
}

fn burn_path(path: &[(f64, f64)], dim: Cell, all_touched: bool, cells: &mut Vec<Cell>) {
    if let [only] = path {
        push_point(only.0, only.1, dim, cells);
    }
    for segment in path.windows(2) {
        burn_segment(segment[0], segment[1], dim, all_touched, cells);
    }
}

fn burn_segment(a: (f64, f64), b: (f64, f64), dim: Cell, all_touched: bool, cells: &mut Vec<Cell>) {
    let Some((a, b)) = clip_segment(a, b, dim) else {
        return;
    };
    if all_touched {
        supercover(a, b, dim, cells);
    } else {
        sample_segment(a, b, dim, cells);
    }
}

/// The part of a segment inside the grid padded by one pixel on every
/// side (Liang-Barsky). Endpoints already inside are returned unchanged.
fn clip_segment(a: (f64, f64), b: (f64, f64), (rows, cols): Cell) -> Option<((f64, f64), (f64, f64))> {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return None;
    }
    let (x_min, y_min) = (-1.0, -1.0);
    let (x_max, y_max) = (cols as f64 + 1.0, rows as f64 + 1.0);
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, a.0 - x_min),
        (dx, x_max - a.0),
        (-dy, a.1 - y_min),
        (dy, y_max - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| (a.0 + t * dx, a.1 + t * dy);
    let start = if t0 > 0.0 { at(t0) } else { a };
    let end = if t1 < 1.0 { at(t1) } else { b };
    Some((start, end))
}

/// Pixels containing points sampled at half-pixel steps along a segment.
fn sample_segment(a: (f64, f64), b: (f64, f64), dim: Cell, cells: &mut Vec<Cell>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let length = dx.abs().max(dy.abs());
    if !length.is_finite() {
        return;
    }
    let steps = (length * 2.0).ceil() as usize;
    if steps == 0 {
        push_point(a.0, a.1, dim, cells);
        return;
    }
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        push_point(a.0 + t * dx, a.1 + t * dy, dim, cells);
    }
}

/// Every pixel the segment passes through (grid traversal).
fn supercover(a: (f64, f64), b: (f64, f64), dim: Cell, cells: &mut Vec<Cell>) {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);

    // a segment ending exactly on a pixel edge does not enter the next pixel
    let start = |v: f64, d: f64| {
        if d < 0.0 && v == v.floor() {
            v as i64 - 1
        } else {
            v.floor() as i64
        }
    };
    let end = |v: f64, d: f64| {
        if d > 0.0 && v == v.floor() {
            v as i64 - 1
        } else {
            v.floor() as i64
        }
    };

    let (mut col, mut row) = (start(a.0, dx), start(a.1, dy));
    let (end_col, end_row) = (end(b.0, dx), end(b.1, dy));

    let axis = |d: f64, v: f64, cell: i64| -> (i64, f64, f64) {
        if d > 0.0 {
            (1, ((cell + 1) as f64 - v) / d, 1.0 / d)
        } else if d < 0.0 {
            (-1, (v - cell as f64) / -d, -1.0 / d)
        } else {
            (0, f64::INFINITY, f64::INFINITY)
        }
    };
    let (step_col, mut t_col, delta_col) = axis(dx, a.0, col);
    let (step_row, mut t_row, delta_row) = axis(dy, a.1, row);

    push_cell(col, row, dim, cells);
    let steps = (end_col - col).abs() + (end_row - row).abs();
    for _ in 0..steps {
        if t_col < t_row {
            col += step_col;
            t_col += delta_col;
        } else {
            row += step_row;
            t_row += delta_row;
        }
        push_cell(col, row, dim, cells);
    }
}

fn burn_polygon(rings: &[Vec<Position>], dim: Cell, all_touched: bool, cells: &mut Vec<Cell>) {
    let rings: Vec<Vec<(f64, f64)>> = rings
        .iter()
        .map(|r| xy(r))
        .filter(|r| r.len() >= 2)
        .collect();
    if rings.is_empty() {
        return;
    }

    scanline_fill(&rings, dim, cells);

    if all_touched {
        for ring in &rings {
            burn_path(ring, dim, true, cells);
            if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
                if first != last {
                    burn_segment(last, first, dim, true, cells);
                }
            }
        }
    }
}

/// Even-odd fill sampling each row at its pixel centres.
fn scanline_fill(rings: &[Vec<(f64, f64)>], (rows, cols): Cell, cells: &mut Vec<Cell>) {
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in rings.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) || rows == 0 || cols == 0 {
        return;
    }

    let first_row = (min_y - 0.5).ceil().max(0.0) as usize;
    let last_row = (max_y - 0.5).floor().min(rows as f64 - 1.0);
    if last_row < 0.0 {
        return;
    }
    let last_row = last_row as usize;

    let mut crossings = Vec::new();
    for row in first_row..=last_row {
        let y = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                // half-open rule so shared vertices are counted once
                if (a.1 <= y && b.1 > y) || (b.1 <= y && a.1 > y) {
                    crossings.push(a.0 + (y - a.1) * (b.0 - a.0) / (b.1 - a.1));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let stop = ((span[1] - 0.5).ceil() - 1.0).min(cols as f64 - 1.0);
            if stop < start {
                continue;
            }
            for col in start as usize..=stop as usize {
                cells.push((row, col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfeat_core::raster::DataType;

    fn burn(shapes: &[(Geometry, f64)], all_touched: bool, merge: MergeAlg) -> Array2<f64> {
        let mut out = RasterBuffer::zeros(DataType::Float64, 6, 6);
        rasterize_burn(shapes, &mut out, &GeoTransform::identity(), all_touched, merge).unwrap();
        out.to_f64()
    }

    #[test]
    fn test_square_burns_pixel_centres() {
        let square = Geometry::rect(1.0, 1.0, 4.0, 3.0);
        let out = burn(&[(square, 5.0)], false, MergeAlg::Replace);
        assert_eq!(out.sum(), 5.0 * 6.0);
        assert_eq!(out[(1, 1)], 5.0);
        assert_eq!(out[(2, 3)], 5.0);
        assert_eq!(out[(3, 1)], 0.0);
        assert_eq!(out[(1, 4)], 0.0);
    }

    #[test]
    fn test_hole_is_not_burned() {
        let donut = Geometry::polygon(
            &[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0)],
            &[&[(2.0, 2.0), (3.0, 2.0), (3.0, 3.0), (2.0, 3.0)]],
        );
        let out = burn(&[(donut, 1.0)], false, MergeAlg::Replace);
        assert_eq!(out.sum(), 24.0);
        assert_eq!(out[(2, 2)], 0.0);
    }

    #[test]
    fn test_all_touched_grows_small_shape() {
        // covers no pixel centre
        let sliver = Geometry::rect(1.2, 1.2, 1.4, 2.8);
        assert_eq!(burn(&[(sliver.clone(), 1.0)], false, MergeAlg::Replace).sum(), 0.0);
        let touched = burn(&[(sliver, 1.0)], true, MergeAlg::Replace);
        assert_eq!(touched[(1, 1)], 1.0);
        assert_eq!(touched[(2, 1)], 1.0);
        assert_eq!(touched.sum(), 2.0);
    }

    #[test]
    fn test_add_accumulates_across_shapes_only() {
        let square = Geometry::rect(0.0, 0.0, 2.0, 2.0);
        let out = burn(
            &[(square.clone(), 1.0), (square, 1.0)],
            false,
            MergeAlg::Add,
        );
        assert_eq!(out[(0, 0)], 2.0);
        assert_eq!(out.sum(), 8.0);

        // overlapping parts of a single geometry add once
        let pair = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![vec![0.0, 0.0], vec![2.0, 0.0], vec![2.0, 2.0], vec![0.0, 0.0]]],
                vec![vec![vec![0.0, 0.0], vec![2.0, 0.0], vec![2.0, 2.0], vec![0.0, 0.0]]],
            ],
        };
        let out = burn(&[(pair, 3.0)], true, MergeAlg::Add);
        assert_eq!(out.iter().cloned().fold(0.0, f64::max), 3.0);
    }

    #[test]
    fn test_points_and_lines() {
        let point = Geometry::point(3.5, 4.5);
        let line = Geometry::line_string(&[(0.5, 0.5), (5.5, 0.5)]);
        let out = burn(&[(point, 2.0), (line, 1.0)], false, MergeAlg::Replace);
        assert_eq!(out[(4, 3)], 2.0);
        assert_eq!(out.row(0).sum(), 6.0);
        assert_eq!(out.sum(), 8.0);
    }

    #[test]
    fn test_integer_add_saturates() {
        let mut out = RasterBuffer::filled(DataType::UInt8, 2, 2, 250.0);
        let square = Geometry::rect(0.0, 0.0, 2.0, 2.0);
        rasterize_burn(
            &[(square, 10.0)],
            &mut out,
            &GeoTransform::identity(),
            false,
            MergeAlg::Add,
        )
        .unwrap();
        assert_eq!(out.get(0, 0), Some(255.0));
    }

    #[test]
    fn test_world_coordinates_go_through_transform() {
        let transform = GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        let mut out = RasterBuffer::zeros(DataType::UInt8, 4, 4);
        let square = Geometry::rect(110.0, 170.0, 130.0, 190.0);
        rasterize_burn(&[(square, 1.0)], &mut out, &transform, false, MergeAlg::Replace).unwrap();
        assert_eq!(out.sum(), 4.0);
        assert_eq!(out.get(1, 1), Some(1.0));
        assert_eq!(out.get(2, 2), Some(1.0));
    }

    #[test]
    fn test_far_reaching_lines_cost_grid_steps_only() {
        let line = Geometry::line_string(&[(-2e8, 0.5), (2e8, 0.5)]);
        let out = burn(&[(line.clone(), 1.0)], false, MergeAlg::Replace);
        assert_eq!(out.row(0).sum(), 6.0);
        assert_eq!(out.sum(), 6.0);

        let touched = burn(&[(line, 1.0)], true, MergeAlg::Replace);
        assert_eq!(touched.sum(), 6.0);

        let column = Geometry::line_string(&[(2.5, -1e9), (2.5, 1e9)]);
        let out = burn(&[(column, 1.0)], true, MergeAlg::Replace);
        assert_eq!(out.column(2).sum(), 6.0);
        assert_eq!(out.sum(), 6.0);
    }

    #[test]
    fn test_clip_segment_to_padded_grid() {
        assert_eq!(
            clip_segment((-7.0, 0.5), (9.0, 0.5), (2, 2)),
            Some(((-1.0, 0.5), (3.0, 0.5)))
        );
        assert_eq!(
            clip_segment((0.5, 0.5), (1.5, 1.0), (2, 2)),
            Some(((0.5, 0.5), (1.5, 1.0)))
        );
        assert_eq!(clip_segment((-5.0, -5.0), (-2.0, 10.0), (2, 2)), None);
        assert_eq!(clip_segment((0.0, 0.0), (f64::NAN, 1.0), (2, 2)), None);
    }
}
