//! Windows enclosing geometries

use rasterfeat_core::dataset::RasterDataset;
use rasterfeat_core::raster::{GeoTransform, Window};
use rasterfeat_core::vector::{Bounds, GeoInterface};
use rasterfeat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{RasterVectorEngine, ScanlineEngine};

/// Parameters for [`geometry_window`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowParams {
    /// Padding on the left and right, as a fraction of the x pixel size
    pub pad_x: f64,
    /// Padding on the top and bottom, as a fraction of the y pixel size
    pub pad_y: f64,
    /// Whether the transform's origin is the northernmost point
    pub north_up: bool,
    /// Whether the dataset transform has rotation terms
    pub rotated: bool,
    /// Decimal places kept when flooring window offsets
    pub pixel_precision: Option<u32>,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            pad_x: 0.0,
            pad_y: 0.0,
            north_up: true,
            rotated: false,
            pixel_precision: Some(3),
        }
    }
}

/// Bounding box of a geometry: its embedded `bbox` when it carries one,
/// otherwise the envelope of its coordinates (mapped through `transform`
/// first, when given).
///
/// With `north_up == false` the box is `(min x, max y, max x, min y)`.
pub fn bounds<G: GeoInterface + ?Sized>(
    geometry: &G,
    north_up: bool,
    transform: Option<&GeoTransform>,
) -> Result<Bounds> {
    ScanlineEngine
        .geometry_bounds(geometry, north_up, transform)
        .ok_or_else(|| Error::InvalidParameter {
            name: "geometry",
            value: "<geometry>".into(),
            reason: "geometry has no coordinates".into(),
        })
}

fn envelope<E, G>(
    engine: &E,
    shapes: &[G],
    north_up: bool,
    transform: Option<&GeoTransform>,
) -> Result<Vec<Bounds>>
where
    E: RasterVectorEngine,
    G: GeoInterface,
{
    if shapes.is_empty() {
        return Err(Error::InvalidParameter {
            name: "shapes",
            value: "[]".into(),
            reason: "at least one geometry is required".into(),
        });
    }
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            engine
                .geometry_bounds(shape, north_up, transform)
                .ok_or_else(|| Error::InvalidParameter {
                    name: "shapes",
                    value: format!("index {i}"),
                    reason: "geometry has no coordinates".into(),
                })
        })
        .collect()
}

fn min_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

/// The window of `dataset` that holds `shapes` plus padding.
///
/// Offsets are floored and lengths rounded up, so the window contains
/// every pixel the geometries reach. Fails with [`Error::WindowError`]
/// when the geometries do not overlap the raster.
pub fn geometry_window<D, G>(dataset: &D, shapes: &[G], params: &WindowParams) -> Result<Window>
where
    D: RasterDataset + ?Sized,
    G: GeoInterface,
{
    geometry_window_with(&ScanlineEngine, dataset, shapes, params)
}

/// [`geometry_window`] measuring bounds with a specific engine.
pub fn geometry_window_with<E, D, G>(
    engine: &E,
    dataset: &D,
    shapes: &[G],
    params: &WindowParams,
) -> Result<Window>
where
    E: RasterVectorEngine,
    D: RasterDataset + ?Sized,
    G: GeoInterface,
{
    let transform = dataset.transform();

    let (left, bottom, right, top) = if !params.rotated {
        let (res_x, res_y) = dataset.res();
        let pad_x = (params.pad_x * res_x).abs();
        let pad_y = (params.pad_y * res_y).abs();

        let all = envelope(engine, shapes, params.north_up, None)?;
        let left = min_of(all.iter().map(|b| b.left)) - pad_x;
        let right = max_of(all.iter().map(|b| b.right)) + pad_x;
        if params.north_up {
            let bottom = min_of(all.iter().map(|b| b.bottom)) - pad_y;
            let top = max_of(all.iter().map(|b| b.top)) + pad_y;
            (left, bottom, right, top)
        } else {
            let bottom = max_of(all.iter().map(|b| b.bottom)) + pad_y;
            let top = min_of(all.iter().map(|b| b.top)) - pad_y;
            (left, bottom, right, top)
        }
    } else {
        // envelope in pixel space, padded by whole pixels and clamped to the
        // raster before going back to world coordinates. Unlike the
        // axis-aligned branch, padding is not scaled by the resolution, and
        // rows span min(bottoms)..max(tops) of all shapes.
        let inverse = transform.inverse()?;
        let all = envelope(engine, shapes, true, Some(&inverse))?;
        let col_min = (min_of(all.iter().map(|b| b.left)) - params.pad_x).max(0.0);
        let col_max = (max_of(all.iter().map(|b| b.right)) + params.pad_x).min(dataset.width() as f64);
        let row_min = (min_of(all.iter().map(|b| b.bottom)) - params.pad_y).max(0.0);
        let row_max = (max_of(all.iter().map(|b| b.top)) + params.pad_y).min(dataset.height() as f64);

        let (left, top) = transform.apply(col_min, row_min);
        let (right, bottom) = transform.apply(col_max, row_max);
        (left, bottom, right, top)
    };

    let window = dataset.window(left, bottom, right, top)?;
    let floored = window.round_offsets(params.pixel_precision);
    let width = (window.width + window.col_off - floored.col_off).ceil();
    let height = (window.height + window.row_off - floored.row_off).ceil();
    let window = Window::new(floored.col_off, floored.row_off, width, height);

    let raster = Window::full(dataset.width(), dataset.height());
    let window = window.intersection(&raster).map_err(|_| {
        Error::WindowError(format!(
            "geometry window {window:?} does not overlap the raster"
        ))
    })?;
    debug!(?window, rotated = params.rotated, "computed geometry window");
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfeat_core::dataset::MemDataset;
    use rasterfeat_core::raster::{DataType, RasterBuffer};
    use rasterfeat_core::vector::Geometry;
    use serde_json::json;

    fn dataset(transform: GeoTransform) -> MemDataset {
        MemDataset::new(
            "test.tif",
            vec![RasterBuffer::zeros(DataType::UInt8, 10, 10)],
            transform,
        )
        .unwrap()
    }

    fn north_up() -> GeoTransform {
        GeoTransform::new(100.0, 200.0, 2.0, -2.0)
    }

    #[test]
    fn test_bounds_of_json_geometry() {
        let geom = json!({"type": "LineString", "coordinates": [[0, 0], [3, -2]]});
        assert_eq!(bounds(&geom, true, None).unwrap().to_array(), [0.0, -2.0, 3.0, 0.0]);
        assert!(bounds(&json!({"type": "Nothing"}), true, None).is_err());
    }

    #[test]
    fn test_window_of_box() {
        let ds = dataset(north_up());
        let shape = Geometry::rect(104.0, 190.0, 110.0, 196.0);
        let w = geometry_window(&ds, &[shape], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::new(2.0, 2.0, 3.0, 3.0));
    }

    #[test]
    fn test_partial_pixels_are_included() {
        let ds = dataset(north_up());
        let shape = Geometry::rect(105.0, 191.0, 109.0, 195.0);
        let w = geometry_window(&ds, &[shape], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::new(2.0, 2.0, 3.0, 3.0));
    }

    #[test]
    fn test_padding_in_pixels() {
        let ds = dataset(north_up());
        let shape = Geometry::rect(104.0, 190.0, 110.0, 196.0);
        let params = WindowParams {
            pad_x: 1.0,
            pad_y: 1.0,
            ..Default::default()
        };
        let w = geometry_window(&ds, &[shape], &params).unwrap();
        assert_eq!(w, Window::new(1.0, 1.0, 5.0, 5.0));
    }

    #[test]
    fn test_full_extent_and_clipping() {
        let ds = dataset(north_up());
        let full = Geometry::rect(100.0, 180.0, 120.0, 200.0);
        let w = geometry_window(&ds, &[full], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::full(10, 10));

        let larger = Geometry::rect(90.0, 170.0, 130.0, 210.0);
        let w = geometry_window(&ds, &[larger], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::full(10, 10));
    }

    #[test]
    fn test_multiple_shapes_envelope() {
        let ds = dataset(north_up());
        let shapes = vec![Geometry::point(101.0, 199.0), Geometry::point(107.0, 193.0)];
        let w = geometry_window(&ds, &shapes, &WindowParams::default()).unwrap();
        assert_eq!(w, Window::new(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn test_outside_raster_is_window_error() {
        let ds = dataset(north_up());
        let far = Geometry::rect(500.0, 500.0, 510.0, 510.0);
        assert!(matches!(
            geometry_window(&ds, &[far], &WindowParams::default()),
            Err(Error::WindowError(_))
        ));
    }

    #[test]
    fn test_empty_shapes_rejected() {
        let ds = dataset(north_up());
        let none: Vec<Geometry> = vec![];
        assert!(geometry_window(&ds, &none, &WindowParams::default()).is_err());
    }

    #[test]
    fn test_rotated_branch_agrees_on_rectilinear_transform() {
        let ds = dataset(north_up());
        let shape = Geometry::rect(104.0, 190.0, 110.0, 196.0);
        for pad in [0.0, 1.0] {
            let plain = WindowParams {
                pad_x: pad,
                pad_y: pad,
                ..Default::default()
            };
            let rotated = WindowParams {
                rotated: true,
                ..plain.clone()
            };
            assert_eq!(
                geometry_window(&ds, &[shape.clone()], &plain).unwrap(),
                geometry_window(&ds, &[shape.clone()], &rotated).unwrap()
            );
        }
    }

    #[test]
    fn test_branches_diverge_on_rotated_transform() {
        let transform = GeoTransform::from_gdal([0.0, 1.0, 1.0, 0.0, -1.0, 1.0]);
        let ds = dataset(transform);
        // world image of the pixel box cols 2..4, rows 3..5
        let corners = [(2.0, 3.0), (4.0, 3.0), (4.0, 5.0), (2.0, 5.0)]
            .map(|(c, r)| transform.apply(c, r));
        let shape = Geometry::polygon(&corners, &[]);

        let rotated = WindowParams {
            rotated: true,
            ..Default::default()
        };
        let w = geometry_window(&ds, &[shape.clone()], &rotated).unwrap();
        assert_eq!(w, Window::new(2.0, 3.0, 2.0, 2.0));

        // the world-space envelope of a rotated box covers more pixels
        let w = geometry_window(&ds, &[shape], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::new(1.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn test_south_up_envelope_uses_flipped_bounds() {
        let ds = dataset(GeoTransform::new(100.0, 200.0, 2.0, 2.0));
        let shapes = vec![
            Geometry::rect(104.0, 204.0, 106.0, 206.0),
            Geometry::rect(108.0, 208.0, 110.0, 210.0),
        ];
        let params = WindowParams {
            north_up: false,
            ..Default::default()
        };
        let w = geometry_window(&ds, &shapes, &params).unwrap();
        assert_eq!(w, Window::new(2.0, 2.0, 3.0, 3.0));

        let padded = WindowParams {
            pad_x: 1.0,
            pad_y: 1.0,
            ..params
        };
        let w = geometry_window(&ds, &shapes, &padded).unwrap();
        assert_eq!(w, Window::new(1.0, 1.0, 5.0, 5.0));
    }

    #[test]
    fn test_pixel_precision_decides_floor() {
        let ds = dataset(north_up());
        // left edge maps to column 1.9999
        let shape = Geometry::rect(103.9998, 190.0, 109.0, 196.0);

        let w = geometry_window(&ds, &[shape.clone()], &WindowParams::default()).unwrap();
        assert_eq!(w, Window::new(2.0, 2.0, 3.0, 3.0));

        for pixel_precision in [None, Some(5)] {
            let params = WindowParams {
                pixel_precision,
                ..Default::default()
            };
            let w = geometry_window(&ds, &[shape.clone()], &params).unwrap();
            assert_eq!(w, Window::new(1.0, 2.0, 4.0, 3.0));
        }
    }

    #[test]
    fn test_rotated_padding_counts_whole_pixels() {
        // pixel edges are sqrt(2) long here; a pad of 1 still adds one pixel
        let transform = GeoTransform::from_gdal([0.0, 1.0, 1.0, 0.0, -1.0, 1.0]);
        let ds = dataset(transform);
        let corners = [(2.0, 3.0), (4.0, 3.0), (4.0, 5.0), (2.0, 5.0)]
            .map(|(c, r)| transform.apply(c, r));
        let params = WindowParams {
            rotated: true,
            pad_x: 1.0,
            pad_y: 1.0,
            ..Default::default()
        };
        let w = geometry_window(&ds, &[Geometry::polygon(&corners, &[])], &params).unwrap();
        assert_eq!(w, Window::new(1.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn test_rotated_envelope_spans_all_rows() {
        let transform = GeoTransform::from_gdal([0.0, 1.0, 1.0, 0.0, -1.0, 1.0]);
        let ds = dataset(transform);
        let pixel_box = |c0: f64, r0: f64| {
            let corners = [(c0, r0), (c0 + 1.0, r0), (c0 + 1.0, r0 + 1.0), (c0, r0 + 1.0)]
                .map(|(c, r)| transform.apply(c, r));
            Geometry::polygon(&corners, &[])
        };
        let shapes = vec![pixel_box(2.0, 3.0), pixel_box(5.0, 6.0)];
        let params = WindowParams {
            rotated: true,
            ..Default::default()
        };
        // rows 3..7, not the overlap of the two boxes' row ranges
        let w = geometry_window(&ds, &shapes, &params).unwrap();
        assert_eq!(w, Window::new(2.0, 3.0, 4.0, 4.0));
    }
}
