use rasterfeat_core::raster::GeoTransform;
use rasterfeat_core::vector::{Bounds, GeoInterface};

pub(super) fn geometry_bounds<G: GeoInterface + ?Sized>(
    geometry: &G,
    north_up: bool,
    transform: Option<&GeoTransform>,
) -> Option<Bounds> {
    if transform.is_none() {
        if let Some(bbox) = geometry.bbox() {
            return Some(bbox);
        }
    }

    let geometry = geometry.geo_interface()?;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (x, y) in geometry.coords() {
        let (x, y) = match transform {
            Some(t) => t.apply(x, y),
            None => (x, y),
        };
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if min_x > max_x {
        return None;
    }

    Some(if north_up {
        Bounds::new(min_x, min_y, max_x, max_y)
    } else {
        Bounds::new(min_x, max_y, max_x, min_y)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfeat_core::vector::Geometry;
    use serde_json::json;

    #[test]
    fn test_envelope() {
        let line = Geometry::line_string(&[(1.0, 5.0), (-2.0, 3.0), (4.0, 4.0)]);
        let b = geometry_bounds(&line, true, None).unwrap();
        assert_eq!(b.to_array(), [-2.0, 3.0, 4.0, 5.0]);

        let flipped = geometry_bounds(&line, false, None).unwrap();
        assert_eq!(flipped.to_array(), [-2.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_embedded_bbox_wins() {
        let feature = json!({
            "type": "Point",
            "coordinates": [1.0, 1.0],
            "bbox": [0.0, 0.0, 10.0, 10.0]
        });
        let b = geometry_bounds(&feature, true, None).unwrap();
        assert_eq!(b.to_array(), [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_transformed() {
        let point = Geometry::point(10.0, 20.0);
        let t = GeoTransform::scale(2.0, 3.0);
        let b = geometry_bounds(&point, true, Some(&t)).unwrap();
        assert_eq!(b.to_array(), [20.0, 60.0, 20.0, 60.0]);
    }

    #[test]
    fn test_empty_geometry() {
        let empty = Geometry::MultiPoint {
            coordinates: vec![],
        };
        assert!(geometry_bounds(&empty, true, None).is_none());
    }
}
