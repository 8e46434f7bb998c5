//! Structural geometry validation
//!
//! A shallow check: each geometry type must carry the minimum number of
//! positions for its kind, and only the first position of compound types
//! is inspected for having at least x and y. It says nothing about
//! geometric correctness (self-intersection, ring orientation).

use rasterfeat_core::vector::{GeoInterface, Geometry, Position};

/// Whether an object presents a structurally valid geometry.
///
/// Objects that do not describe a recognisable geometry (no `type`, an
/// unknown `type` such as `Feature`, missing `coordinates`) are invalid;
/// this never fails.
pub fn is_valid_geom<G: GeoInterface + ?Sized>(geom: &G) -> bool {
    !geom.is_feature() && geom.geo_interface().is_some_and(|g| is_valid(&g))
}

fn has_xy(position: Option<&Position>) -> bool {
    position.is_some_and(|p| p.len() >= 2)
}

/// Structural validity of a parsed [`Geometry`].
pub fn is_valid(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point { coordinates } => coordinates.len() >= 2,
        Geometry::MultiPoint { coordinates } => has_xy(coordinates.first()),
        Geometry::LineString { coordinates } => {
            coordinates.len() >= 2 && has_xy(coordinates.first())
        }
        Geometry::LinearRing { coordinates } => {
            coordinates.len() >= 4 && has_xy(coordinates.first())
        }
        Geometry::MultiLineString { coordinates } => coordinates
            .first()
            .is_some_and(|line| line.len() >= 2 && has_xy(line.first())),
        Geometry::Polygon { coordinates } => coordinates
            .first()
            .is_some_and(|ring| ring.len() >= 4 && has_xy(ring.first())),
        Geometry::MultiPolygon { coordinates } => coordinates
            .first()
            .and_then(|polygon| polygon.first())
            .is_some_and(|ring| ring.len() >= 4 && has_xy(ring.first())),
        // empty collections would hand a null geometry to the burner
        Geometry::GeometryCollection { geometries } => {
            !geometries.is_empty() && geometries.iter().all(is_valid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfeat_core::vector::Feature;
    use serde_json::json;

    fn valid(value: serde_json::Value) -> bool {
        is_valid_geom(&value)
    }

    #[test]
    fn test_valid_geometries() {
        assert!(valid(json!({"type": "Point", "coordinates": [0, 0]})));
        assert!(valid(json!({"type": "MultiPoint", "coordinates": [[0, 0]]})));
        assert!(valid(json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]})));
        assert!(valid(json!({
            "type": "LinearRing",
            "coordinates": [[0, 0], [1, 0], [1, 1], [0, 0]]
        })));
        assert!(valid(json!({"type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]]]})));
        assert!(is_valid(&Geometry::rect(0.0, 0.0, 1.0, 1.0)));
        assert!(valid(json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]
        })));
    }

    #[test]
    fn test_cardinality_violations() {
        assert!(!valid(json!({"type": "Point", "coordinates": [0]})));
        assert!(!valid(json!({"type": "MultiPoint", "coordinates": []})));
        assert!(!valid(json!({"type": "MultiPoint", "coordinates": [[0]]})));
        assert!(!valid(json!({"type": "LineString", "coordinates": [[0, 0]]})));
        assert!(!valid(json!({
            "type": "LinearRing",
            "coordinates": [[0, 0], [1, 0], [0, 0]]
        })));
        assert!(!valid(json!({"type": "MultiLineString", "coordinates": []})));
        assert!(!valid(json!({"type": "MultiLineString", "coordinates": [[[0, 0]]]})));
        assert!(!valid(json!({"type": "Polygon", "coordinates": []})));
        assert!(!valid(json!({
            "type": "Polygon",
            "coordinates": [[[0, 0], [1, 0], [0, 0]]]
        })));
        assert!(!valid(json!({"type": "MultiPolygon", "coordinates": [[]]})));
    }

    #[test]
    fn test_only_first_position_is_inspected() {
        assert!(valid(json!({"type": "LineString", "coordinates": [[0, 0], [1]]})));
    }

    #[test]
    fn test_unrecognised_objects() {
        assert!(!valid(json!({"coordinates": [0, 0]})));
        assert!(!valid(json!({"type": "Circle", "coordinates": [0, 0]})));
        assert!(!valid(json!({"type": "Point"})));
        assert!(!valid(json!([0, 0])));
    }

    #[test]
    fn test_geometry_collections() {
        let point = json!({"type": "Point", "coordinates": [0, 0]});
        let bad = json!({"type": "Point", "coordinates": [0]});

        assert!(valid(json!({"type": "GeometryCollection", "geometries": [point]})));
        assert!(!valid(json!({"type": "GeometryCollection", "geometries": []})));
        assert!(!valid(json!({"type": "GeometryCollection", "geometries": [point, bad]})));
        assert!(!valid(json!({"type": "GeometryCollection"})));
    }

    #[test]
    fn test_features_are_not_geometries() {
        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [1.5, 2.5]}
        });
        assert!(valid(feature["geometry"].clone()));
        assert!(!valid(feature));

        let owned = Feature::new(Geometry::point(1.5, 2.5));
        assert!(!is_valid_geom(&owned));
    }
}
