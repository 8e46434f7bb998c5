//! Splitting geographic geometries at the antimeridian

use geo::BooleanOps;
use geo_types::{Coord, LineString, Polygon, Rect};
use rasterfeat_core::vector::{Geometry, Position};

/// Split lines and polygons with an edge spanning more than 180° of
/// longitude into parts that stay within [-180, 180]. Other geometries,
/// and those that do not cross, are returned unchanged.
pub fn cut_antimeridian(geometry: &Geometry) -> Geometry {
    match geometry {
        Geometry::Polygon { coordinates } => {
            let mut parts = cut_polygon(coordinates);
            if parts.len() == 1 {
                Geometry::Polygon {
                    coordinates: parts.remove(0),
                }
            } else {
                Geometry::MultiPolygon { coordinates: parts }
            }
        }
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates.iter().flat_map(|p| cut_polygon(p)).collect(),
        },
        Geometry::LineString { coordinates } => {
            let mut parts = cut_line(coordinates);
            if parts.len() == 1 {
                Geometry::LineString {
                    coordinates: parts.remove(0),
                }
            } else {
                Geometry::MultiLineString { coordinates: parts }
            }
        }
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: coordinates.iter().flat_map(|l| cut_line(l)).collect(),
        },
        Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
            geometries: geometries.iter().map(cut_antimeridian).collect(),
        },
        other => other.clone(),
    }
}

fn crosses(positions: &[Position]) -> bool {
    positions
        .windows(2)
        .any(|w| w[0].len() >= 2 && w[1].len() >= 2 && (w[1][0] - w[0][0]).abs() > 180.0)
}

/// Longitudes made continuous, starting within 180° of `reference`
fn unwrap_ring(ring: &[Position], reference: f64) -> LineString<f64> {
    let mut coords = Vec::with_capacity(ring.len());
    let mut previous = reference;
    for p in ring.iter().filter(|p| p.len() >= 2) {
        let mut x = p[0];
        while x - previous > 180.0 {
            x -= 360.0;
        }
        while x - previous < -180.0 {
            x += 360.0;
        }
        coords.push(Coord { x, y: p[1] });
        previous = x;
    }
    LineString::new(coords)
}

fn ring_positions(ring: &LineString<f64>, shift: f64) -> Vec<Position> {
    ring.coords().map(|c| vec![c.x + shift, c.y]).collect()
}

fn cut_polygon(rings: &[Vec<Position>]) -> Vec<Vec<Vec<Position>>> {
    let reference = match rings.first().and_then(|r| r.first()) {
        Some(p) if p.len() >= 2 && rings.iter().any(|r| crosses(r)) => p[0],
        _ => return vec![rings.to_vec()],
    };

    let mut unwrapped = rings.iter().map(|r| unwrap_ring(r, reference));
    let exterior = unwrapped.next().unwrap_or_else(|| LineString::new(vec![]));
    let polygon = Polygon::new(exterior, unwrapped.collect());

    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for c in polygon.exterior().coords() {
        min_y = min_y.min(c.y);
        max_y = max_y.max(c.y);
    }

    let mut parts = Vec::new();
    for offset in [-360.0, 0.0, 360.0] {
        let window = Rect::new(
            Coord {
                x: -180.0 + offset,
                y: min_y - 1.0,
            },
            Coord {
                x: 180.0 + offset,
                y: max_y + 1.0,
            },
        )
        .to_polygon();
        for piece in polygon.intersection(&window) {
            let mut rings = vec![ring_positions(piece.exterior(), -offset)];
            rings.extend(piece.interiors().iter().map(|r| ring_positions(r, -offset)));
            parts.push(rings);
        }
    }
    parts
}

fn cut_line(line: &[Position]) -> Vec<Vec<Position>> {
    if !crosses(line) {
        return vec![line.to_vec()];
    }

    let mut parts = Vec::new();
    let mut current: Vec<Position> = Vec::new();
    for p in line.iter().filter(|p| p.len() >= 2) {
        if let Some(prev) = current.last() {
            let dx = p[0] - prev[0];
            if dx.abs() > 180.0 {
                let (edge, x) = if dx > 0.0 {
                    (-180.0, p[0] - 360.0)
                } else {
                    (180.0, p[0] + 360.0)
                };
                let t = (edge - prev[0]) / (x - prev[0]);
                let y = prev[1] + t * (p[1] - prev[1]);
                current.push(vec![edge, y]);
                parts.push(std::mem::take(&mut current));
                current.push(vec![-edge, y]);
            }
        }
        current.push(p.clone());
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x_range(rings: &[Vec<Position>]) -> (f64, f64) {
        rings[0]
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[0]), hi.max(p[0]))
            })
    }

    #[test]
    fn test_polygon_is_split() {
        let square = Geometry::polygon(
            &[(170.0, 10.0), (-170.0, 10.0), (-170.0, 20.0), (170.0, 20.0)],
            &[],
        );
        let Geometry::MultiPolygon { coordinates } = cut_antimeridian(&square) else {
            panic!("expected a multipolygon");
        };
        assert_eq!(coordinates.len(), 2);

        let mut ranges: Vec<_> = coordinates.iter().map(|p| x_range(p)).collect();
        ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_relative_eq!(ranges[0].0, -180.0);
        assert_relative_eq!(ranges[0].1, -170.0);
        assert_relative_eq!(ranges[1].0, 170.0);
        assert_relative_eq!(ranges[1].1, 180.0);
    }

    #[test]
    fn test_polygon_that_does_not_cross_is_untouched() {
        let square = Geometry::rect(10.0, 10.0, 20.0, 20.0);
        assert_eq!(cut_antimeridian(&square), square);
    }

    #[test]
    fn test_line_is_split_at_crossing() {
        let line = Geometry::line_string(&[(170.0, 0.0), (-170.0, 10.0)]);
        let Geometry::MultiLineString { coordinates } = cut_antimeridian(&line) else {
            panic!("expected a multilinestring");
        };
        assert_eq!(coordinates.len(), 2);
        assert_eq!(coordinates[0].last().unwrap(), &vec![180.0, 5.0]);
        assert_eq!(coordinates[1][0], vec![-180.0, 5.0]);
    }
}
