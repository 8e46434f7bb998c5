//! GeoJSON-like geometries

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{Error, Result};

/// A coordinate tuple with at least x and y; extra ordinates are carried
/// through untouched.
pub type Position = Vec<f64>;

/// A GeoJSON geometry, discriminated by its `type` member.
///
/// Coordinates are stored as nested sequences exactly as GeoJSON lays them
/// out, so structurally incomplete geometries (a ring of two positions, a
/// point with one ordinate) can be represented and rejected by validation
/// instead of by parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    LinearRing { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point {
            coordinates: vec![x, y],
        }
    }

    pub fn line_string(coords: &[(f64, f64)]) -> Self {
        Geometry::LineString {
            coordinates: to_positions(coords),
        }
    }

    /// A polygon from an exterior ring and optional holes. Rings are
    /// closed if the last position does not repeat the first.
    pub fn polygon(exterior: &[(f64, f64)], holes: &[&[(f64, f64)]]) -> Self {
        let mut rings = vec![closed(to_positions(exterior))];
        rings.extend(holes.iter().map(|h| closed(to_positions(h))));
        Geometry::Polygon { coordinates: rings }
    }

    /// Axis-aligned rectangle polygon
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::polygon(
            &[
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
            ],
            &[],
        )
    }

    /// GeoJSON `type` name
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::LinearRing { .. } => "LinearRing",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Visit every position, depth first, in document order
    pub fn for_each_position<F: FnMut(&[f64])>(&self, f: &mut F) {
        match self {
            Geometry::Point { coordinates } => f(coordinates.as_slice()),
            Geometry::MultiPoint { coordinates }
            | Geometry::LineString { coordinates }
            | Geometry::LinearRing { coordinates } => coordinates.iter().for_each(|p| f(p.as_slice())),
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(|p| f(p.as_slice()))
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(|p| f(p.as_slice()))
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().for_each(|g| g.for_each_position(f))
            }
        }
    }

    /// All x/y pairs, depth first
    pub fn coords(&self) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        self.for_each_position(&mut |p: &[f64]| {
            if p.len() >= 2 {
                out.push((p[0], p[1]));
            }
        });
        out
    }

    /// Rebuild the geometry with every x/y pair passed through `f`.
    pub fn try_map_coords<F>(&self, f: &mut F) -> Result<Geometry>
    where
        F: FnMut(f64, f64) -> Result<(f64, f64)>,
    {
        fn map_pos<F: FnMut(f64, f64) -> Result<(f64, f64)>>(p: &Position, f: &mut F) -> Result<Position> {
            if p.len() < 2 {
                return Err(Error::InvalidParameter {
                    name: "coordinates",
                    value: format!("{p:?}"),
                    reason: "position needs at least x and y".into(),
                });
            }
            let (x, y) = f(p[0], p[1])?;
            let mut out = p.clone();
            out[0] = x;
            out[1] = y;
            Ok(out)
        }
        fn map_seq<F: FnMut(f64, f64) -> Result<(f64, f64)>>(s: &[Position], f: &mut F) -> Result<Vec<Position>> {
            s.iter().map(|p| map_pos(p, f)).collect()
        }

        Ok(match self {
            Geometry::Point { coordinates } => Geometry::Point {
                coordinates: map_pos(coordinates, f)?,
            },
            Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
                coordinates: map_seq(coordinates, f)?,
            },
            Geometry::LineString { coordinates } => Geometry::LineString {
                coordinates: map_seq(coordinates, f)?,
            },
            Geometry::LinearRing { coordinates } => Geometry::LinearRing {
                coordinates: map_seq(coordinates, f)?,
            },
            Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
                coordinates: coordinates.iter().map(|s| map_seq(s, f)).collect::<Result<_>>()?,
            },
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates.iter().map(|s| map_seq(s, f)).collect::<Result<_>>()?,
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|poly| poly.iter().map(|s| map_seq(s, f)).collect::<Result<Vec<_>>>())
                    .collect::<Result<_>>()?,
            },
            Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
                geometries: geometries
                    .iter()
                    .map(|g| g.try_map_coords(f))
                    .collect::<Result<_>>()?,
            },
        })
    }

    /// Infallible variant of [`Geometry::try_map_coords`]; positions with
    /// fewer than two ordinates are left as they are.
    pub fn map_coords<F: FnMut(f64, f64) -> (f64, f64)>(&self, mut f: F) -> Geometry {
        let mut clone = self.clone();
        clone.for_each_position_mut(&mut |p: &mut Position| {
            if p.len() >= 2 {
                let (x, y) = f(p[0], p[1]);
                p[0] = x;
                p[1] = y;
            }
        });
        clone
    }

    fn for_each_position_mut<F: FnMut(&mut Position)>(&mut self, f: &mut F) {
        match self {
            Geometry::Point { coordinates } => f(coordinates),
            Geometry::MultiPoint { coordinates }
            | Geometry::LineString { coordinates }
            | Geometry::LinearRing { coordinates } => coordinates.iter_mut().for_each(|p| f(p)),
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter_mut().flatten().for_each(|p| f(p))
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(|p| f(p)),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter_mut().for_each(|g| g.for_each_position_mut(f))
            }
        }
    }
}

fn to_positions(coords: &[(f64, f64)]) -> Vec<Position> {
    coords.iter().map(|&(x, y)| vec![x, y]).collect()
}

fn closed(mut ring: Vec<Position>) -> Vec<Position> {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = first.clone();
            ring.push(first);
        }
    }
    ring
}

/// Bounding box as `(left, bottom, right, top)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn from_array(b: [f64; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.left, self.bottom, self.right, self.top]
    }
}

/// Anything that can present itself as a GeoJSON geometry.
///
/// Implemented for [`Geometry`], for features, for raw JSON values and for
/// `geo_types` geometries. Objects that do not describe a recognisable
/// geometry return `None`.
pub trait GeoInterface {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>>;

    /// A precomputed bounding box carried by the object, if any
    fn bbox(&self) -> Option<Bounds> {
        None
    }

    /// Whether the object is a feature wrapping a geometry rather than a
    /// geometry itself. Features expose their geometry for bounds but are
    /// not valid burn inputs.
    fn is_feature(&self) -> bool {
        false
    }
}

impl GeoInterface for Geometry {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>> {
        Some(Cow::Borrowed(self))
    }
}

impl<T: GeoInterface + ?Sized> GeoInterface for &T {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>> {
        (**self).geo_interface()
    }

    fn bbox(&self) -> Option<Bounds> {
        (**self).bbox()
    }

    fn is_feature(&self) -> bool {
        (**self).is_feature()
    }
}

impl GeoInterface for serde_json::Value {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>> {
        let value = match self.get("type").and_then(|t| t.as_str()) {
            Some("Feature") => self.get("geometry")?,
            Some(_) => self,
            None => return None,
        };
        serde_json::from_value(value.clone()).ok().map(Cow::Owned)
    }

    fn bbox(&self) -> Option<Bounds> {
        let b = self.get("bbox")?.as_array()?;
        if b.len() < 4 {
            return None;
        }
        let v: Option<Vec<f64>> = b.iter().take(4).map(|x| x.as_f64()).collect();
        v.map(|v| Bounds::new(v[0], v[1], v[2], v[3]))
    }
    fn is_feature(&self) -> bool {
        self.get("type").and_then(|t| t.as_str()) == Some("Feature")
    }
}

impl GeoInterface for geo_types::Geometry<f64> {
    fn geo_interface(&self) -> Option<Cow<'_, Geometry>> {
        Some(Cow::Owned(Geometry::from(self)))
    }
}

fn coord_pos(c: &geo_types::Coord<f64>) -> Position {
    vec![c.x, c.y]
}

fn line_pos(ls: &geo_types::LineString<f64>) -> Vec<Position> {
    ls.0.iter().map(coord_pos).collect()
}

fn polygon_pos(p: &geo_types::Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(line_pos)
        .collect()
}

impl From<&geo_types::Geometry<f64>> for Geometry {
    fn from(g: &geo_types::Geometry<f64>) -> Self {
        use geo_types::Geometry as G;
        match g {
            G::Point(p) => Geometry::Point {
                coordinates: coord_pos(&p.0),
            },
            G::Line(l) => Geometry::LineString {
                coordinates: vec![coord_pos(&l.start), coord_pos(&l.end)],
            },
            G::LineString(ls) => Geometry::LineString {
                coordinates: line_pos(ls),
            },
            G::Polygon(p) => Geometry::Polygon {
                coordinates: polygon_pos(p),
            },
            G::MultiPoint(mp) => Geometry::MultiPoint {
                coordinates: mp.0.iter().map(|p| coord_pos(&p.0)).collect(),
            },
            G::MultiLineString(mls) => Geometry::MultiLineString {
                coordinates: mls.0.iter().map(line_pos).collect(),
            },
            G::MultiPolygon(mp) => Geometry::MultiPolygon {
                coordinates: mp.0.iter().map(polygon_pos).collect(),
            },
            G::GeometryCollection(gc) => Geometry::GeometryCollection {
                geometries: gc.0.iter().map(Geometry::from).collect(),
            },
            G::Rect(r) => Geometry::Polygon {
                coordinates: polygon_pos(&r.to_polygon()),
            },
            G::Triangle(t) => Geometry::Polygon {
                coordinates: polygon_pos(&t.to_polygon()),
            },
        }
    }
}

fn to_coord(p: &Position) -> Result<geo_types::Coord<f64>> {
    match p.as_slice() {
        [x, y, ..] => Ok(geo_types::Coord { x: *x, y: *y }),
        _ => Err(Error::InvalidParameter {
            name: "coordinates",
            value: format!("{p:?}"),
            reason: "position needs at least x and y".into(),
        }),
    }
}

fn to_line(s: &[Position]) -> Result<geo_types::LineString<f64>> {
    Ok(geo_types::LineString::new(s.iter().map(to_coord).collect::<Result<_>>()?))
}

fn to_polygon(rings: &[Vec<Position>]) -> Result<geo_types::Polygon<f64>> {
    let mut rings = rings.iter().map(|r| to_line(r));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| geo_types::LineString::new(vec![]));
    Ok(geo_types::Polygon::new(exterior, rings.collect::<Result<_>>()?))
}

impl TryFrom<&Geometry> for geo_types::Geometry<f64> {
    type Error = Error;

    fn try_from(g: &Geometry) -> Result<Self> {
        use geo_types::Geometry as G;
        Ok(match g {
            Geometry::Point { coordinates } => G::Point(geo_types::Point(to_coord(coordinates)?)),
            Geometry::MultiPoint { coordinates } => G::MultiPoint(geo_types::MultiPoint(
                coordinates
                    .iter()
                    .map(|p| to_coord(p).map(geo_types::Point))
                    .collect::<Result<_>>()?,
            )),
            Geometry::LineString { coordinates } | Geometry::LinearRing { coordinates } => {
                G::LineString(to_line(coordinates)?)
            }
            Geometry::MultiLineString { coordinates } => G::MultiLineString(geo_types::MultiLineString(
                coordinates.iter().map(|s| to_line(s)).collect::<Result<_>>()?,
            )),
            Geometry::Polygon { coordinates } => G::Polygon(to_polygon(coordinates)?),
            Geometry::MultiPolygon { coordinates } => G::MultiPolygon(geo_types::MultiPolygon(
                coordinates.iter().map(|p| to_polygon(p)).collect::<Result<_>>()?,
            )),
            Geometry::GeometryCollection { geometries } => G::GeometryCollection(
                geo_types::GeometryCollection(
                    geometries
                        .iter()
                        .map(geo_types::Geometry::try_from)
                        .collect::<Result<_>>()?,
                ),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_tagged() {
        let g: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap();
        assert_eq!(g.type_name(), "Polygon");
        assert_eq!(g.coords().len(), 4);
    }

    #[test]
    fn test_polygon_closes_rings() {
        let g = Geometry::rect(0.0, 0.0, 2.0, 3.0);
        match &g {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].len(), 5);
                assert_eq!(coordinates[0].first(), coordinates[0].last());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_map_coords_keeps_z() {
        let g = Geometry::Point {
            coordinates: vec![1.0, 2.0, 3.0],
        };
        let moved = g.map_coords(|x, y| (x + 10.0, y * 2.0));
        assert_eq!(
            moved,
            Geometry::Point {
                coordinates: vec![11.0, 4.0, 3.0]
            }
        );
    }

    #[test]
    fn test_json_value_interface() {
        let feature = json!({
            "type": "Feature",
            "bbox": [0.0, 1.0, 2.0, 3.0],
            "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}
        });
        assert_eq!(feature.geo_interface().unwrap().type_name(), "Point");
        assert_eq!(feature.bbox(), Some(Bounds::new(0.0, 1.0, 2.0, 3.0)));
        assert!(feature.is_feature());
        assert!(!feature["geometry"].is_feature());

        assert!(json!({"coordinates": [0.0, 0.0]}).geo_interface().is_none());
        assert!(json!({"type": "Circle", "coordinates": [0.0, 0.0]}).geo_interface().is_none());
    }

    #[test]
    fn test_geo_types_roundtrip() {
        let g = Geometry::polygon(
            &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)],
            &[&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0)]],
        );
        let gt = geo_types::Geometry::try_from(&g).unwrap();
        assert_eq!(Geometry::from(&gt), g);
    }
}
