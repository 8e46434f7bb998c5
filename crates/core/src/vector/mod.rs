//! Vector data structures: GeoJSON geometries and features

mod feature;
mod geometry;

pub use feature::{AttributeValue, Feature};
pub use geometry::{Bounds, GeoInterface, Geometry, Position};
