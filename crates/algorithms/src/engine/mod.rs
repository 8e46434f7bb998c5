//! Raster-vector engine
//!
//! The four primitives the feature algorithms are built on: burning
//! geometries into a grid, tracing polygons out of one, merging small
//! regions away, and measuring geometry bounds. [`RasterVectorEngine`] is
//! the seam; [`ScanlineEngine`] is the pure-Rust implementation.

mod bounds;
mod burn;
mod label;
mod sieve;
mod trace;

pub use trace::PolygonTracer;

use ndarray::Array2;
use rasterfeat_core::raster::{GeoTransform, RasterBuffer};
use rasterfeat_core::vector::{Bounds, GeoInterface, Geometry};
use rasterfeat_core::Result;
use serde::{Deserialize, Serialize};

/// Pixel adjacency used to group pixels into regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge neighbours only
    #[default]
    Four,
    /// Edge and corner neighbours
    Eight,
}

impl Connectivity {
    /// (row, col) neighbour offsets
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
        const EIGHT: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = rasterfeat_core::Error;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(rasterfeat_core::Error::InvalidParameter {
                name: "connectivity",
                value: other.to_string(),
                reason: "must be 4 or 8".into(),
            }),
        }
    }
}

/// How burned values combine with what is already in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAlg {
    /// The new value overwrites the existing one
    #[default]
    Replace,
    /// The new value is added to the existing one
    Add,
}

/// Low-level raster/vector conversion primitives.
///
/// Masks are `true` where pixels take part. All buffers are caller-owned
/// and written in place; nothing is retained after a call returns.
pub trait RasterVectorEngine {
    /// Single-pass sequence of `(polygon, value)` pairs
    type Polygons: Iterator<Item = (Geometry, f64)>;

    /// Trace polygons around connected regions of equal value.
    fn trace_polygons(
        &self,
        image: &RasterBuffer,
        mask: Option<&Array2<bool>>,
        connectivity: Connectivity,
        transform: &GeoTransform,
    ) -> Result<Self::Polygons>;

    /// Replace regions smaller than `min_size` pixels with the value of
    /// their largest neighbouring region, writing the result to `out`.
    fn sieve_merge(
        &self,
        image: &RasterBuffer,
        min_size: usize,
        out: &mut RasterBuffer,
        mask: Option<&Array2<bool>>,
        connectivity: Connectivity,
    ) -> Result<()>;

    /// Burn `(geometry, value)` pairs into `out`.
    fn rasterize_burn(
        &self,
        shapes: &[(Geometry, f64)],
        out: &mut RasterBuffer,
        transform: &GeoTransform,
        all_touched: bool,
        merge_alg: MergeAlg,
    ) -> Result<()>;

    /// `(left, bottom, right, top)` of a geometry, optionally after mapping
    /// its coordinates through `transform`. An embedded bbox is returned
    /// as is when no transform is given.
    fn geometry_bounds<G: GeoInterface + ?Sized>(
        &self,
        geometry: &G,
        north_up: bool,
        transform: Option<&GeoTransform>,
    ) -> Option<Bounds>;
}

/// Scanline rasterizer and connected-component polygon tracer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineEngine;

impl RasterVectorEngine for ScanlineEngine {
    type Polygons = PolygonTracer;

    fn trace_polygons(
        &self,
        image: &RasterBuffer,
        mask: Option<&Array2<bool>>,
        connectivity: Connectivity,
        transform: &GeoTransform,
    ) -> Result<PolygonTracer> {
        PolygonTracer::new(image, mask, connectivity, *transform)
    }

    fn sieve_merge(
        &self,
        image: &RasterBuffer,
        min_size: usize,
        out: &mut RasterBuffer,
        mask: Option<&Array2<bool>>,
        connectivity: Connectivity,
    ) -> Result<()> {
        sieve::sieve_merge(image, min_size, out, mask, connectivity)
    }

    fn rasterize_burn(
        &self,
        shapes: &[(Geometry, f64)],
        out: &mut RasterBuffer,
        transform: &GeoTransform,
        all_touched: bool,
        merge_alg: MergeAlg,
    ) -> Result<()> {
        burn::rasterize_burn(shapes, out, transform, all_touched, merge_alg)
    }

    fn geometry_bounds<G: GeoInterface + ?Sized>(
        &self,
        geometry: &G,
        north_up: bool,
        transform: Option<&GeoTransform>,
    ) -> Option<Bounds> {
        bounds::geometry_bounds(geometry, north_up, transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_from_int() {
        assert_eq!(Connectivity::try_from(4).unwrap(), Connectivity::Four);
        assert_eq!(Connectivity::try_from(8).unwrap(), Connectivity::Eight);
        assert!(Connectivity::try_from(6).is_err());
        assert_eq!(Connectivity::Eight.offsets().len(), 8);
    }
}
