//! Geometry reprojection
//!
//! [`GeometryReprojector`] is the seam used by feature extraction to move
//! traced polygons into geographic coordinates. [`ProjReprojector`] runs on
//! proj4rs, resolving EPSG codes through the crs-definitions database.

mod antimeridian;

pub use antimeridian::cut_antimeridian;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use rasterfeat_core::raster::round_to;
use rasterfeat_core::vector::Geometry;
use rasterfeat_core::{Error, Result, CRS};

/// Transforms geometries between coordinate reference systems.
pub trait GeometryReprojector {
    /// Reproject `geometry` from `src` to `dst`.
    ///
    /// With `antimeridian_cutting`, geographic output that crosses the
    /// ±180° meridian is split into parts on either side. With `precision`,
    /// output coordinates are rounded to that many decimal places.
    fn reproject_geometry(
        &self,
        src: &CRS,
        dst: &CRS,
        geometry: &Geometry,
        antimeridian_cutting: bool,
        precision: Option<u32>,
    ) -> Result<Geometry>;
}

/// Pure-Rust reprojection backed by proj4rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjReprojector;

/// PROJ definition of a CRS
fn proj_string(crs: &CRS) -> Result<String> {
    if let Some(proj) = crs.proj() {
        return Ok(proj.to_string());
    }
    crs.epsg()
        .and_then(|code| u16::try_from(code).ok())
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4.to_string())
        .ok_or_else(|| Error::Reprojection(format!("no PROJ definition available for {crs}")))
}

fn is_longlat(crs: &CRS, definition: &str) -> bool {
    crs.is_geographic() || definition.contains("+proj=longlat")
}

impl GeometryReprojector for ProjReprojector {
    fn reproject_geometry(
        &self,
        src: &CRS,
        dst: &CRS,
        geometry: &Geometry,
        antimeridian_cutting: bool,
        precision: Option<u32>,
    ) -> Result<Geometry> {
        let dst_definition = proj_string(dst)?;
        let dst_geographic = is_longlat(dst, &dst_definition);

        let mut out = if src.is_equivalent(dst) {
            geometry.clone()
        } else {
            let src_definition = proj_string(src)?;
            let src_geographic = is_longlat(src, &src_definition);
            let src_proj = Proj::from_proj_string(&src_definition)
                .map_err(|e| Error::Reprojection(format!("invalid source projection {src}: {e:?}")))?;
            let dst_proj = Proj::from_proj_string(&dst_definition)
                .map_err(|e| Error::Reprojection(format!("invalid target projection {dst}: {e:?}")))?;

            geometry.try_map_coords(&mut |x, y| {
                // proj4rs works in radians for geographic systems
                let mut point = if src_geographic {
                    (x.to_radians(), y.to_radians(), 0.0)
                } else {
                    (x, y, 0.0)
                };
                transform(&src_proj, &dst_proj, &mut point).map_err(|e| {
                    Error::Reprojection(format!("transform from {src} to {dst} failed: {e:?}"))
                })?;
                Ok(if dst_geographic {
                    (point.0.to_degrees(), point.1.to_degrees())
                } else {
                    (point.0, point.1)
                })
            })?
        };

        if antimeridian_cutting && dst_geographic {
            out = cut_antimeridian(&out);
        }
        if let Some(places) = precision {
            out = out.map_coords(|x, y| (round_to(x, places), round_to(y, places)));
        }
        Ok(out)
    }
}
