//! Polygons from connected pixel regions, and small-region removal

use ndarray::Array2;
use rasterfeat_core::raster::{DataType, GeoTransform, RasterBuffer};
use rasterfeat_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{Connectivity, PolygonTracer, RasterVectorEngine, ScanlineEngine};

fn check_source(source: &RasterBuffer, mask: Option<&Array2<bool>>) -> Result<()> {
    if !source.dtype().is_burnable() {
        return Err(Error::InvalidDtype {
            param: "source",
            allowed: DataType::burnable_names(),
        });
    }
    if let Some(mask) = mask {
        let (er, ec) = source.shape();
        let (ar, ac) = mask.dim();
        if (er, ec) != (ar, ac) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
    }
    Ok(())
}

/// `(polygon, value)` for each region of adjacent pixels sharing a value.
///
/// Pixels where `mask` is `false` belong to no region. Coordinates are
/// produced through `transform`; pass [`GeoTransform::identity`] for
/// pixel coordinates. The returned iterator is lazy and single-pass.
pub fn shapes(
    source: &RasterBuffer,
    mask: Option<&Array2<bool>>,
    connectivity: Connectivity,
    transform: &GeoTransform,
) -> Result<PolygonTracer> {
    shapes_with(&ScanlineEngine, source, mask, connectivity, transform)
}

pub fn shapes_with<E: RasterVectorEngine>(
    engine: &E,
    source: &RasterBuffer,
    mask: Option<&Array2<bool>>,
    connectivity: Connectivity,
    transform: &GeoTransform,
) -> Result<E::Polygons> {
    check_source(source, mask)?;
    engine.trace_polygons(source, mask, connectivity, transform)
}

/// Parameters for sieving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SieveParams {
    /// Minimum region size, in pixels, to keep
    pub size: usize,
    pub connectivity: Connectivity,
}

impl Default for SieveParams {
    fn default() -> Self {
        Self {
            size: 2,
            connectivity: Connectivity::Four,
        }
    }
}

/// Sieve algorithm
#[derive(Debug, Clone, Default)]
pub struct Sieve;

impl Algorithm for Sieve {
    type Input = RasterBuffer;
    type Output = RasterBuffer;
    type Params = SieveParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Sieve"
    }

    fn description(&self) -> &'static str {
        "Replace small regions with the value of their largest neighbour"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        sieve(&input, &params, None, None)
    }
}

/// Replace regions smaller than `params.size` pixels with the value of
/// their largest neighbour.
///
/// Results go to `out` when given (same shape and dtype as `source`),
/// otherwise to a new zeroed buffer.
pub fn sieve(
    source: &RasterBuffer,
    params: &SieveParams,
    out: Option<RasterBuffer>,
    mask: Option<&Array2<bool>>,
) -> Result<RasterBuffer> {
    sieve_with(&ScanlineEngine, source, params, out, mask)
}

pub fn sieve_with<E: RasterVectorEngine>(
    engine: &E,
    source: &RasterBuffer,
    params: &SieveParams,
    out: Option<RasterBuffer>,
    mask: Option<&Array2<bool>>,
) -> Result<RasterBuffer> {
    check_source(source, mask)?;
    if params.size == 0 {
        return Err(Error::InvalidParameter {
            name: "size",
            value: "0".into(),
            reason: "must be > 0".into(),
        });
    }

    let (rows, cols) = source.shape();
    let mut out = out.unwrap_or_else(|| RasterBuffer::zeros(source.dtype(), rows, cols));
    if out.dtype() != source.dtype() {
        return Err(Error::InvalidParameter {
            name: "out",
            value: out.dtype().to_string(),
            reason: format!("must have the source dtype {}", source.dtype()),
        });
    }

    engine.sieve_merge(source, params.size, &mut out, mask, params.connectivity)?;
    Ok(out)
}
