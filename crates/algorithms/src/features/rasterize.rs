//! Burning geometries into rasters

use ndarray::Array2;
use rasterfeat_core::raster::{DataType, GeoTransform, RasterBuffer, Scalar};
use rasterfeat_core::vector::{GeoInterface, Geometry};
use rasterfeat_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::dtype::{BurnTarget, DtypeNegotiator};
use super::validate::is_valid;
use crate::engine::{MergeAlg, RasterVectorEngine, ScanlineEngine};

/// One input to [`rasterize`].
#[derive(Debug, Clone)]
pub enum ShapeItem<G = Geometry> {
    /// Burned with `default_value`
    Geometry(G),
    /// Burned with the given value, or with `fill` when it is `None`
    Valued(G, Option<Scalar>),
}

impl<G> ShapeItem<G> {
    pub fn new(geometry: G) -> Self {
        ShapeItem::Geometry(geometry)
    }

    pub fn with_value(geometry: G, value: impl Into<Scalar>) -> Self {
        ShapeItem::Valued(geometry, Some(value.into()))
    }
}

impl<G> From<(G, Scalar)> for ShapeItem<G> {
    fn from((geometry, value): (G, Scalar)) -> Self {
        ShapeItem::Valued(geometry, Some(value))
    }
}

impl<G> From<(G, Option<Scalar>)> for ShapeItem<G> {
    fn from((geometry, value): (G, Option<Scalar>)) -> Self {
        ShapeItem::Valued(geometry, value)
    }
}

/// Parameters for rasterization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizeParams {
    /// Value of pixels no geometry covers
    pub fill: Scalar,
    /// Value burned for geometries given without one
    pub default_value: Scalar,
    /// Maps pixel coordinates to the geometries' coordinate system
    pub transform: GeoTransform,
    /// Burn every pixel a geometry touches, not just those whose centre
    /// it covers
    pub all_touched: bool,
    pub merge_alg: MergeAlg,
    /// Output dtype; chosen from the values when `None`
    pub dtype: Option<DataType>,
}

impl Default for RasterizeParams {
    fn default() -> Self {
        Self {
            fill: Scalar::Int(0),
            default_value: Scalar::Int(1),
            transform: GeoTransform::identity(),
            all_touched: false,
            merge_alg: MergeAlg::Replace,
            dtype: None,
        }
    }
}

/// Outcome of a burn
#[derive(Debug, Clone)]
pub struct Rasterized {
    pub buffer: RasterBuffer,
    pub dtype: DataType,
    /// Input positions of shapes skipped as invalid or empty
    pub skipped: Vec<usize>,
}

/// Rasterize algorithm
#[derive(Debug, Clone, Default)]
pub struct Rasterize;

impl Algorithm for Rasterize {
    type Input = (Vec<ShapeItem>, BurnTarget);
    type Output = RasterBuffer;
    type Params = RasterizeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Rasterize"
    }

    fn description(&self) -> &'static str {
        "Burn vector geometries into a raster buffer"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (shapes, target) = input;
        rasterize(shapes, target, &params)
    }
}

/// Burn geometries into a new buffer of the target shape, or into the
/// buffer given as target.
///
/// Invalid or empty geometries are skipped with a warning; if none remain
/// the call fails with [`Error::NoValidGeometry`]. Geometry collections
/// are burned member by member with the collection's value.
pub fn rasterize<G, I>(shapes: I, target: impl Into<BurnTarget>, params: &RasterizeParams) -> Result<RasterBuffer>
where
    G: GeoInterface,
    I: IntoIterator<Item = ShapeItem<G>>,
{
    rasterize_with(&ScanlineEngine, shapes, target, params).map(|r| r.buffer)
}

/// [`rasterize`] on a specific engine, reporting the resolved dtype and
/// the skipped shapes.
pub fn rasterize_with<E, G, I>(
    engine: &E,
    shapes: I,
    target: impl Into<BurnTarget>,
    params: &RasterizeParams,
) -> Result<Rasterized>
where
    E: RasterVectorEngine,
    G: GeoInterface,
    I: IntoIterator<Item = ShapeItem<G>>,
{
    let negotiator = DtypeNegotiator::new(params.fill, params.default_value, params.dtype);
    negotiator.check_params()?;

    let mut valid_shapes: Vec<(Geometry, Scalar)> = Vec::new();
    let mut shape_values = Vec::new();
    let mut skipped = Vec::new();

    for (index, item) in shapes.into_iter().enumerate() {
        let (geom, value) = match item {
            ShapeItem::Geometry(g) => (g, params.default_value),
            ShapeItem::Valued(g, value) => (g, value.unwrap_or(params.fill)),
        };

        let parsed = if geom.is_feature() {
            None
        } else {
            geom.geo_interface()
        };
        match parsed {
            Some(geometry) if is_valid(&geometry) => {
                shape_values.push(value);
                match geometry.into_owned() {
                    // one level only, so holes of one member do not cut
                    // into its siblings
                    Geometry::GeometryCollection { geometries } => {
                        valid_shapes.extend(geometries.into_iter().map(|part| (part, value)));
                    }
                    geometry => valid_shapes.push((geometry, value)),
                }
            }
            _ => {
                warn!("Invalid or empty shape at index {index} will not be rasterized");
                skipped.push(index);
            }
        }
    }

    if valid_shapes.is_empty() {
        return Err(Error::NoValidGeometry);
    }

    let (dtype, mut buffer) = negotiator.resolve(&shape_values, target.into())?;

    let burn: Vec<(Geometry, f64)> = valid_shapes
        .into_iter()
        .map(|(g, v)| (g, v.as_f64()))
        .collect();
    engine.rasterize_burn(
        &burn,
        &mut buffer,
        &params.transform,
        params.all_touched,
        params.merge_alg,
    )?;

    Ok(Rasterized {
        buffer,
        dtype,
        skipped,
    })
}

/// A boolean mask from geometries: `false` over the geometries and `true`
/// elsewhere, or the reverse with `invert`.
pub fn geometry_mask<G, I>(
    geometries: I,
    out_shape: (usize, usize),
    transform: &GeoTransform,
    all_touched: bool,
    invert: bool,
) -> Result<Array2<bool>>
where
    G: GeoInterface,
    I: IntoIterator<Item = G>,
{
    let (fill, mask_value) = if invert { (0, 1) } else { (1, 0) };
    let params = RasterizeParams {
        fill: Scalar::Int(fill),
        default_value: Scalar::Int(mask_value),
        transform: *transform,
        all_touched,
        ..Default::default()
    };
    let burned = rasterize(
        geometries.into_iter().map(ShapeItem::new),
        out_shape,
        &params,
    )?;
    Ok(burned.to_f64().mapv(|v| v != 0.0))
}
