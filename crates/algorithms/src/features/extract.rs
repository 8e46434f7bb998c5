//! GeoJSON features from raster datasets

use ndarray::Array2;
use rasterfeat_core::dataset::RasterDataset;
use rasterfeat_core::raster::{GeoTransform, RasterBuffer, RasterElement};
use rasterfeat_core::vector::{AttributeValue, Feature, Geometry};
use rasterfeat_core::{with_buffer, Error, Result, CRS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::engine::{Connectivity, PolygonTracer, RasterVectorEngine, ScanlineEngine};
use crate::reproject::{GeometryReprojector, ProjReprojector};

/// Parameters for [`dataset_features`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureParams {
    /// Band to read, 1-based. `None` reads band 1 for data and combines
    /// every band's validity mask.
    pub band: Option<usize>,
    /// Inverse sampling fraction; 10 decimates to a tenth on each axis
    pub sampling: usize,
    /// Extract from band values (`true`) or from the validity mask only
    pub from_band: bool,
    /// Treat the band as a mask: every non-zero value becomes one class
    pub as_mask: bool,
    /// Include regions of invalid (nodata) pixels
    pub with_nodata: bool,
    /// Output geometries in WGS84 longitude/latitude
    pub geographic: bool,
    /// Decimal places kept in reprojected coordinates
    pub precision: Option<u32>,
    pub connectivity: Connectivity,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            band: Some(1),
            sampling: 1,
            from_band: true,
            as_mask: false,
            with_nodata: false,
            geographic: true,
            precision: None,
            connectivity: Connectivity::Four,
        }
    }
}

/// Lazy, single-pass sequence of features traced from one dataset read.
///
/// Dropping it early is fine; iterating again needs a fresh call to
/// [`dataset_features`].
pub struct DatasetFeatures<P, R> {
    polygons: P,
    index: usize,
    basename: String,
    reprojector: R,
    source_crs: Option<CRS>,
    precision: Option<u32>,
}

impl<P, R> std::fmt::Debug for DatasetFeatures<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetFeatures")
            .field("basename", &self.basename)
            .field("index", &self.index)
            .finish()
    }
}

impl<P, R> Iterator for DatasetFeatures<P, R>
where
    P: Iterator<Item = (Geometry, f64)>,
    R: GeometryReprojector,
{
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        let (geometry, value) = self.polygons.next()?;
        let index = self.index;
        self.index += 1;

        let geometry = match &self.source_crs {
            Some(src) => match self.reprojector.reproject_geometry(
                src,
                &CRS::wgs84(),
                &geometry,
                true,
                self.precision,
            ) {
                Ok(g) => g,
                Err(e) => return Some(Err(e)),
            },
            None => geometry,
        };
        Some(Ok(self.feature(index, geometry, value)))
    }
}

impl<P, R> DatasetFeatures<P, R> {
    fn feature(&self, index: usize, geometry: Geometry, value: f64) -> Feature {
        let mut feature = Feature::new(geometry);
        feature.id = Some(format!("{}:{}", self.basename, index));
        feature.set_property("val", AttributeValue::Float(value));
        feature.set_property("filename", AttributeValue::String(self.basename.clone()));

        let coords = feature.geometry.as_ref().map(Geometry::coords).unwrap_or_default();
        if !coords.is_empty() {
            let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
            for (x, y) in coords {
                bbox[0] = bbox[0].min(x);
                bbox[1] = bbox[1].min(y);
                bbox[2] = bbox[2].max(x);
                bbox[3] = bbox[3].max(y);
            }
            feature.bbox = Some(bbox);
        }
        feature
    }
}

/// Shape of a raster decimated by `sampling` and the transform that keeps
/// its corners where the full-resolution corners were.
///
/// The adjustment is a translation by the decimation remainder followed
/// by a scale; applying them the other way round moves the origin.
pub fn decimate(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    sampling: usize,
) -> ((usize, usize), GeoTransform) {
    let rows = height.div_ceil(sampling);
    let cols = width.div_ceil(sampling);
    let x_sampling = width as f64 / cols as f64;
    let y_sampling = height as f64 / rows as f64;

    let shift_x = snapped_remainder(width as f64, x_sampling);
    let shift_y = snapped_remainder(height as f64, y_sampling);

    let adjusted = *transform
        * GeoTransform::translation(shift_x, shift_y)
        * GeoTransform::scale(x_sampling, y_sampling);
    ((rows, cols), adjusted)
}

/// `size % factor`, with values within rounding noise of `0` or of
/// `factor` taken as zero
fn snapped_remainder(size: f64, factor: f64) -> f64 {
    let remainder = size % factor;
    let tolerance = 1e-9 * factor.max(1.0);
    if remainder < tolerance || factor - remainder < tolerance {
        0.0
    } else {
        remainder
    }
}

fn binarize<T: RasterElement>(data: &Array2<T>) -> Array2<u8> {
    data.mapv(|v| if v.as_f64() == 0.0 { 0 } else { 255 })
}

/// Validity mask for one band, or the union of every band's mask
/// (as 0/1) when `band` is `None`.
fn read_validity<D: RasterDataset + ?Sized>(
    dataset: &D,
    band: Option<usize>,
    shape: Option<(usize, usize)>,
) -> Result<Array2<u8>> {
    match band {
        Some(band) => dataset.read_masks(band, shape),
        None => {
            let mut any = Array2::<u8>::zeros(shape.unwrap_or_else(|| dataset.shape()));
            for band in 1..=dataset.count() {
                let mask = dataset.read_masks(band, shape)?;
                any.zip_mut_with(&mask, |a, &m| *a = u8::from(*a != 0 || m != 0));
            }
            Ok(any)
        }
    }
}

/// Features for the regions of equal value in a dataset band.
///
/// Each feature carries `id = "<basename>:<i>"`, `properties = {val,
/// filename}` and a `bbox` computed from its own coordinates. With
/// `params.geographic` geometries are reprojected to WGS84 and cut at the
/// antimeridian.
pub fn dataset_features<D>(
    dataset: &D,
    params: &FeatureParams,
) -> Result<DatasetFeatures<PolygonTracer, ProjReprojector>>
where
    D: RasterDataset + ?Sized,
{
    dataset_features_with(&ScanlineEngine, ProjReprojector, dataset, params)
}

/// [`dataset_features`] with a specific engine and reprojector.
pub fn dataset_features_with<E, R, D>(
    engine: &E,
    reprojector: R,
    dataset: &D,
    params: &FeatureParams,
) -> Result<DatasetFeatures<E::Polygons, R>>
where
    E: RasterVectorEngine,
    R: GeometryReprojector,
    D: RasterDataset + ?Sized,
{
    if let Some(band) = params.band {
        dataset.check_band(band)?;
    }
    if params.sampling == 0 {
        return Err(Error::InvalidParameter {
            name: "sampling",
            value: "0".into(),
            reason: "must be >= 1".into(),
        });
    }

    let source_crs = if params.geographic {
        let src = dataset
            .crs()
            .cloned()
            .ok_or_else(|| Error::Reprojection("dataset has no CRS to reproject from".into()))?;
        Some(src)
    } else {
        None
    };

    let (shape, transform) = if params.sampling > 1 {
        let (shape, transform) = decimate(
            &dataset.transform(),
            dataset.width(),
            dataset.height(),
            params.sampling,
        );
        debug!(sampling = params.sampling, ?shape, "decimating before tracing");
        (Some(shape), transform)
    } else {
        (None, dataset.transform())
    };

    // every pixel is traced, valid or not, only when reading a band with
    // nodata regions requested or a binarized image supplying its own mask
    let needs_mask = !params.from_band || (!params.as_mask && !params.with_nodata);
    let mut mask = if needs_mask {
        Some(read_validity(dataset, params.band, shape)?)
    } else {
        None
    };

    let mut image = match (&mask, params.from_band) {
        (_, true) => dataset.read(params.band.unwrap_or(1), shape)?,
        (Some(mask), false) => RasterBuffer::from(mask.clone()),
        (None, false) => {
            return Err(Error::Algorithm("validity mask was not read".into()));
        }
    };

    if params.as_mask {
        let binary = with_buffer!(&image, a => binarize(a));
        if !params.with_nodata {
            mask = Some(binary.clone());
        }
        image = RasterBuffer::from(binary);
    }

    let trace_mask = if params.with_nodata {
        None
    } else {
        mask.map(|m| m.mapv(|v| v != 0))
    };

    let polygons = engine.trace_polygons(&image, trace_mask.as_ref(), params.connectivity, &transform)?;

    let name = dataset.name();
    let basename = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    Ok(DatasetFeatures {
        polygons,
        index: 0,
        basename,
        reprojector,
        source_crs,
        precision: params.precision,
    })
}
