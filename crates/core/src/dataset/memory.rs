//! In-memory datasets

use ndarray::Array2;

use super::RasterDataset;
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{DataType, GeoTransform, RasterBuffer, RasterElement};
use crate::with_buffer;

/// A dataset whose bands live in memory.
///
/// Resampled reads use nearest-neighbour selection. Validity masks are
/// derived from the nodata value; without one every pixel is valid.
#[derive(Debug, Clone)]
pub struct MemDataset {
    name: String,
    bands: Vec<RasterBuffer>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<f64>,
}

impl MemDataset {
    /// Create a dataset from one or more equally sized bands
    pub fn new(name: impl Into<String>, bands: Vec<RasterBuffer>, transform: GeoTransform) -> Result<Self> {
        let first = bands.first().ok_or_else(|| Error::InvalidParameter {
            name: "bands",
            value: "[]".into(),
            reason: "a dataset needs at least one band".into(),
        })?;
        let (rows, cols) = first.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        for band in &bands[1..] {
            let (ar, ac) = band.shape();
            if (ar, ac) != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar,
                    ac,
                });
            }
        }

        Ok(Self {
            name: name.into(),
            bands,
            transform,
            crs: None,
            nodata: None,
        })
    }

    pub fn with_crs(mut self, crs: CRS) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn band(&self, band: usize) -> Result<&RasterBuffer> {
        self.check_band(band)?;
        Ok(&self.bands[band - 1])
    }
}

/// Nearest-neighbour resample to `(rows, cols)`
fn resample<T: Copy>(data: &Array2<T>, (rows, cols): (usize, usize)) -> Array2<T> {
    let (src_rows, src_cols) = data.dim();
    if (rows, cols) == (src_rows, src_cols) {
        return data.clone();
    }
    let pick = |i: usize, n: usize, src_n: usize| -> usize {
        let s = ((i as f64 + 0.5) * src_n as f64 / n as f64).floor() as usize;
        s.min(src_n - 1)
    };
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        data[(pick(r, rows, src_rows), pick(c, cols, src_cols))]
    })
}

fn validity<T: RasterElement>(data: &Array2<T>, nodata: Option<f64>) -> Array2<u8> {
    match nodata {
        None => Array2::from_elem(data.dim(), 255),
        Some(nd) => data.mapv(|v| {
            let v = v.as_f64();
            if v == nd || (nd.is_nan() && v.is_nan()) {
                0
            } else {
                255
            }
        }),
    }
}

impl RasterDataset for MemDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.bands[0].cols()
    }

    fn height(&self) -> usize {
        self.bands[0].rows()
    }

    fn count(&self) -> usize {
        self.bands.len()
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    fn dtype(&self, band: usize) -> Result<DataType> {
        Ok(self.band(band)?.dtype())
    }

    fn read(&self, band: usize, out_shape: Option<(usize, usize)>) -> Result<RasterBuffer> {
        let data = self.band(band)?;
        match out_shape {
            None => Ok(data.clone()),
            Some(shape) => {
                check_out_shape(shape)?;
                Ok(with_buffer!(data, a => resample(a, shape).into()))
            }
        }
    }

    fn read_masks(&self, band: usize, out_shape: Option<(usize, usize)>) -> Result<Array2<u8>> {
        let data = self.band(band)?;
        let mask = with_buffer!(data, a => validity(a, self.nodata));
        match out_shape {
            None => Ok(mask),
            Some(shape) => {
                check_out_shape(shape)?;
                Ok(resample(&mask, shape))
            }
        }
    }
}

fn check_out_shape((rows, cols): (usize, usize)) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidWindowShape(format!(
            "width and height must be > 0, got {rows}x{cols}"
        )));
    }
    Ok(())
}
