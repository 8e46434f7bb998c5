//! Read-only raster datasets
//!
//! Dataset I/O is out of scope for this crate; [`RasterDataset`] is the seam
//! through which band data, validity masks and georeferencing reach the
//! feature algorithms. [`MemDataset`] serves in-memory bands.

mod memory;

pub use memory::MemDataset;

use ndarray::Array2;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{DataType, GeoTransform, RasterBuffer, Window};

/// A georeferenced multi-band raster opened for reading.
///
/// Band indexes are 1-based.
pub trait RasterDataset {
    /// Dataset name or path; features derive their ids from its basename
    fn name(&self) -> &str;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Number of bands
    fn count(&self) -> usize;

    fn transform(&self) -> GeoTransform;

    fn crs(&self) -> Option<&CRS>;

    /// Numeric kind of a band
    fn dtype(&self, band: usize) -> Result<DataType>;

    /// Read a band, resampled to `out_shape` `(rows, cols)` when given
    fn read(&self, band: usize, out_shape: Option<(usize, usize)>) -> Result<RasterBuffer>;

    /// Read a band's validity mask: 255 where data is valid, 0 elsewhere
    fn read_masks(&self, band: usize, out_shape: Option<(usize, usize)>) -> Result<Array2<u8>>;

    /// Dimensions as (rows, cols)
    fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Pixel size along x and y
    fn res(&self) -> (f64, f64) {
        self.transform().resolution()
    }

    /// Pixel window covering a geographic box
    fn window(&self, left: f64, bottom: f64, right: f64, top: f64) -> Result<Window> {
        Window::from_bounds(left, bottom, right, top, &self.transform())
    }

    /// Fails unless `band` names an existing band
    fn check_band(&self, band: usize) -> Result<()> {
        if band == 0 || band > self.count() {
            return Err(Error::BandIndexOutOfRange {
                band,
                count: self.count(),
            });
        }
        Ok(())
    }
}
