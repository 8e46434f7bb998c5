//! Pixel-space windows

use serde::{Deserialize, Serialize};

use super::GeoTransform;
use crate::error::{Error, Result};

/// A rectangular region of a raster in pixel space.
///
/// Offsets and lengths are real-valued until rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub col_off: f64,
    pub row_off: f64,
    pub width: f64,
    pub height: f64,
}

impl Window {
    pub fn new(col_off: f64, row_off: f64, width: f64, height: f64) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// The window covering a whole `width` x `height` raster
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// Envelope, in pixel space, of the four corners of a geographic box.
    pub fn from_bounds(
        left: f64,
        bottom: f64,
        right: f64,
        top: f64,
        transform: &GeoTransform,
    ) -> Result<Self> {
        let inv = transform.inverse()?;
        let corners = [
            inv.apply(left, top),
            inv.apply(right, top),
            inv.apply(right, bottom),
            inv.apply(left, bottom),
        ];

        let (mut col_min, mut col_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut row_min, mut row_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (col, row) in corners {
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        Ok(Self::new(
            col_min,
            row_min,
            (col_max - col_min).max(0.0),
            (row_max - row_min).max(0.0),
        ))
    }

    /// Floor both offsets, after rounding them to `pixel_precision`
    /// decimal places when given. Lengths are unchanged.
    pub fn round_offsets(&self, pixel_precision: Option<u32>) -> Self {
        let round = |v: f64| match pixel_precision {
            Some(p) => round_to(v, p),
            None => v,
        };
        Self::new(
            round(self.col_off).floor(),
            round(self.row_off).floor(),
            self.width,
            self.height,
        )
    }

    /// Whether the two windows share a non-empty area
    pub fn intersects(&self, other: &Window) -> bool {
        self.col_off < other.col_off + other.width
            && other.col_off < self.col_off + self.width
            && self.row_off < other.row_off + other.height
            && other.row_off < self.row_off + self.height
    }

    /// The overlapping region of two windows.
    ///
    /// Fails with [`Error::WindowError`] when they do not overlap.
    pub fn intersection(&self, other: &Window) -> Result<Window> {
        if !self.intersects(other) {
            return Err(Error::WindowError(format!(
                "windows do not intersect: {self:?} and {other:?}"
            )));
        }

        let col_start = self.col_off.max(other.col_off);
        let col_stop = (self.col_off + self.width).min(other.col_off + other.width);
        let row_start = self.row_off.max(other.row_off);
        let row_stop = (self.row_off + self.height).min(other.row_off + other.height);

        Ok(Window::new(
            col_start,
            row_start,
            col_stop - col_start,
            row_stop - row_start,
        ))
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}
