//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::error::{Error, Result};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images, `row_rotation` and `col_rotation` are typically 0,
/// and `pixel_height` is negative.
///
/// `a * b` composes two transforms so that `b` is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Pixel coordinates pass through unchanged
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(x, y, 1.0, 1.0)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(0.0, 0.0, sx, sy)
    }

    /// Create from GDAL-style array [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to GDAL-style array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map fractional pixel coordinates to geographic coordinates
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// The transform mapping geographic coordinates back to pixels.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return Err(Error::InvalidParameter {
                name: "transform",
                value: format!("{:?}", self.to_gdal()),
                reason: "transform is not invertible".into(),
            });
        }

        let a = self.pixel_height / det;
        let b = -self.row_rotation / det;
        let d = -self.col_rotation / det;
        let e = self.pixel_width / det;

        Ok(Self {
            pixel_width: a,
            row_rotation: b,
            origin_x: -(a * self.origin_x + b * self.origin_y),
            col_rotation: d,
            pixel_height: e,
            origin_y: -(d * self.origin_x + e * self.origin_y),
        })
    }

    /// `self * other`: the transform applying `other` first, then `self`
    pub fn compose(&self, other: &GeoTransform) -> Self {
        let (a, b, c) = (self.pixel_width, self.row_rotation, self.origin_x);
        let (d, e, f) = (self.col_rotation, self.pixel_height, self.origin_y);
        let (oa, ob, oc) = (other.pixel_width, other.row_rotation, other.origin_x);
        let (od, oe, of) = (other.col_rotation, other.pixel_height, other.origin_y);

        Self {
            pixel_width: a * oa + b * od,
            row_rotation: a * ob + b * oe,
            origin_x: a * oc + b * of + c,
            col_rotation: d * oa + e * od,
            pixel_height: d * ob + e * oe,
            origin_y: d * oc + e * of + f,
        }
    }

    /// Pixel size along x and y.
    ///
    /// Rotated transforms report the length of each pixel edge vector.
    pub fn resolution(&self) -> (f64, f64) {
        if self.is_rectilinear() {
            (self.pixel_width.abs(), self.pixel_height.abs())
        } else {
            (
                self.pixel_width.hypot(self.col_rotation),
                self.row_rotation.hypot(self.pixel_height),
            )
        }
    }

    /// No rotation terms
    pub fn is_rectilinear(&self) -> bool {
        self.row_rotation.abs() < 1e-10 && self.col_rotation.abs() < 1e-10
    }
}

impl Mul for GeoTransform {
    type Output = GeoTransform;

    fn mul(self, rhs: GeoTransform) -> GeoTransform {
        self.compose(&rhs)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_of_rotated() {
        let gt = GeoTransform::from_gdal([10.0, 2.0, 0.5, 50.0, 0.3, -2.0]);
        let inv = gt.inverse().unwrap();
        let (x, y) = gt.apply(3.25, 7.5);
        let (col, row) = inv.apply(x, y);
        assert_relative_eq!(col, 3.25, epsilon = 1e-10);
        assert_relative_eq!(row, 7.5, epsilon = 1e-10);

        let ident = gt * inv;
        assert_relative_eq!(ident.pixel_width, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ident.row_rotation, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ident.origin_y, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_singular_inverse() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, -1.0);
        assert!(gt.inverse().is_err());
    }

    #[test]
    fn test_compose_order() {
        // translate then scale: scale applies first to the pixel coordinate
        let t = GeoTransform::translation(1.0, 2.0) * GeoTransform::scale(10.0, 10.0);
        assert_eq!(t.apply(1.0, 1.0), (11.0, 12.0));

        let t = GeoTransform::scale(10.0, 10.0) * GeoTransform::translation(1.0, 2.0);
        assert_eq!(t.apply(1.0, 1.0), (20.0, 30.0));
    }

    #[test]
    fn test_resolution() {
        assert_eq!(GeoTransform::new(0.0, 0.0, 2.0, -3.0).resolution(), (2.0, 3.0));
        let rotated = GeoTransform::from_gdal([0.0, 3.0, 4.0, 0.0, 4.0, -3.0]);
        assert_relative_eq!(rotated.resolution().0, 5.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.resolution().1, 5.0, epsilon = 1e-12);
    }
}
