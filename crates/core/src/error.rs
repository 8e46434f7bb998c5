//! Error types for rasterfeat

use thiserror::Error;

/// Main error type for rasterfeat operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// A fill, default, shape value or output array uses a numeric kind
    /// outside the burnable lattice.
    #[error("{param} dtype must be one of: {allowed}")]
    InvalidDtype { param: &'static str, allowed: String },

    #[error("{param} cannot be cast to specified dtype: {dtype}")]
    CastError { param: &'static str, dtype: String },

    #[error("No valid geometry objects found for rasterize")]
    NoValidGeometry,

    #[error("Window error: {0}")]
    WindowError(String),

    #[error("Invalid out_shape: {0}")]
    InvalidWindowShape(String),

    #[error("Band index {band} is out of range for raster with {count} band(s)")]
    BandIndexOutOfRange { band: usize, count: usize },

    #[error("Reprojection error: {0}")]
    Reprojection(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rasterfeat operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_parameter() {
        let e = Error::CastError {
            param: "shape values",
            dtype: "uint8".into(),
        };
        assert_eq!(e.to_string(), "shape values cannot be cast to specified dtype: uint8");

        let e = Error::BandIndexOutOfRange { band: 3, count: 1 };
        assert!(e.to_string().contains("3"));
    }
}
