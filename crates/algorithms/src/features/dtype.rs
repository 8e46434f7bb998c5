//! Resolving one output dtype for a burn
//!
//! Fill, default and per-shape values may each arrive as a different
//! numeric kind. [`DtypeNegotiator`] settles on a single member of the
//! burnable lattice, or reports which parameter stands in the way.

use rasterfeat_core::raster::{
    can_cast_dtype, minimum_dtype, validate_dtype, DataType, RasterBuffer, Scalar,
};
use rasterfeat_core::{Error, Result};
use tracing::debug;

/// Where burned values go: a new buffer of the given shape, or an
/// existing caller-owned buffer that is handed back after the burn.
#[derive(Debug, Clone)]
pub enum BurnTarget {
    /// Allocate a buffer with this shape; it must be 2-D
    Shape(Vec<usize>),
    /// Burn into this buffer
    Buffer(RasterBuffer),
}

impl From<(usize, usize)> for BurnTarget {
    fn from((rows, cols): (usize, usize)) -> Self {
        BurnTarget::Shape(vec![rows, cols])
    }
}

impl From<RasterBuffer> for BurnTarget {
    fn from(buffer: RasterBuffer) -> Self {
        BurnTarget::Buffer(buffer)
    }
}

fn invalid_dtype(param: &'static str) -> Error {
    Error::InvalidDtype {
        param,
        allowed: DataType::burnable_names(),
    }
}

fn cast_error(param: &'static str, dtype: DataType) -> Error {
    Error::CastError {
        param,
        dtype: dtype.to_string(),
    }
}

/// The scalar burn parameters and the optional explicit dtype.
#[derive(Debug, Clone, Copy)]
pub struct DtypeNegotiator {
    pub fill: Scalar,
    pub default_value: Scalar,
    pub dtype: Option<DataType>,
}

impl DtypeNegotiator {
    pub fn new(fill: Scalar, default_value: Scalar, dtype: Option<DataType>) -> Self {
        Self {
            fill,
            default_value,
            dtype,
        }
    }

    /// Checks that need no shapes: a non-default fill or default value
    /// must fit the lattice (and the requested dtype), and a requested
    /// dtype must itself be burnable.
    pub fn check_params(&self) -> Result<()> {
        self.check_scalar(self.fill, !self.fill.equals(0), "fill")?;
        self.check_scalar(
            self.default_value,
            !self.default_value.equals(1),
            "default_value",
        )?;
        if let Some(dtype) = self.dtype {
            if !dtype.is_burnable() {
                return Err(invalid_dtype("dtype"));
            }
        }
        Ok(())
    }

    fn check_scalar(&self, value: Scalar, applies: bool, param: &'static str) -> Result<()> {
        if !applies {
            return Ok(());
        }
        if !validate_dtype(&[value]) {
            return Err(invalid_dtype(param));
        }
        if let Some(dtype) = self.dtype {
            if !can_cast_dtype(&[value], dtype) {
                return Err(cast_error(param, dtype));
            }
        }
        Ok(())
    }

    /// Settle the output dtype for `shape_values` and produce the buffer
    /// to burn into: the caller's, or a new one filled with `fill`.
    pub fn resolve(&self, shape_values: &[Scalar], target: BurnTarget) -> Result<(DataType, RasterBuffer)> {
        if !validate_dtype(shape_values) {
            return Err(invalid_dtype("shape values"));
        }

        let dtype = match self.dtype {
            Some(dtype) => {
                if !can_cast_dtype(shape_values, dtype) {
                    return Err(cast_error("shape values", dtype));
                }
                dtype
            }
            None => {
                let mut all = shape_values.to_vec();
                all.push(self.fill);
                minimum_dtype(&all)
                    .filter(|d| d.is_burnable())
                    .ok_or_else(|| invalid_dtype("shape values"))?
            }
        };

        let (dtype, buffer) = match target {
            BurnTarget::Buffer(buffer) => {
                let out_dtype = buffer.dtype();
                if !out_dtype.is_burnable() {
                    return Err(invalid_dtype("out"));
                }
                if !can_cast_dtype(shape_values, out_dtype) {
                    return Err(cast_error("shape values", out_dtype));
                }
                (out_dtype, buffer)
            }
            BurnTarget::Shape(shape) => {
                let [rows, cols] = shape[..] else {
                    return Err(Error::InvalidWindowShape(format!(
                        "must be 2D, got {shape:?}"
                    )));
                };
                (dtype, RasterBuffer::filled(dtype, rows, cols, self.fill.as_f64()))
            }
        };

        let (rows, cols) = buffer.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidWindowShape(
                "width and height must be > 0".into(),
            ));
        }

        debug!(%dtype, rows, cols, "resolved burn dtype");
        Ok((dtype, buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|&v| Scalar::Int(v)).collect()
    }

    #[test]
    fn test_minimum_dtype_includes_fill() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), None);
        let (dtype, buffer) = n.resolve(&ints(&[1, 200]), (2, 3).into()).unwrap();
        assert_eq!(dtype, DataType::UInt8);
        assert_eq!(buffer.shape(), (2, 3));

        let n = DtypeNegotiator::new(Scalar::Int(-1), Scalar::Int(1), None);
        let (dtype, buffer) = n.resolve(&ints(&[1, 200]), (2, 3).into()).unwrap();
        assert_eq!(dtype, DataType::Int16);
        assert_eq!(buffer.get(0, 0), Some(-1.0));
    }

    #[test]
    fn test_float_values_choose_float() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), None);
        let (dtype, _) = n.resolve(&[Scalar::Float(0.5)], (1, 1).into()).unwrap();
        assert_eq!(dtype, DataType::Float32);
    }

    #[test]
    fn test_fill_outside_lattice() {
        let n = DtypeNegotiator::new(Scalar::Int(i64::MAX), Scalar::Int(1), None);
        let err = n.check_params().unwrap_err();
        assert!(matches!(err, Error::InvalidDtype { param: "fill", .. }));
        assert!(err.to_string().starts_with("fill dtype must be one of"));
    }

    #[test]
    fn test_default_value_must_cast_to_dtype() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(-5), Some(DataType::UInt8));
        assert!(matches!(
            n.check_params(),
            Err(Error::CastError { param: "default_value", .. })
        ));
    }

    #[test]
    fn test_requested_dtype_must_be_burnable() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), Some(DataType::Int8));
        assert!(matches!(n.check_params(), Err(Error::InvalidDtype { param: "dtype", .. })));
    }

    #[test]
    fn test_shape_values_must_cast() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), Some(DataType::UInt8));
        let err = n.resolve(&ints(&[300]), (1, 1).into()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape values cannot be cast to specified dtype: uint8"
        );
    }

    #[test]
    fn test_existing_buffer_decides_dtype() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), None);
        let out = RasterBuffer::zeros(DataType::UInt16, 2, 2);
        let (dtype, _) = n.resolve(&ints(&[1]), out.into()).unwrap();
        assert_eq!(dtype, DataType::UInt16);

        let too_small = RasterBuffer::zeros(DataType::UInt8, 2, 2);
        assert!(matches!(
            n.resolve(&ints(&[1000]), too_small.into()),
            Err(Error::CastError { .. })
        ));

        let int8 = RasterBuffer::zeros(DataType::Int8, 2, 2);
        assert!(matches!(
            n.resolve(&ints(&[1]), int8.into()),
            Err(Error::InvalidDtype { param: "out", .. })
        ));
    }

    #[test]
    fn test_shape_checks() {
        let n = DtypeNegotiator::new(Scalar::Int(0), Scalar::Int(1), None);
        assert!(matches!(
            n.resolve(&ints(&[1]), BurnTarget::Shape(vec![2, 2, 2])),
            Err(Error::InvalidWindowShape(_))
        ));
        assert!(matches!(
            n.resolve(&ints(&[1]), (0, 4).into()),
            Err(Error::InvalidWindowShape(_))
        ));
    }
}
