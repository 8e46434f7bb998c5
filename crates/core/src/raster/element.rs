//! Raster element trait for generic cell values

use ndarray::Array2;
use num_traits::{NumCast, Zero};
use std::fmt::Debug;

use super::buffer::RasterBuffer;
use super::dtype::DataType;

/// Trait for types that can be stored in a raster cell.
///
/// Ties each Rust scalar type to its [`DataType`] tag and to the matching
/// [`RasterBuffer`] variant.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Numeric kind tag of this type
    const DTYPE: DataType;

    /// Cast from `f64`, truncating toward zero and saturating at the
    /// type's range (NaN becomes zero for integer types)
    fn cast_f64(v: f64) -> Self;

    /// Convert self to f64
    fn as_f64(self) -> f64 {
        NumCast::from(self).unwrap_or(f64::NAN)
    }

    /// Wrap an array into the matching buffer variant
    fn into_buffer(data: Array2<Self>) -> RasterBuffer;

    /// Borrow the array if the buffer holds this type
    fn from_buffer(buffer: &RasterBuffer) -> Option<&Array2<Self>>;
}

macro_rules! impl_raster_element {
    ($t:ty, $variant:ident) => {
        impl RasterElement for $t {
            const DTYPE: DataType = DataType::$variant;

            fn cast_f64(v: f64) -> Self {
                // `as` saturates for float-to-int casts
                v as $t
            }

            fn into_buffer(data: Array2<Self>) -> RasterBuffer {
                RasterBuffer::$variant(data)
            }

            fn from_buffer(buffer: &RasterBuffer) -> Option<&Array2<Self>> {
                match buffer {
                    RasterBuffer::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_raster_element!(i8, Int8);
impl_raster_element!(i16, Int16);
impl_raster_element!(i32, Int32);
impl_raster_element!(i64, Int64);
impl_raster_element!(u8, UInt8);
impl_raster_element!(u16, UInt16);
impl_raster_element!(u32, UInt32);
impl_raster_element!(u64, UInt64);
impl_raster_element!(f32, Float32);
impl_raster_element!(f64, Float64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_f64_saturates() {
        assert_eq!(u8::cast_f64(300.0), 255);
        assert_eq!(u8::cast_f64(-3.0), 0);
        assert_eq!(i16::cast_f64(2.9), 2);
        assert_eq!(i32::cast_f64(f64::NAN), 0);
        assert_eq!(f32::cast_f64(0.5), 0.5);
    }

    #[test]
    fn test_dtype_tags() {
        assert_eq!(<u16 as RasterElement>::DTYPE, DataType::UInt16);
        assert_eq!(<f64 as RasterElement>::DTYPE, DataType::Float64);
    }
}
