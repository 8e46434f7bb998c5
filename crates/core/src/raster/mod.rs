//! Raster data structures and operations

mod buffer;
mod dtype;
mod element;
mod geotransform;
mod window;

pub use buffer::RasterBuffer;
pub use dtype::{
    can_cast_dtype, is_float_kind, minimum_dtype, validate_dtype, DataType, Scalar, BURN_DTYPES,
};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use window::{round_to, Window};
