//! Dtype-tagged 2-D pixel buffers

use ndarray::Array2;

use super::dtype::DataType;
use super::element::RasterElement;

/// A 2-D pixel array whose element type is known only at runtime.
///
/// Band reads, burn targets and sieve outputs are exchanged as
/// `RasterBuffer`s. Data is stored in row-major order `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterBuffer {
    Int8(Array2<i8>),
    Int16(Array2<i16>),
    Int32(Array2<i32>),
    Int64(Array2<i64>),
    UInt8(Array2<u8>),
    UInt16(Array2<u16>),
    UInt32(Array2<u32>),
    UInt64(Array2<u64>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
}

/// Run an expression against the typed array inside a [`RasterBuffer`].
///
/// The body is instantiated once per variant, so it may call generic
/// functions bounded by [`RasterElement`].
#[macro_export]
macro_rules! with_buffer {
    ($buffer:expr, $arr:ident => $body:expr) => {
        match $buffer {
            $crate::raster::RasterBuffer::Int8($arr) => $body,
            $crate::raster::RasterBuffer::Int16($arr) => $body,
            $crate::raster::RasterBuffer::Int32($arr) => $body,
            $crate::raster::RasterBuffer::Int64($arr) => $body,
            $crate::raster::RasterBuffer::UInt8($arr) => $body,
            $crate::raster::RasterBuffer::UInt16($arr) => $body,
            $crate::raster::RasterBuffer::UInt32($arr) => $body,
            $crate::raster::RasterBuffer::UInt64($arr) => $body,
            $crate::raster::RasterBuffer::Float32($arr) => $body,
            $crate::raster::RasterBuffer::Float64($arr) => $body,
        }
    };
}

macro_rules! dispatch_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DataType::Int8 => { type $t = i8; $body }
            DataType::Int16 => { type $t = i16; $body }
            DataType::Int32 => { type $t = i32; $body }
            DataType::Int64 => { type $t = i64; $body }
            DataType::UInt8 => { type $t = u8; $body }
            DataType::UInt16 => { type $t = u16; $body }
            DataType::UInt32 => { type $t = u32; $body }
            DataType::UInt64 => { type $t = u64; $body }
            DataType::Float32 => { type $t = f32; $body }
            DataType::Float64 => { type $t = f64; $body }
        }
    };
}

impl RasterBuffer {
    /// Allocate a buffer of `dtype` with every cell set to `value`
    /// (cast into the dtype).
    pub fn filled(dtype: DataType, rows: usize, cols: usize, value: f64) -> Self {
        dispatch_dtype!(dtype, T => T::into_buffer(Array2::from_elem((rows, cols), T::cast_f64(value))))
    }

    /// Allocate a zero-filled buffer of `dtype`
    pub fn zeros(dtype: DataType, rows: usize, cols: usize) -> Self {
        Self::filled(dtype, rows, cols, 0.0)
    }

    pub fn dtype(&self) -> DataType {
        fn tag<T: RasterElement>(_: &Array2<T>) -> DataType {
            T::DTYPE
        }
        with_buffer!(self, a => tag(a))
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        with_buffer!(self, a => a.dim())
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Value at (row, col) as `f64`
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        with_buffer!(self, a => a.get((row, col)).map(|v| v.as_f64()))
    }

    /// Copy of the data as `f64`
    pub fn to_f64(&self) -> Array2<f64> {
        with_buffer!(self, a => a.mapv(|v| v.as_f64()))
    }

    /// Sum of all cells as `f64`
    pub fn sum(&self) -> f64 {
        with_buffer!(self, a => a.iter().map(|v| v.as_f64()).sum())
    }

    /// Borrow the typed array, if it holds `T`
    pub fn as_array<T: RasterElement>(&self) -> Option<&Array2<T>> {
        T::from_buffer(self)
    }
}

impl<T: RasterElement> From<Array2<T>> for RasterBuffer {
    fn from(data: Array2<T>) -> Self {
        T::into_buffer(data)
    }
}
