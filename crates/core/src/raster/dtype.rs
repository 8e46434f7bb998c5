//! Numeric kinds, the burnable dtype lattice and scalar values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Numeric kind of a raster band or buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

/// Numeric kinds that can be burned into or traced from a raster, in
/// lattice order.
pub const BURN_DTYPES: [DataType; 7] = [
    DataType::Int16,
    DataType::Int32,
    DataType::UInt8,
    DataType::UInt16,
    DataType::UInt32,
    DataType::Float32,
    DataType::Float64,
];

/// Widening order for non-negative integer ranges.
const UNSIGNED_WIDENING: [DataType; 3] = [DataType::UInt8, DataType::UInt16, DataType::UInt32];

/// Widening order for integer ranges that include negatives.
const SIGNED_WIDENING: [DataType; 2] = [DataType::Int16, DataType::Int32];

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Whether this kind is a member of [`BURN_DTYPES`]
    pub fn is_burnable(&self) -> bool {
        BURN_DTYPES.contains(self)
    }

    /// Representable range as `(min, max)`
    pub fn range(&self) -> (f64, f64) {
        match self {
            DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Int64 => (i64::MIN as f64, i64::MAX as f64),
            DataType::UInt8 => (0.0, u8::MAX as f64),
            DataType::UInt16 => (0.0, u16::MAX as f64),
            DataType::UInt32 => (0.0, u32::MAX as f64),
            DataType::UInt64 => (0.0, u64::MAX as f64),
            DataType::Float32 => (f32::MIN as f64, f32::MAX as f64),
            DataType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Comma separated list of the burnable kinds, for error messages
    pub fn burnable_names() -> String {
        BURN_DTYPES
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match s.to_ascii_lowercase().as_str() {
            "int8" => DataType::Int8,
            "int16" => DataType::Int16,
            "int32" => DataType::Int32,
            "int64" => DataType::Int64,
            "uint8" => DataType::UInt8,
            "uint16" => DataType::UInt16,
            "uint32" => DataType::UInt32,
            "uint64" => DataType::UInt64,
            "float32" => DataType::Float32,
            "float64" => DataType::Float64,
            other => return Err(Error::UnsupportedDataType(other.to_string())),
        };
        Ok(dtype)
    }
}

/// A numeric value as supplied by a caller: integers and floats are kept
/// apart because the kind decides whether a float dtype is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn is_float(&self) -> bool {
        matches!(self, Scalar::Float(_))
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    /// Numeric equality with an integer literal regardless of kind
    pub fn equals(&self, other: i64) -> bool {
        match *self {
            Scalar::Int(v) => v == other,
            Scalar::Float(v) => v == other as f64,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Scalar {
            fn from(v: $t) -> Self {
                Scalar::Int(v as i64)
            }
        })*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

/// Whether a set of values takes the float kind (any float member promotes
/// the whole set).
pub fn is_float_kind(values: &[Scalar]) -> bool {
    values.iter().any(Scalar::is_float)
}

/// Smallest numeric kind able to hold every value.
///
/// Integer sets climb the unsigned ladder when non-negative and the signed
/// ladder otherwise; sets too wide for either land on `int64`/`uint64`,
/// which lie outside the burnable lattice. Float sets are `float32` unless
/// their range exceeds it. Returns `None` for an empty set.
pub fn minimum_dtype(values: &[Scalar]) -> Option<DataType> {
    if values.is_empty() {
        return None;
    }

    if is_float_kind(values) {
        let (min, max) = f64_range(values);
        let (lo, hi) = DataType::Float32.range();
        return Some(if min >= lo && max <= hi {
            DataType::Float32
        } else {
            DataType::Float64
        });
    }

    let ints = values.iter().filter_map(|v| match v {
        Scalar::Int(i) => Some(*i),
        Scalar::Float(_) => None,
    });
    let (min, max) = ints.fold((i64::MAX, i64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let ladder: &[DataType] = if min >= 0 {
        &UNSIGNED_WIDENING
    } else {
        &SIGNED_WIDENING
    };
    let fits = ladder.iter().copied().find(|d| {
        let (lo, hi) = d.range();
        min as f64 >= lo && max as f64 <= hi
    });

    Some(fits.unwrap_or(if min >= 0 { DataType::UInt64 } else { DataType::Int64 }))
}

/// Whether the values' own kind, or their minimum kind, is burnable.
pub fn validate_dtype(values: &[Scalar]) -> bool {
    if values.is_empty() {
        return true;
    }
    if is_float_kind(values) {
        // float64 is itself a lattice member
        return true;
    }
    minimum_dtype(values).is_some_and(|d| d.is_burnable())
}

/// Whether every value survives a cast into `dtype` without loss.
///
/// Float values are compared with a relative tolerance after the cast;
/// integer values must round-trip exactly.
pub fn can_cast_dtype(values: &[Scalar], dtype: DataType) -> bool {
    let float_kind = is_float_kind(values);
    if (float_kind && dtype == DataType::Float64) || (!float_kind && dtype == DataType::Int64) {
        return true;
    }

    values.iter().all(|v| {
        let x = v.as_f64();
        let cast = cast_value(x, dtype);
        if float_kind {
            cast.is_some_and(|c| is_close(x, c))
        } else {
            cast.is_some_and(|c| c == x)
        }
    })
}

/// Value after a cast into `dtype`, or `None` if it does not fit.
fn cast_value(x: f64, dtype: DataType) -> Option<f64> {
    match dtype {
        DataType::Float64 => Some(x),
        DataType::Float32 => {
            let c = x as f32 as f64;
            if c.is_infinite() && x.is_finite() {
                None
            } else {
                Some(c)
            }
        }
        _ => {
            if !x.is_finite() {
                return None;
            }
            let (lo, hi) = dtype.range();
            let t = x.trunc();
            (t >= lo && t <= hi).then_some(t)
        }
    }
}

fn is_close(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

fn f64_range(values: &[Scalar]) -> (f64, f64) {
    values
        .iter()
        .map(Scalar::as_f64)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
