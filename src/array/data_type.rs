//! Array data types.
//!
//! The supported data types are the primitive numeric kinds: signed and
//! unsigned integers of 8 to 64 bits and IEEE 754 single and double
//! precision floats.
//! Each data type fixes its element size in bytes and knows how to parse and
//! serialise its type code (e.g. `<i4`, `>f8`, `|u1`) and fill value
//! metadata.

use derive_more::From;
use thiserror::Error;

use crate::metadata::FillValueMetadata;

use super::{Endianness, FillValue};

/// A data type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[non_exhaustive]
#[rustfmt::skip]
pub enum DataType {
    /// Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// Integer in `[0, 2^8-1]`.
    UInt8,
    /// Integer in `[0, 2^16-1]`.
    UInt16,
    /// Integer in `[0, 2^32-1]`.
    UInt32,
    /// Integer in `[0, 2^64-1]`.
    UInt64,
    /// IEEE 754 single-precision floating point.
    Float32,
    /// IEEE 754 double-precision floating point.
    Float64,
}

/// An unsupported data type error.
#[derive(Debug, Error, From)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

/// A fill value metadata incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1:?} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadata);

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }
}

impl DataType {
    /// Returns the identifier.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Returns the type code without the byte order prefix (e.g. `i4`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Int8 => "i1",
            Self::Int16 => "i2",
            Self::Int32 => "i4",
            Self::Int64 => "i8",
            Self::UInt8 => "u1",
            Self::UInt16 => "u2",
            Self::UInt32 => "u4",
            Self::UInt64 => "u8",
            Self::Float32 => "f4",
            Self::Float64 => "f8",
        }
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Parse a data type and its endianness from a type string (e.g. `<f4`).
    ///
    /// The leading character encodes the byte order (`<` little, `>` big,
    /// `|` none, valid only for single byte types).
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if `dtype` is not a supported data type string.
    pub fn from_metadata(dtype: &str) -> Result<(Self, Endianness), UnsupportedDataTypeError> {
        let mut chars = dtype.chars();
        let endianness = chars
            .next()
            .and_then(Endianness::from_prefix)
            .ok_or_else(|| UnsupportedDataTypeError(dtype.to_string()))?;
        let data_type = match chars.as_str() {
            "i1" => Self::Int8,
            "i2" => Self::Int16,
            "i4" => Self::Int32,
            "i8" => Self::Int64,
            "u1" => Self::UInt8,
            "u2" => Self::UInt16,
            "u4" => Self::UInt32,
            "u8" => Self::UInt64,
            "f4" => Self::Float32,
            "f8" => Self::Float64,
            _ => return Err(UnsupportedDataTypeError(dtype.to_string())),
        };
        if dtype.starts_with('|') && data_type.size() != 1 {
            return Err(UnsupportedDataTypeError(dtype.to_string()));
        }
        Ok((data_type, endianness))
    }

    /// Create the type string of this data type with `endianness` (e.g. `<f4`).
    #[must_use]
    pub fn metadata_string(&self, endianness: Endianness) -> String {
        format!("{}{}", endianness.prefix(self.size()), self.code())
    }

    /// Create a fill value from metadata.
    ///
    /// A `null` fill value is interpreted as all-zero element bytes.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadata,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        use FillValueMetadata as FVM;
        let err =
            || IncompatibleFillValueMetadataError(self.identifier().to_string(), fill_value.clone());
        match fill_value {
            FVM::Null => Ok(FillValue::new(vec![0; self.size()])),
            FVM::NaN => match self {
                Self::Float32 => Ok(FillValue::from(f32::NAN)),
                Self::Float64 => Ok(FillValue::from(f64::NAN)),
                _ => Err(err()),
            },
            FVM::Infinity => match self {
                Self::Float32 => Ok(FillValue::from(f32::INFINITY)),
                Self::Float64 => Ok(FillValue::from(f64::INFINITY)),
                _ => Err(err()),
            },
            FVM::NegInfinity => match self {
                Self::Float32 => Ok(FillValue::from(f32::NEG_INFINITY)),
                Self::Float64 => Ok(FillValue::from(f64::NEG_INFINITY)),
                _ => Err(err()),
            },
            FVM::Number(number) => match self {
                Self::Int8 => number
                    .as_i64()
                    .and_then(|i| i8::try_from(i).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::Int16 => number
                    .as_i64()
                    .and_then(|i| i16::try_from(i).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::Int32 => number
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::Int64 => number.as_i64().map(FillValue::from).ok_or_else(err),
                Self::UInt8 => number
                    .as_u64()
                    .and_then(|u| u8::try_from(u).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::UInt16 => number
                    .as_u64()
                    .and_then(|u| u16::try_from(u).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::UInt32 => number
                    .as_u64()
                    .and_then(|u| u32::try_from(u).ok())
                    .map(FillValue::from)
                    .ok_or_else(err),
                Self::UInt64 => number.as_u64().map(FillValue::from).ok_or_else(err),
                #[allow(clippy::cast_possible_truncation)]
                Self::Float32 => number
                    .as_f64()
                    .map(|f| FillValue::from(f as f32))
                    .ok_or_else(err),
                Self::Float64 => number.as_f64().map(FillValue::from).ok_or_else(err),
            },
        }
    }

    /// Create fill value metadata from a fill value.
    ///
    /// # Panics
    /// Panics if the fill value size does not match the data type size.
    #[must_use]
    pub fn metadata_fill_value(&self, fill_value: &FillValue) -> FillValueMetadata {
        let bytes = fill_value.as_ne_bytes();
        assert_eq!(bytes.len(), self.size());
        match self {
            Self::Int8 => i8::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::Int16 => i16::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::Int32 => i32::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::Int64 => i64::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::UInt8 => u8::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::UInt16 => u16::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::UInt32 => u32::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::UInt64 => u64::from_ne_bytes(bytes.try_into().unwrap()).into(),
            Self::Float32 => {
                FillValueMetadata::from_float(f64::from(f32::from_ne_bytes(
                    bytes.try_into().unwrap(),
                )))
            }
            Self::Float64 => {
                FillValueMetadata::from_float(f64::from_ne_bytes(bytes.try_into().unwrap()))
            }
        }
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_from_metadata() {
        assert_eq!(
            DataType::from_metadata("<f4").unwrap(),
            (DataType::Float32, Endianness::Little)
        );
        assert_eq!(
            DataType::from_metadata(">i2").unwrap(),
            (DataType::Int16, Endianness::Big)
        );
        assert_eq!(DataType::from_metadata("|u1").unwrap().0, DataType::UInt8);
        assert!(DataType::from_metadata("|i4").is_err());
        assert!(DataType::from_metadata("<x4").is_err());
        assert!(DataType::from_metadata("f4").is_err());
        assert!(DataType::from_metadata("").is_err());
    }

    #[test]
    fn data_type_metadata_string() {
        assert_eq!(
            DataType::Float32.metadata_string(Endianness::Little),
            "<f4"
        );
        assert_eq!(DataType::Int64.metadata_string(Endianness::Big), ">i8");
        assert_eq!(
            DataType::UInt8.metadata_string(Endianness::Little),
            "|u1"
        );
    }

    #[test]
    fn data_type_fill_value() {
        assert_eq!(
            DataType::Int32
                .fill_value_from_metadata(&(-1i64).into())
                .unwrap(),
            FillValue::from(-1i32)
        );
        assert_eq!(
            DataType::Float32
                .fill_value_from_metadata(&FillValueMetadata::NaN)
                .unwrap()
                .as_ne_bytes(),
            f32::NAN.to_ne_bytes()
        );
        assert_eq!(
            DataType::UInt16
                .fill_value_from_metadata(&FillValueMetadata::Null)
                .unwrap(),
            FillValue::from(0u16)
        );
        assert!(DataType::Int8
            .fill_value_from_metadata(&1000i64.into())
            .is_err());
        assert!(DataType::UInt8
            .fill_value_from_metadata(&FillValueMetadata::NaN)
            .is_err());

        assert_eq!(
            DataType::Int32.metadata_fill_value(&FillValue::from(-7i32)),
            (-7i64).into()
        );
        assert_eq!(
            DataType::Float64.metadata_fill_value(&FillValue::from(f64::NAN)),
            FillValueMetadata::NaN
        );
    }
}
