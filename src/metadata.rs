//! Array metadata.
//!
//! An array is described by a JSON document stored at `<path>/.zarray`,
//! modelled by [`ArrayHeader`]. An example document:
//! ```json
//! {
//!     "zarr_format": 2,
//!     "shape": [10000, 10000],
//!     "chunks": [1000, 1000],
//!     "dtype": "<f8",
//!     "compressor": {"id": "zlib", "level": 1},
//!     "fill_value": "NaN",
//!     "order": "C",
//!     "filters": null,
//!     "dimension_separator": "."
//! }
//! ```
//! The `dimension_separator` field is optional; arrays written before it
//! existed omit it and their chunk key layout is
//! [probed at open](crate::array::Array::open).
//! Compressor parameters are opaque to this model and survive a round trip
//! unchanged, so headers naming unsupported compressors can be rewritten
//! without loss.

use std::num::NonZeroU64;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::array::{chunk_key::ChunkKeySeparator, ArrayShape, ChunkShape};

/// Array metadata, the content of a `.zarray` document.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayHeader {
    /// An integer defining the version of the storage specification to which the array adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// An array of integers providing the length of each dimension of the array.
    pub shape: ArrayShape,
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: ChunkShape,
    /// The data type of the array, with a leading byte order character (`<`, `>` or `|`).
    pub dtype: String,
    /// A JSON object identifying the primary compression codec and providing configuration parameters, or null if no compressor is to be used.
    pub compressor: Option<CompressorMetadata>,
    /// A scalar value providing the default value to use for uninitialized portions of the array, or null if no fill value is to be used.
    pub fill_value: FillValueMetadata,
    /// Either `C` or `F`, defining the layout of bytes within each chunk of the array. Only `C` is supported.
    pub order: ArrayOrder,
    /// A list of JSON objects providing codec configurations, or null if no filters are to be applied. Filters are not supported.
    #[serde(default)]
    pub filters: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    /// If present, either the string `.` or `/` defining the separator placed between the dimensions of a chunk key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_separator: Option<ChunkKeySeparator>,
}

impl ArrayHeader {
    /// Create array metadata.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunks: ChunkShape,
        dtype: String,
        compressor: Option<CompressorMetadata>,
        fill_value: FillValueMetadata,
        dimension_separator: Option<ChunkKeySeparator>,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
            shape,
            chunks,
            dtype,
            compressor,
            fill_value,
            order: ArrayOrder::C,
            filters: None,
            dimension_separator,
        }
    }

    /// Return the chunk shape as an [`ArrayShape`].
    #[must_use]
    pub fn chunks_u64(&self) -> ArrayShape {
        self.chunks.iter().map(|n| NonZeroU64::get(*n)).collect()
    }
}

/// Compression codec metadata: an id string and its configuration parameters.
///
/// Configuration parameters are opaque; unknown parameters are retained for
/// forward compatibility.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct CompressorMetadata {
    id: String,
    #[serde(flatten)]
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl CompressorMetadata {
    /// Create compressor metadata from an id and its configuration.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        configuration: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            configuration,
        }
    }

    /// Return the compressor id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the compressor configuration.
    #[must_use]
    pub fn configuration(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.configuration
    }
}

/// A scalar value providing the default value to use for uninitialized portions of the array, or null if no fill value is to be used.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadata {
    /// No fill value.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
}

impl<'de> serde::Deserialize<'de> for FillValueMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataType {
            String(String),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataType::deserialize(d)?;
        match fill_value {
            FillValueMetadataType::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Err(serde::de::Error::custom("unsupported fill value")),
            },
            FillValueMetadataType::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataType::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadata {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
        }
    }
}

macro_rules! impl_fill_value_metadata_from_int {
    ($int:ty) => {
        impl From<$int> for FillValueMetadata {
            fn from(value: $int) -> Self {
                Self::Number(serde_json::Number::from(value))
            }
        }
    };
}

impl_fill_value_metadata_from_int!(i8);
impl_fill_value_metadata_from_int!(i16);
impl_fill_value_metadata_from_int!(i32);
impl_fill_value_metadata_from_int!(i64);
impl_fill_value_metadata_from_int!(u8);
impl_fill_value_metadata_from_int!(u16);
impl_fill_value_metadata_from_int!(u32);
impl_fill_value_metadata_from_int!(u64);

impl FillValueMetadata {
    /// Create fill value metadata from a float, mapping non-finite values to
    /// their string representations.
    #[must_use]
    pub fn from_float(value: f64) -> Self {
        if value.is_nan() {
            Self::NaN
        } else if value == f64::INFINITY {
            Self::Infinity
        } else if value == f64::NEG_INFINITY {
            Self::NegInfinity
        } else {
            serde_json::Number::from_f64(value).map_or(Self::Null, Self::Number)
        }
    }
}

/// The layout of bytes within each chunk of the array.
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub enum ArrayOrder {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_JSON: &str = r#"{
        "zarr_format": 2,
        "shape": [10, 10],
        "chunks": [5, 5],
        "dtype": "<i4",
        "compressor": {"id": "zlib", "level": 1},
        "fill_value": -1,
        "order": "C",
        "filters": null
    }"#;

    #[test]
    fn header_parse() {
        let header: ArrayHeader = serde_json::from_str(HEADER_JSON).unwrap();
        assert_eq!(header.shape, vec![10, 10]);
        assert_eq!(header.chunks_u64(), vec![5, 5]);
        assert_eq!(header.dtype, "<i4");
        assert_eq!(header.compressor.as_ref().unwrap().id(), "zlib");
        assert_eq!(header.fill_value, (-1i64).into());
        assert_eq!(header.order, ArrayOrder::C);
        assert!(header.dimension_separator.is_none());
    }

    #[test]
    fn header_rejects_wrong_version() {
        let json = HEADER_JSON.replace("\"zarr_format\": 2", "\"zarr_format\": 3");
        assert!(serde_json::from_str::<ArrayHeader>(&json).is_err());
    }

    #[test]
    fn header_rejects_zero_chunks() {
        let json = HEADER_JSON.replace("\"chunks\": [5, 5]", "\"chunks\": [5, 0]");
        assert!(serde_json::from_str::<ArrayHeader>(&json).is_err());
    }

    #[test]
    fn header_round_trips_unknown_compressor_parameters() {
        let json = r#"{
            "zarr_format": 2,
            "shape": [4],
            "chunks": [2],
            "dtype": "|u1",
            "compressor": {"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1},
            "fill_value": 0,
            "order": "C",
            "filters": null,
            "dimension_separator": "/"
        }"#;
        let header: ArrayHeader = serde_json::from_str(json).unwrap();
        let compressor = header.compressor.as_ref().unwrap();
        assert_eq!(compressor.id(), "blosc");
        assert_eq!(
            compressor.configuration().get("clevel"),
            Some(&serde_json::Value::from(5))
        );
        assert_eq!(
            header.dimension_separator,
            Some(ChunkKeySeparator::Slash)
        );
        let round_trip: ArrayHeader =
            serde_json::from_str(&serde_json::to_string(&header).unwrap()).unwrap();
        assert_eq!(round_trip, header);
    }

    #[test]
    fn fill_value_metadata_serde() {
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("null").unwrap(),
            FillValueMetadata::Null
        );
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("\"NaN\"").unwrap(),
            FillValueMetadata::NaN
        );
        assert_eq!(
            serde_json::from_str::<FillValueMetadata>("\"-Infinity\"").unwrap(),
            FillValueMetadata::NegInfinity
        );
        assert!(serde_json::from_str::<FillValueMetadata>("\"apple\"").is_err());
        assert_eq!(
            serde_json::to_string(&FillValueMetadata::from_float(1.5)).unwrap(),
            "1.5"
        );
        assert_eq!(
            serde_json::to_string(&FillValueMetadata::NaN).unwrap(),
            "\"NaN\""
        );
        assert_eq!(serde_json::to_string(&FillValueMetadata::Null).unwrap(), "null");
    }
}
