use thiserror::Error;

use crate::{
    region::Region,
    storage::{NodePathError, StorageError, StoreKey},
};

use super::{
    codec::{CodecError, CompressorCreateError},
    data_type::{
        IncompatibleFillValueError, IncompatibleFillValueMetadataError, UnsupportedDataTypeError,
    },
    ArrayShape, DataType,
};

/// An array creation or open error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// Array metadata is missing.
    #[error("array metadata is missing at {0}")]
    MissingMetadata(StoreKey),
    /// Invalid array metadata.
    #[error("error parsing array metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
    /// Invalid chunk shape.
    #[error("chunk shape {0:?} is incompatible with array shape {1:?}")]
    InvalidChunkShape(Vec<u64>, ArrayShape),
    /// Unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// Compressor creation failure.
    #[error(transparent)]
    CompressorCreateError(#[from] CompressorCreateError),
    /// Invalid fill value metadata.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// Invalid fill value.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// The column-major (`F`) chunk layout is not supported.
    #[error("only C order arrays are supported")]
    UnsupportedOrder,
    /// Filters are not supported.
    #[error("filters are not supported")]
    UnsupportedFilters,
    /// Invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// An array operation error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// An invalid region: wrong dimensionality, or offset + shape exceeds the array shape.
    #[error("invalid region {0} for array shape {1:?}")]
    InvalidRegion(Region, ArrayShape),
    /// The length of the caller buffer does not match the region.
    #[error("invalid bytes input size {0}, expected {1}")]
    InvalidBytesInputSize(usize, u64),
    /// The element type does not match the array data type.
    #[error("incompatible element type {0}, expected {1}")]
    IncompatibleElementType(DataType, DataType),
    /// Invalid user attributes.
    #[error("error parsing user attributes: {0}")]
    InvalidAttributes(serde_json::Error),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}
