//! Chunk compressors.
//!
//! A compressor is an invertible byte-blob transform applied to each encoded
//! chunk. Compressors are identified in array metadata by an id string and a
//! parameter bag ([`CompressorMetadata`](crate::metadata::CompressorMetadata));
//! unknown parameters are preserved across a metadata round trip.
//!
//! The provided compressors are `zlib` ([`ZlibCompressor`]) and `gzip`
//! ([`GzipCompressor`]), plus the identity compressor used when the metadata
//! `compressor` field is `null`. Opening an array with an unrecognised
//! compressor id fails.

mod gzip;
mod zlib;

pub use gzip::GzipCompressor;
pub use zlib::ZlibCompressor;

use thiserror::Error;

use crate::metadata::CompressorMetadata;

/// Compressor traits.
pub trait CompressorTraits: dyn_clone::DynClone + core::fmt::Debug + Send + Sync {
    /// Returns the compressor identifier.
    fn identifier(&self) -> &'static str;

    /// Create the metadata of this compressor.
    ///
    /// Returns [`None`] for the identity compressor, serialised as a `null`
    /// metadata `compressor` field.
    fn create_metadata(&self) -> Option<CompressorMetadata>;

    /// Compress `decoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the compressor fails.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decompress `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the blob is not valid for this compressor.
    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

dyn_clone::clone_trait_object!(CompressorTraits);

/// A chunk compressor.
#[derive(Debug, Clone, derive_more::From)]
pub struct Compressor(Box<dyn CompressorTraits>);

impl core::ops::Deref for Compressor {
    type Target = Box<dyn CompressorTraits>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Compressor {
    /// Create a compressor.
    pub fn new<T: CompressorTraits + 'static>(compressor: T) -> Self {
        let compressor: Box<dyn CompressorTraits> = Box::new(compressor);
        compressor.into()
    }

    /// Create the identity (`null`) compressor.
    #[must_use]
    pub fn null() -> Self {
        Self::new(NullCompressor)
    }

    /// Create a compressor from metadata.
    ///
    /// A [`None`] metadata creates the identity compressor.
    ///
    /// # Errors
    /// Returns [`CompressorCreateError`] if the compressor id is not
    /// recognised or its configuration is invalid.
    pub fn from_metadata(
        metadata: Option<&CompressorMetadata>,
    ) -> Result<Self, CompressorCreateError> {
        let Some(metadata) = metadata else {
            return Ok(Self::null());
        };
        match metadata.id() {
            "zlib" => Ok(Self::new(ZlibCompressor::new_with_configuration(metadata)?)),
            "gzip" => Ok(Self::new(GzipCompressor::new_with_configuration(metadata)?)),
            id => Err(CompressorCreateError::Unsupported(id.to_string())),
        }
    }
}

/// The identity compressor.
///
/// Encoding and decoding pass blobs through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct NullCompressor;

impl CompressorTraits for NullCompressor {
    fn identifier(&self) -> &'static str {
        "null"
    }

    fn create_metadata(&self) -> Option<CompressorMetadata> {
        None
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(decoded_value)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(encoded_value)
    }
}

/// A compressor creation error.
#[derive(Debug, Error)]
pub enum CompressorCreateError {
    /// An unsupported compressor.
    #[error("unsupported compressor {0}")]
    Unsupported(String),
    /// An invalid compression level.
    #[error(transparent)]
    InvalidCompressionLevel(#[from] InvalidCompressionLevelError),
}

/// An invalid compression level error.
#[derive(Debug, Error)]
#[error("invalid compression level {0}, must be an integer in 0..=9")]
pub struct InvalidCompressionLevelError(serde_json::Value);

/// A compression level in `0..=9`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// Create a new compression level.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if `level` is not in `0..=9`.
    pub fn new(level: u32) -> Result<Self, InvalidCompressionLevelError> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(InvalidCompressionLevelError(level.into()))
        }
    }

    /// Read a compression level from the `level` field of compressor
    /// configuration, or `default` if the field is absent.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if the field is present but
    /// not an integer in `0..=9`.
    pub fn from_configuration(
        metadata: &CompressorMetadata,
        default: u32,
    ) -> Result<Self, InvalidCompressionLevelError> {
        match metadata.configuration().get("level") {
            None => Ok(Self(default)),
            Some(value) => value
                .as_u64()
                .and_then(|level| u32::try_from(level).ok())
                .ok_or_else(|| InvalidCompressionLevelError(value.clone()))
                .and_then(Self::new),
        }
    }

    /// The level as a [`u32`].
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The decoded size of a chunk did not match the expected size.
    #[error("unexpected chunk decoded size {0}, expected {1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}
