use std::io::{Cursor, Read};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};

use crate::metadata::CompressorMetadata;

use super::{CodecError, CompressionLevel, CompressorTraits, InvalidCompressionLevelError};

const IDENTIFIER: &str = "zlib";

const DEFAULT_COMPRESSION_LEVEL: u32 = 1;

/// A `zlib` compressor implementation.
///
/// Chunk blobs are zlib streams (RFC 1950).
#[derive(Clone, Debug)]
pub struct ZlibCompressor {
    compression_level: CompressionLevel,
}

impl ZlibCompressor {
    /// Create a new `zlib` compressor.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, InvalidCompressionLevelError> {
        Ok(Self {
            compression_level: CompressionLevel::new(compression_level)?,
        })
    }

    /// Create a new `zlib` compressor from configuration.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if the configured level is not valid.
    pub fn new_with_configuration(
        metadata: &CompressorMetadata,
    ) -> Result<Self, InvalidCompressionLevelError> {
        Ok(Self {
            compression_level: CompressionLevel::from_configuration(
                metadata,
                DEFAULT_COMPRESSION_LEVEL,
            )?,
        })
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel(DEFAULT_COMPRESSION_LEVEL),
        }
    }
}

impl CompressorTraits for ZlibCompressor {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> Option<CompressorMetadata> {
        let mut configuration = serde_json::Map::new();
        configuration.insert("level".to_string(), self.compression_level.as_u32().into());
        Some(CompressorMetadata::new(IDENTIFIER, configuration))
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}
