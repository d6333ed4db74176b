use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};

use crate::metadata::CompressorMetadata;

use super::{CodecError, CompressionLevel, CompressorTraits, InvalidCompressionLevelError};

const IDENTIFIER: &str = "gzip";

const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// A `gzip` compressor implementation.
///
/// Chunk blobs are gzip streams (RFC 1952).
#[derive(Clone, Debug)]
pub struct GzipCompressor {
    compression_level: CompressionLevel,
}

impl GzipCompressor {
    /// Create a new `gzip` compressor.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, InvalidCompressionLevelError> {
        Ok(Self {
            compression_level: CompressionLevel::new(compression_level)?,
        })
    }

    /// Create a new `gzip` compressor from configuration.
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

impl CompressorTraits for GzipCompressor {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn create_metadata(&self) -> Option<CompressorMetadata> {
        let mut configuration = serde_json::Map::new();
        configuration.insert("level".to_string(), self.compression_level.as_u32().into());
        Some(CompressorMetadata::new(IDENTIFIER, configuration))
    }

    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            flate2::Compression::new(self.compression_level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trip() {
        let compressor = GzipCompressor::new(9).unwrap();
        let decoded_value: Vec<u8> = (0..255).cycle().take(1000).collect();
        let encoded = compressor.encode(decoded_value.clone()).unwrap();
        assert_eq!(compressor.decode(encoded).unwrap(), decoded_value);
    }

    #[test]
    fn gzip_metadata() {
        let metadata: CompressorMetadata =
            serde_json::from_str(r#"{"id":"gzip","level":3}"#).unwrap();
        let compressor = GzipCompressor::new_with_configuration(&metadata).unwrap();
        assert_eq!(
            serde_json::to_string(&compressor.create_metadata().unwrap()).unwrap(),
            r#"{"id":"gzip","level":3}"#
        );
    }
}
