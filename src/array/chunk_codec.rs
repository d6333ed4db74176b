//! The per-chunk encode/decode pipeline.

use std::num::NonZeroU64;

use crate::storage::{ReadableStorageTraits, StoreKey, WritableStorageTraits};

use super::{
    codec::CodecError, endianness::reverse_element_bytes, ArrayError, ChunkShape, Compressor,
    DataType, Endianness, FillValue,
};

/// Encodes and decodes whole chunks of one array.
///
/// Decoding fetches a blob from the store, decompresses it, verifies its
/// length and converts its elements to native byte order; a missing blob is
/// synthesised from the fill value. Encoding is the reverse. The pipeline
/// handles no geometry; its input and output is always a full chunk in
/// row-major order.
#[derive(Debug, Clone)]
pub struct ChunkCodec {
    compressor: Compressor,
    data_type: DataType,
    endianness: Endianness,
    chunk_shape: ChunkShape,
    fill_value: FillValue,
}

impl ChunkCodec {
    /// Create a chunk codec.
    #[must_use]
    pub fn new(
        compressor: Compressor,
        data_type: DataType,
        endianness: Endianness,
        chunk_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        debug_assert_eq!(data_type.size(), fill_value.size());
        Self {
            compressor,
            data_type,
            endianness,
            chunk_shape,
            fill_value,
        }
    }

    /// Return the compressor.
    #[must_use]
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Return the number of elements in a chunk.
    #[must_use]
    pub fn chunk_num_elements(&self) -> u64 {
        self.chunk_shape.iter().map(|c| c.get()).product()
    }

    /// Return the size in bytes of a decoded chunk.
    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        self.chunk_num_elements() * self.data_type.size() as u64
    }

    /// Return a freshly allocated chunk with every element equal to the fill value.
    ///
    /// # Panics
    /// Panics if the chunk size exceeds [`usize::MAX`].
    #[must_use]
    pub fn fill_chunk(&self) -> Vec<u8> {
        let num_elements = usize::try_from(self.chunk_num_elements()).unwrap();
        self.fill_value.as_ne_bytes().repeat(num_elements)
    }

    /// Read and decode the chunk at `key`, or synthesise a fill value chunk
    /// if the key is absent.
    ///
    /// The returned bytes are in native byte order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the store fails or the decompressed
    /// chunk does not have the expected size.
    pub fn read<TStorage: ?Sized + ReadableStorageTraits>(
        &self,
        storage: &TStorage,
        key: &StoreKey,
    ) -> Result<Vec<u8>, ArrayError> {
        let Some(blob) = storage.get(key)? else {
            return Ok(self.fill_chunk());
        };
        let mut bytes = self.compressor.decode(blob)?;
        if bytes.len() as u64 != self.chunk_size() {
            return Err(
                CodecError::UnexpectedChunkDecodedSize(bytes.len(), self.chunk_size()).into(),
            );
        }
        if !self.endianness.is_native() {
            reverse_element_bytes(&mut bytes, self.data_type.size());
        }
        Ok(bytes)
    }

    /// Encode `chunk_bytes` and store it at `key`.
    ///
    /// `chunk_bytes` must be a full chunk in native byte order.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the compressor or the store fails.
    pub fn write<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: &TStorage,
        key: &StoreKey,
        mut chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        debug_assert_eq!(chunk_bytes.len() as u64, self.chunk_size());
        if !self.endianness.is_native() {
            reverse_element_bytes(&mut chunk_bytes, self.data_type.size());
        }
        let blob = self.compressor.encode(chunk_bytes)?;
        storage.set(key, &blob)?;
        Ok(())
    }
}

/// Compute the shape of the chunk grid: the per-axis chunk counts covering `shape`.
#[must_use]
pub fn chunk_grid_shape(shape: &[u64], chunk_shape: &[NonZeroU64]) -> Vec<u64> {
    std::iter::zip(shape, chunk_shape)
        .map(|(s, c)| s.div_ceil(c.get()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    fn chunk_codec(compressor: Compressor, endianness: Endianness) -> ChunkCodec {
        ChunkCodec::new(
            compressor,
            DataType::Int32,
            endianness,
            vec![NonZeroU64::new(2).unwrap(), NonZeroU64::new(2).unwrap()],
            FillValue::from(-1i32),
        )
    }

    #[test]
    fn chunk_codec_fill_on_miss() {
        let store = MemoryStore::new();
        let codec = chunk_codec(Compressor::null(), Endianness::Little);
        let key = StoreKey::new("array/0.0").unwrap();
        let chunk = codec.read(&store, &key).unwrap();
        assert_eq!(chunk.len() as u64, codec.chunk_size());
        assert_eq!(
            crate::array::transmute_from_bytes_vec::<i32>(chunk),
            vec![-1; 4]
        );
    }

    #[test]
    fn chunk_codec_round_trip_byte_order() {
        let store = MemoryStore::new();
        let key = StoreKey::new("array/0.0").unwrap();
        for endianness in [Endianness::Little, Endianness::Big] {
            let codec = chunk_codec(Compressor::null(), endianness);
            let chunk = crate::array::transmute_to_bytes_vec(vec![1i32, 2, 3, 4]);
            codec.write(&store, &key, chunk.clone()).unwrap();
            assert_eq!(codec.read(&store, &key).unwrap(), chunk);
        }
        // the two byte orders must produce different blobs
        let codec_le = chunk_codec(Compressor::null(), Endianness::Little);
        let codec_be = chunk_codec(Compressor::null(), Endianness::Big);
        let chunk = crate::array::transmute_to_bytes_vec(vec![1i32, 2, 3, 4]);
        codec_le.write(&store, &key, chunk.clone()).unwrap();
        let blob_le = store.get(&key).unwrap().unwrap();
        codec_be.write(&store, &key, chunk).unwrap();
        let blob_be = store.get(&key).unwrap().unwrap();
        assert_ne!(blob_le, blob_be);
    }

    #[test]
    fn chunk_codec_corrupt_chunk() {
        let store = MemoryStore::new();
        let key = StoreKey::new("array/0.0").unwrap();
        store.set(&key, &[0; 3]).unwrap();
        let codec = chunk_codec(Compressor::null(), Endianness::Little);
        assert!(matches!(
            codec.read(&store, &key),
            Err(ArrayError::CodecError(
                CodecError::UnexpectedChunkDecodedSize(3, 16)
            ))
        ));
    }

    #[test]
    fn chunk_grid_shape_rounds_up() {
        let chunks = vec![NonZeroU64::new(3).unwrap(), NonZeroU64::new(5).unwrap()];
        assert_eq!(chunk_grid_shape(&[10, 10], &chunks), vec![4, 2]);
        assert_eq!(chunk_grid_shape(&[9, 10], &chunks), vec![3, 2]);
    }
}
