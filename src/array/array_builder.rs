use std::{num::NonZeroU64, sync::Arc};

use crate::{
    metadata::ArrayHeader,
    storage::{node_prefix, NodePath, WritableStorageTraits},
};

use super::{
    chunk_key::ChunkKeySeparator, data_type::IncompatibleFillValueError, Array, ArrayCreateError,
    ArrayShape, ChunkShape, Compressor, DataType, Endianness, FillValue, NATIVE_ENDIAN,
};

/// An [`Array`] builder.
///
/// Creates a new array: erases anything stored under the array path, writes
/// the metadata document, and returns the open array. Chunks are lazily
/// materialised on first write.
///
/// Defaults which can be overridden with the builder methods:
///  - byte order: native,
///  - compressor: none,
///  - chunk key separator: `.` (flat keys),
///  - no user attributes.
///
/// ## Example
/// ```rust
/// # use std::sync::Arc;
/// # use gridstore::array::{ArrayBuilder, ChunkKeySeparator, DataType, Endianness, FillValue};
/// # use gridstore::array::codec::ZlibCompressor;
/// # use gridstore::array::Compressor;
/// # let store = Arc::new(gridstore::storage::store::MemoryStore::new());
/// let mut builder = ArrayBuilder::new(
///     vec![8, 8],
///     vec![4, 4],
///     DataType::Float32,
///     FillValue::from(f32::NAN),
/// );
/// builder
///     .endianness(Endianness::Little)
///     .compressor(Compressor::new(ZlibCompressor::new(5)?))
///     .chunk_key_separator(ChunkKeySeparator::Slash);
/// let array = builder.create(store, "/group/array")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    chunk_shape: ArrayShape,
    data_type: DataType,
    fill_value: FillValue,
    endianness: Endianness,
    compressor: Compressor,
    separator: ChunkKeySeparator,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl ArrayBuilder {
    /// Create a new array builder for an array with `shape`, `chunk_shape`,
    /// `data_type` and `fill_value`.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunk_shape: ArrayShape,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Self {
        Self {
            shape,
            chunk_shape,
            data_type,
            fill_value,
            endianness: NATIVE_ENDIAN,
            compressor: Compressor::null(),
            separator: ChunkKeySeparator::Dot,
            attributes: serde_json::Map::new(),
        }
    }

    /// Set the on-disk byte order of multi-byte elements.
    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = endianness;
        self
    }

    /// Set the compressor.
    pub fn compressor(&mut self, compressor: Compressor) -> &mut Self {
        self.compressor = compressor;
        self
    }

    /// Set the chunk key separator.
    pub fn chunk_key_separator(&mut self, separator: ChunkKeySeparator) -> &mut Self {
        self.separator = separator;
        self
    }

    /// Set the user attributes, written to the `.zattrs` document.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Create the array in `storage` at `path`.
    ///
    /// Anything stored under the array path is erased, then the metadata
    /// document (and the user attributes document, if attributes were set)
    /// is written.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if
    ///  - the chunk shape does not match the array rank or has a zero
    ///    dimension,
    ///  - the fill value is incompatible with the data type, or
    ///  - an underlying store error occurs.
    pub fn create<TStorage: ?Sized + WritableStorageTraits>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let chunks: Option<ChunkShape> = self
            .chunk_shape
            .iter()
            .map(|&c| NonZeroU64::new(c))
            .collect();
        let chunks = match chunks {
            Some(chunks) if chunks.len() == self.shape.len() && !self.shape.is_empty() => chunks,
            _ => {
                return Err(ArrayCreateError::InvalidChunkShape(
                    self.chunk_shape.clone(),
                    self.shape.clone(),
                ))
            }
        };
        if self.fill_value.size() != self.data_type.size() {
            return Err(IncompatibleFillValueError::new(
                self.data_type.identifier().to_string(),
                self.fill_value.clone(),
            )
            .into());
        }

        let header = ArrayHeader::new(
            self.shape.clone(),
            chunks,
            self.data_type.metadata_string(self.endianness),
            self.compressor.create_metadata(),
            self.data_type.metadata_fill_value(&self.fill_value),
            Some(self.separator),
        );

        // Erase stale chunks from any array previously stored at this path
        storage.erase_prefix(&node_prefix(&path))?;
        tracing::debug!("creating array at {path}");

        let array = Array::new_with_header(storage, path, header, Some(self.separator))?;
        array.store_metadata()?;
        if !self.attributes.is_empty() {
            array.store_attributes(&self.attributes)?;
        }
        Ok(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;
    use crate::storage::ReadableStorageTraits;

    #[test]
    fn builder_invalid_chunk_shape() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![8, 8],
            vec![4],
            DataType::UInt8,
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.create(store.clone(), "/array"),
            Err(ArrayCreateError::InvalidChunkShape(_, _))
        ));

        let builder = ArrayBuilder::new(
            vec![8, 8],
            vec![4, 0],
            DataType::UInt8,
            FillValue::from(0u8),
        );
        assert!(builder.create(store, "/array").is_err());
    }

    #[test]
    fn builder_invalid_fill_value() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![8, 8],
            vec![4, 4],
            DataType::UInt8,
            FillValue::from(0u16),
        );
        assert!(matches!(
            builder.create(store, "/array"),
            Err(ArrayCreateError::InvalidFillValue(_))
        ));
    }

    #[test]
    fn builder_erases_stale_data() {
        let store = Arc::new(MemoryStore::new());
        let stale_key = "array/0.0".try_into().unwrap();
        crate::storage::WritableStorageTraits::set(&*store, &stale_key, &[1, 2, 3]).unwrap();

        let builder = ArrayBuilder::new(vec![4], vec![2], DataType::UInt8, FillValue::from(0u8));
        builder.create(store.clone(), "/array").unwrap();
        assert_eq!(store.get(&stale_key).unwrap(), None);
    }

    #[test]
    fn builder_writes_attributes() {
        let store = Arc::new(MemoryStore::new());
        let mut builder =
            ArrayBuilder::new(vec![4], vec![2], DataType::UInt8, FillValue::from(0u8));
        let mut attributes = serde_json::Map::new();
        attributes.insert("title".to_string(), "apples".into());
        builder.attributes(attributes.clone());
        let array = builder.create(store, "/array").unwrap();
        assert_eq!(array.attributes().unwrap(), attributes);
    }
}
