use std::sync::Arc;

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    metadata::ArrayHeader,
    region::Region,
    storage::{attributes_key, data_key, meta_key, NodePath, ReadableStorageTraits},
};

use super::{
    chunk_codec::chunk_grid_shape,
    chunk_key::{format_chunk_key, ChunkKeySeparator},
    transmute_from_bytes_vec, Array, ArrayCreateError, ArrayError, ArrayIndices, Element,
    OutputSlice,
};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array in `storage` at `path` with metadata read from the store.
    ///
    /// If the metadata omits `dimension_separator`, the chunk key layout is
    /// probed: chunk grid cells are visited in row-major order and both the
    /// nested and flat key for each cell are tested for existence. The first
    /// chunk found fixes the layout for the lifetime of the array. If the
    /// array holds no chunks at all, the layout remains unknown and I/O
    /// falls back to the configured default separator.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the metadata is missing,
    /// unparseable, or invalid, or on an underlying store error.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let key = meta_key(&path);
        let metadata = storage
            .get(&key)?
            .ok_or(ArrayCreateError::MissingMetadata(key))?;
        let header: ArrayHeader = serde_json::from_slice(&metadata)?;
        let separator = match header.dimension_separator {
            Some(separator) => Some(separator),
            None => probe_separator(&*storage, &path, &header)?,
        };
        Self::new_with_header(storage, path, header, separator)
    }

    /// Read the region `region` of the array into a newly allocated byte buffer.
    ///
    /// Elements of chunks that have never been written read as the fill
    /// value. If `parallel` is true, chunks intersecting the region are
    /// retrieved in parallel.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the region is out of bounds of the array or has mismatched rank,
    ///  - a chunk fails to decode, or
    ///  - an underlying store error occurs.
    ///
    /// # Panics
    /// Panics if a byte offset exceeds [`usize::MAX`].
    pub fn retrieve_region_opt(
        &self,
        region: &Region,
        parallel: bool,
    ) -> Result<Vec<u8>, ArrayError> {
        self.validate_region(region)?;
        let element_size = self.data_type.size();
        let output_size = usize::try_from(region.num_elements()).unwrap() * element_size;
        let mut output = vec![0u8; output_size];
        if region.is_empty() {
            return Ok(output);
        }
        let chunk_shape_u64 = self.header.chunks_u64();
        let output_slice = OutputSlice::new(&mut output);

        let retrieve_chunk_into = |chunk_indices: ArrayIndices| -> Result<(), ArrayError> {
            let chunk_region = self.chunk_region(&chunk_indices);
            let key = self.chunk_key(&chunk_indices);
            let chunk_bytes = self.chunk_codec.read(&*self.storage, &key)?;
            let window = region.intersect(&chunk_region);
            let window_bytes = if window.shape() == chunk_region.shape() {
                chunk_bytes
            } else {
                window
                    .rebase(chunk_region.offset())
                    .gather_bytes(&chunk_bytes, &chunk_shape_u64, element_size)
            };
            let mut copied = 0;
            for (offset, length) in window
                .rebase(region.offset())
                .byte_runs(region.shape(), element_size)
            {
                // the windows of distinct chunks never overlap in the output
                unsafe { output_slice.copy_from_slice(offset, &window_bytes[copied..copied + length]) };
                copied += length;
            }
            Ok(())
        };

        let chunks = self.chunks_in_region(region);
        if parallel {
            chunks
                .iter_indices()
                .collect::<Vec<_>>()
                .into_par_iter()
                .try_for_each(retrieve_chunk_into)?;
        } else {
            chunks.iter_indices().try_for_each(retrieve_chunk_into)?;
        }
        Ok(output)
    }

    /// Serial version of [`Array::retrieve_region_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn retrieve_region(&self, region: &Region) -> Result<Vec<u8>, ArrayError> {
        self.retrieve_region_opt(region, false)
    }

    /// Parallel version of [`Array::retrieve_region_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn par_retrieve_region(&self, region: &Region) -> Result<Vec<u8>, ArrayError> {
        self.retrieve_region_opt(region, true)
    }

    /// Read the region `region` of the array into a newly allocated element buffer.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the data type of `T` does not match the array data type, or
    ///  - a [`retrieve_region`](Array::retrieve_region) error condition is met.
    #[allow(clippy::missing_panics_doc)]
    pub fn retrieve_region_elements_opt<T: Element>(
        &self,
        region: &Region,
        parallel: bool,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_type::<T>()?;
        let bytes = self.retrieve_region_opt(region, parallel)?;
        Ok(transmute_from_bytes_vec::<T>(bytes))
    }

    /// Serial version of [`Array::retrieve_region_elements_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn retrieve_region_elements<T: Element>(
        &self,
        region: &Region,
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_region_elements_opt(region, false)
    }

    /// Parallel version of [`Array::retrieve_region_elements_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn par_retrieve_region_elements<T: Element>(
        &self,
        region: &Region,
    ) -> Result<Vec<T>, ArrayError> {
        self.retrieve_region_elements_opt(region, true)
    }

    /// Read the whole array into a newly allocated byte buffer.
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn retrieve_array(&self) -> Result<Vec<u8>, ArrayError> {
        self.retrieve_region(&Region::whole(self.shape.clone()))
    }

    /// Read the whole array into a newly allocated element buffer.
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn retrieve_array_elements<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        self.retrieve_region_elements(&Region::whole(self.shape.clone()))
    }

    /// Read the user attributes of the array from its `.zattrs` document.
    ///
    /// Returns an empty map if the document does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the document exists but is unparseable,
    /// or on an underlying store error.
    pub fn attributes(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ArrayError> {
        match self.storage.get(&attributes_key(&self.path))? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(ArrayError::InvalidAttributes),
            None => Ok(serde_json::Map::new()),
        }
    }
}

/// Probe the chunk key layout of an array whose metadata predates the
/// `dimension_separator` field.
///
/// Iterations are bounded by the chunk grid size, not the element count.
fn probe_separator<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    header: &ArrayHeader,
) -> Result<Option<ChunkKeySeparator>, ArrayCreateError> {
    let grid_shape = chunk_grid_shape(&header.shape, &header.chunks);
    for chunk_indices in Region::whole(grid_shape).iter_indices() {
        for separator in [ChunkKeySeparator::Slash, ChunkKeySeparator::Dot] {
            let key = data_key(path, &format_chunk_key(&chunk_indices, separator));
            if storage.size_key(&key)?.is_some() {
                tracing::debug!("array at {path} uses `{separator}` separated chunk keys");
                return Ok(Some(separator));
            }
        }
    }
    // Not necessarily an error: the array may have been created without any
    // chunks written yet.
    tracing::warn!(
        "array at {path} has no dimension_separator metadata and no chunks, its chunk key layout is unknown"
    );
    Ok(None)
}
