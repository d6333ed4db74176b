use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{region::Region, storage::ReadableWritableStorageTraits};

use super::{transmute_to_bytes_vec, Array, ArrayError, ArrayIndices, Element};

impl<TStorage: ?Sized + ReadableWritableStorageTraits> Array<TStorage> {
    /// Encode `bytes` and store it in the region `region` of the array.
    ///
    /// `bytes` is a flat row-major buffer whose length must equal the number
    /// of elements in the region times the element size.
    /// If `parallel` is true, chunks intersecting the region are updated in
    /// parallel.
    ///
    /// Chunks fully covered by the region are replaced wholesale; partially
    /// covered chunks are decoded, updated, and re-encoded under the
    /// per-chunk lock. A failing chunk aborts the call, leaving chunks
    /// stored by earlier iterations in place.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the region is out of bounds of the array or has mismatched rank,
    ///  - the length of `bytes` does not match the region,
    ///  - a chunk fails to encode or decode, or
    ///  - an underlying store error occurs.
    ///
    /// # Panics
    /// Panics if a byte offset exceeds [`usize::MAX`].
    pub fn store_region_opt(
        &self,
        region: &Region,
        bytes: Vec<u8>,
        parallel: bool,
    ) -> Result<(), ArrayError> {
        self.validate_region(region)?;
        self.validate_buffer_size(region, bytes.len())?;
        if region.is_empty() {
            return Ok(());
        }
        let element_size = self.data_type.size();
        let chunk_shape_u64 = self.header.chunks_u64();

        let store_chunk = |chunk_indices: ArrayIndices| -> Result<(), ArrayError> {
            let chunk_region = self.chunk_region(&chunk_indices);
            let key = self.chunk_key(&chunk_indices);
            let window = region.intersect(&chunk_region);
            let window_bytes = window
                .rebase(region.offset())
                .gather_bytes(&bytes, region.shape(), element_size);

            let mutex = self.chunk_lock(&key);
            let _lock = mutex.lock();
            if window.shape() == chunk_region.shape() {
                // the window covers the whole chunk, store it without decoding
                self.chunk_codec.write(&*self.storage, &key, window_bytes)
            } else {
                let mut chunk_bytes = self.chunk_codec.read(&*self.storage, &key)?;
                let mut copied = 0;
                for (offset, length) in window
                    .rebase(chunk_region.offset())
                    .byte_runs(&chunk_shape_u64, element_size)
                {
                    chunk_bytes[offset..offset + length]
                        .copy_from_slice(&window_bytes[copied..copied + length]);
                    copied += length;
                }
                self.chunk_codec.write(&*self.storage, &key, chunk_bytes)
            }
        };

        let chunks = self.chunks_in_region(region);
        if parallel {
            chunks
                .iter_indices()
                .collect::<Vec<_>>()
                .into_par_iter()
                .try_for_each(store_chunk)
        } else {
            chunks.iter_indices().try_for_each(store_chunk)
        }
    }

    /// Serial version of [`Array::store_region_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn store_region(&self, region: &Region, bytes: Vec<u8>) -> Result<(), ArrayError> {
        self.store_region_opt(region, bytes, false)
    }

    /// Parallel version of [`Array::store_region_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn par_store_region(&self, region: &Region, bytes: Vec<u8>) -> Result<(), ArrayError> {
        self.store_region_opt(region, bytes, true)
    }

    /// Encode `elements` and store it in the region `region` of the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the data type of `T` does not match the array data type, or
    ///  - a [`store_region`](Array::store_region) error condition is met.
    #[allow(clippy::missing_panics_doc)]
    pub fn store_region_elements_opt<T: Element>(
        &self,
        region: &Region,
        elements: Vec<T>,
        parallel: bool,
    ) -> Result<(), ArrayError> {
        self.validate_element_type::<T>()?;
        self.store_region_opt(region, transmute_to_bytes_vec(elements), parallel)
    }

    /// Serial version of [`Array::store_region_elements_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn store_region_elements<T: Element>(
        &self,
        region: &Region,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.store_region_elements_opt(region, elements, false)
    }

    /// Parallel version of [`Array::store_region_elements_opt`].
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn par_store_region_elements<T: Element>(
        &self,
        region: &Region,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        self.store_region_elements_opt(region, elements, true)
    }

    /// Store `value` in every element of the region `region` of the array.
    ///
    /// Materialises a buffer of the region size and delegates to
    /// [`store_region_elements`](Array::store_region_elements).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the data type of `T` does not match the array data type, or
    ///  - a [`store_region`](Array::store_region) error condition is met.
    ///
    /// # Panics
    /// Panics if the region element count exceeds [`usize::MAX`].
    pub fn store_region_scalar<T: Element>(
        &self,
        region: &Region,
        value: T,
    ) -> Result<(), ArrayError> {
        self.validate_element_type::<T>()?;
        self.validate_region(region)?;
        let elements = vec![value; usize::try_from(region.num_elements()).unwrap()];
        self.store_region_elements(region, elements)
    }

    /// Store `value` in every element of the array.
    #[allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
    pub fn store_scalar<T: Element>(&self, value: T) -> Result<(), ArrayError> {
        self.store_region_scalar(&Region::whole(self.shape.clone()), value)
    }
}
