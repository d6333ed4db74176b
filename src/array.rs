//! The chunked array engine.
//!
//! An [`Array`] is a logical N-dimensional collection of numeric elements
//! defined by the following parameters (encoded in its JSON
//! [metadata](crate::metadata)):
//!  - **shape**: the length of each array dimension,
//!  - **chunks**: the length of each dimension of a chunk, the unit of I/O
//!    and compression,
//!  - **dtype**: the numeric [data type](DataType) of the elements and the
//!    on-disk [byte order](Endianness),
//!  - **fill value**: the element value for portions of the array that have
//!    never been written,
//!  - **compressor**: the [codec](codec) applied to each chunk blob, and
//!  - (optional) **dimension separator**: the [chunk key](chunk_key) layout.
//!
//! Chunks that do not divide the shape evenly produce partial edge chunks
//! which are stored with full chunk dimensions; the out-of-shape padding is
//! never exposed by reads.
//!
//! The easiest way to create a *new* array is with an [`ArrayBuilder`].
//! An *existing* array is initialised with [`Array::open`], which reads the
//! metadata from the store and probes the chunk key layout if the metadata
//! does not record it.
//!
//! Once open, arrays are read and written by [region](crate::region):
//!  - [`retrieve_region`](Array::retrieve_region) /
//!    [`retrieve_region_elements`](Array::retrieve_region_elements) /
//!    [`retrieve_array`](Array::retrieve_array)
//!  - [`store_region`](Array::store_region) /
//!    [`store_region_elements`](Array::store_region_elements) /
//!    [`store_region_scalar`](Array::store_region_scalar)
//!
//! Each method has a `par_` prefixed variant that fans the per-chunk work
//! out over a thread pool. All methods validate their inputs before any
//! store I/O and visit chunks in row-major order of chunk indices.

mod array_builder;
mod array_errors;
pub mod chunk_codec;
pub mod chunk_key;
pub mod codec;
pub mod data_type;
mod element;
mod endianness;
mod fill_value;
mod output_slice;

mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;

use std::{
    collections::HashMap,
    num::NonZeroU64,
    sync::{Arc, Mutex},
};

pub use self::{
    array_builder::ArrayBuilder,
    array_errors::{ArrayCreateError, ArrayError},
    chunk_codec::ChunkCodec,
    chunk_key::ChunkKeySeparator,
    codec::{Compressor, CompressorTraits},
    data_type::DataType,
    element::{
        convert_from_bytes_slice, convert_to_bytes_vec, transmute_from_bytes_vec,
        transmute_to_bytes_vec, Element,
    },
    endianness::{Endianness, NATIVE_ENDIAN},
    fill_value::FillValue,
    output_slice::OutputSlice,
};

use crate::{
    config::global_config,
    metadata::{ArrayHeader, ArrayOrder},
    region::Region,
    storage::{data_key, NodePath, StoreKey},
};

use chunk_key::format_chunk_key;

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// The shape of a chunk. All dimensions must be non-zero.
pub type ChunkShape = Vec<NonZeroU64>;

/// A chunked N-dimensional array.
///
/// See the [module documentation](self) for an overview and
/// [`crate::metadata`] for the on-disk representation.
///
/// ## Parallel writing
/// Writes to a chunk are serialised by a lock keyed on the chunk's store
/// key, so concurrent [`store_region`](Array::store_region) calls are safe
/// even when their regions share chunks; whichever write commits a shared
/// chunk last wins for the overlapping cells. Reads do not take chunk locks
/// and may observe a chunk's pre- or post-update value, but never a torn
/// mixture. A call that touches N chunks is not atomic as a whole: a crash
/// mid-call may leave some chunks updated and others not.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage backing the array.
    storage: Arc<TStorage>,
    /// The path of the array node in the store.
    path: NodePath,
    /// The length of each array dimension.
    shape: ArrayShape,
    /// The length of each dimension of a chunk.
    chunk_shape: ChunkShape,
    /// The data type of the array elements.
    data_type: DataType,
    /// The on-disk byte order of multi-byte elements.
    endianness: Endianness,
    /// The element value for cells that have never been written.
    fill_value: FillValue,
    /// Encodes and decodes whole chunks.
    chunk_codec: ChunkCodec,
    /// The chunk key layout. [`None`] if the metadata omits it and the
    /// open-time probe found no chunks.
    separator: Option<ChunkKeySeparator>,
    /// Per-chunk-key write locks, created on first use and retained for the
    /// array's lifetime.
    chunk_locks: Mutex<HashMap<StoreKey, Arc<parking_lot::Mutex<()>>>>,
    /// The metadata describing this array.
    header: ArrayHeader,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` from `header`.
    ///
    /// This does **not** read or write the store; use [`Array::open`] to
    /// initialise an existing array or [`ArrayBuilder`] to create a new one.
    ///
    /// `separator` is the resolved chunk key layout; pass
    /// `header.dimension_separator` unless it was probed.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the header is internally
    /// inconsistent or names an unsupported data type, order, filter, or
    /// compressor.
    pub fn new_with_header(
        storage: Arc<TStorage>,
        path: NodePath,
        header: ArrayHeader,
        separator: Option<ChunkKeySeparator>,
    ) -> Result<Self, ArrayCreateError> {
        if header.shape.is_empty() || header.chunks.len() != header.shape.len() {
            return Err(ArrayCreateError::InvalidChunkShape(
                header.chunks_u64(),
                header.shape.clone(),
            ));
        }
        if header.order != ArrayOrder::C {
            return Err(ArrayCreateError::UnsupportedOrder);
        }
        if header.filters.as_ref().is_some_and(|f| !f.is_empty()) {
            return Err(ArrayCreateError::UnsupportedFilters);
        }
        let (data_type, endianness) = DataType::from_metadata(&header.dtype)?;
        let compressor = Compressor::from_metadata(header.compressor.as_ref())?;
        let fill_value = data_type.fill_value_from_metadata(&header.fill_value)?;
        let chunk_codec = ChunkCodec::new(
            compressor,
            data_type,
            endianness,
            header.chunks.clone(),
            fill_value.clone(),
        );
        Ok(Self {
            storage,
            path,
            shape: header.shape.clone(),
            chunk_shape: header.chunks.clone(),
            data_type,
            endianness,
            fill_value,
            chunk_codec,
            separator,
            chunk_locks: Mutex::default(),
            header,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the array dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Get the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the on-disk byte order.
    #[must_use]
    pub const fn endianness(&self) -> &Endianness {
        &self.endianness
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the compressor.
    #[must_use]
    pub fn compressor(&self) -> &Compressor {
        self.chunk_codec.compressor()
    }

    /// Get the chunk key separator.
    ///
    /// [`None`] if the array metadata omits `dimension_separator` and the
    /// open-time probe found no chunks; in that state I/O uses
    /// [`Config::chunk_key_separator_default`](crate::config::Config).
    #[must_use]
    pub const fn separator(&self) -> Option<ChunkKeySeparator> {
        self.separator
    }

    /// Return the underlying array metadata.
    #[must_use]
    pub const fn header(&self) -> &ArrayHeader {
        &self.header
    }

    /// Return the shape of the chunk grid (i.e., the number of chunks per axis).
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        chunk_codec::chunk_grid_shape(&self.shape, &self.chunk_shape)
    }

    /// Return the [`StoreKey`] of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        self.chunk_key_with_separator(chunk_indices, self.separator_or_default())
    }

    /// Return the extent in array space of the chunk at `chunk_indices`.
    ///
    /// Edge chunks extend beyond the array shape.
    #[must_use]
    pub fn chunk_region(&self, chunk_indices: &[u64]) -> Region {
        let offset = std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(index, len)| index * len.get())
            .collect();
        let shape = self.chunk_shape.iter().map(|len| len.get()).collect();
        unsafe { Region::new_unchecked(offset, shape) }
    }

    fn chunk_key_with_separator(
        &self,
        chunk_indices: &[u64],
        separator: ChunkKeySeparator,
    ) -> StoreKey {
        data_key(&self.path, &format_chunk_key(chunk_indices, separator))
    }

    fn separator_or_default(&self) -> ChunkKeySeparator {
        self.separator
            .unwrap_or_else(|| global_config().chunk_key_separator_default())
    }

    /// Return the write lock for the chunk at `key`.
    ///
    /// Locks are created on first use and retained for the array's lifetime,
    /// so all writers of a chunk contend on the same mutex.
    fn chunk_lock(&self, key: &StoreKey) -> Arc<parking_lot::Mutex<()>> {
        let mut locks = self.chunk_locks.lock().unwrap();
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(parking_lot::Mutex::default()))
            .clone()
    }

    /// Validate a region against the array shape and rank.
    fn validate_region(&self, region: &Region) -> Result<(), ArrayError> {
        if region.fits_within(&self.shape) {
            Ok(())
        } else {
            Err(ArrayError::InvalidRegion(
                region.clone(),
                self.shape.clone(),
            ))
        }
    }

    /// Validate a caller buffer length against a region.
    fn validate_buffer_size(&self, region: &Region, bytes_len: usize) -> Result<(), ArrayError> {
        let expected_size = region.num_elements() * self.data_type.size() as u64;
        if bytes_len as u64 == expected_size {
            Ok(())
        } else {
            Err(ArrayError::InvalidBytesInputSize(bytes_len, expected_size))
        }
    }

    /// Validate an element type against the array data type.
    fn validate_element_type<T: Element>(&self) -> Result<(), ArrayError> {
        if T::data_type() == self.data_type {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementType(
                T::data_type(),
                self.data_type,
            ))
        }
    }

    /// Return the grid-space region of the chunks intersecting `region`.
    ///
    /// The region rank must match the array rank.
    fn chunks_in_region(&self, region: &Region) -> Region {
        debug_assert_eq!(region.rank(), self.dimensionality());
        if region.is_empty() {
            return Region::empty(region.rank());
        }
        let first: ArrayIndices = std::iter::zip(region.offset(), &self.chunk_shape)
            .map(|(offset, len)| offset / len.get())
            .collect();
        let last: ArrayIndices = std::iter::zip(region.end(), &self.chunk_shape)
            .map(|(end, len)| (end - 1) / len.get())
            .collect();
        let shape: ArrayShape = std::iter::zip(&first, &last)
            .map(|(first, last)| last - first + 1)
            .collect();
        unsafe { Region::new_unchecked(first, shape) }
    }
}

impl<TStorage: ?Sized> core::fmt::Display for Array<TStorage> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "array at {} shape {:?} chunks {:?} data type {} byte order {} fill value {} compressor {}",
            self.path,
            self.shape,
            self.header.chunks_u64(),
            self.data_type,
            self.endianness,
            self.fill_value,
            self.compressor().identifier(),
        )
    }
}
