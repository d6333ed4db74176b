//! Array regions.
//!
//! A [`Region`] is an axis-aligned hyper-rectangle within an array or chunk,
//! specified by a per-axis offset and shape.
//! The [`Array`](crate::array::Array) store and retrieve methods take a
//! [`Region`] parameter, and the engine uses regions internally to partition
//! a request into per-chunk windows: the window a chunk contributes is the
//! [intersection](Region::intersect) of the request with the chunk's extent,
//! [rebased](Region::rebase) into the coordinates of whichever buffer is
//! being copied.
//!
//! Copies in and out of flat row-major buffers are driven by
//! [`Region::byte_runs`]: the region decomposes into runs of bytes that are
//! contiguous in the enclosing buffer, and each run is moved with a single
//! `copy_from_slice`.

pub mod iterators;

use std::ops::Range;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

use iterators::{ByteRuns, IndexIter};

/// A region of an array or chunk: a per-axis offset and shape.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Default)]
#[display("offset {offset:?} shape {shape:?}")]
pub struct Region {
    offset: ArrayIndices,
    shape: ArrayShape,
}

impl Region {
    /// Create a new region from an offset and a shape.
    ///
    /// # Errors
    /// Returns [`RankMismatchError`] if `offset` and `shape` differ in length.
    pub fn new(offset: ArrayIndices, shape: ArrayShape) -> Result<Self, RankMismatchError> {
        if offset.len() == shape.len() {
            Ok(Self { offset, shape })
        } else {
            Err(RankMismatchError::new(offset.len(), shape.len()))
        }
    }

    /// Create a new region from an offset and a shape, without checking that
    /// their lengths match.
    ///
    /// # Safety
    /// The lengths of `offset` and `shape` must match.
    #[must_use]
    pub unsafe fn new_unchecked(offset: ArrayIndices, shape: ArrayShape) -> Self {
        debug_assert_eq!(offset.len(), shape.len());
        Self { offset, shape }
    }

    /// Create a new region from one index range per axis.
    ///
    /// A range whose end is below its start yields a zero length on that
    /// axis.
    #[must_use]
    pub fn from_ranges(ranges: impl IntoIterator<Item = Range<u64>>) -> Self {
        let (offset, shape) = ranges
            .into_iter()
            .map(|range| (range.start, range.end.saturating_sub(range.start)))
            .unzip();
        Self { offset, shape }
    }

    /// Create the region covering the whole of an array with `shape`.
    #[must_use]
    pub fn whole(shape: ArrayShape) -> Self {
        Self {
            offset: vec![0; shape.len()],
            shape,
        }
    }

    /// Create an empty region of the given rank.
    #[must_use]
    pub fn empty(rank: usize) -> Self {
        Self {
            offset: vec![0; rank],
            shape: vec![0; rank],
        }
    }

    /// Return the offset of the region.
    #[must_use]
    pub fn offset(&self) -> &[u64] {
        &self.offset
    }

    /// Return the shape of the region.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the rank (number of axes) of the region.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Return the exclusive end of the region on every axis.
    #[must_use]
    pub fn end(&self) -> ArrayIndices {
        std::iter::zip(&self.offset, &self.shape)
            .map(|(offset, len)| offset + len)
            .collect()
    }

    /// Return the number of elements in the region, the product of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Returns true if the region contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Returns true if the region lies entirely within an array of
    /// `array_shape` (and has the same rank).
    #[must_use]
    pub fn fits_within(&self, array_shape: &[u64]) -> bool {
        self.rank() == array_shape.len()
            && std::iter::zip(self.end(), array_shape).all(|(end, len)| end <= *len)
    }

    /// Return the intersection of this region with `other`.
    ///
    /// Disjoint regions intersect to an empty region.
    ///
    /// # Panics
    /// Panics if the ranks of the two regions differ.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        assert_eq!(self.rank(), other.rank());
        let mut offset = Vec::with_capacity(self.rank());
        let mut shape = Vec::with_capacity(self.rank());
        for (own_offset, own_len, other_offset, other_len) in
            izip!(&self.offset, &self.shape, &other.offset, &other.shape)
        {
            let from = (*own_offset).max(*other_offset);
            let to = (own_offset + own_len).min(other_offset + other_len);
            offset.push(from);
            shape.push(to.saturating_sub(from));
        }
        Self { offset, shape }
    }

    /// Express the region in the coordinates of a buffer whose origin lies
    /// at `origin`: the offset becomes [`Region::offset()`] - `origin`.
    ///
    /// # Panics
    /// Panics if the length of `origin` does not match the region rank, or
    /// if `origin` exceeds the region offset on any axis.
    #[must_use]
    pub fn rebase(&self, origin: &[u64]) -> Self {
        assert_eq!(origin.len(), self.rank());
        let offset = std::iter::zip(&self.offset, origin)
            .map(|(offset, base)| {
                offset
                    .checked_sub(*base)
                    .expect("origin must not exceed the region offset")
            })
            .collect();
        Self {
            offset,
            shape: self.shape.clone(),
        }
    }

    /// Returns an iterator over the indices of elements within the region,
    /// in row-major order (the last axis varies fastest).
    #[must_use]
    pub fn iter_indices(&self) -> IndexIter {
        IndexIter::new(self)
    }

    /// Decompose the region into byte runs within a flat row-major buffer of
    /// `array_shape` and `element_size`: `(byte offset, byte length)` pairs,
    /// each contiguous in the buffer, in row-major order.
    ///
    /// # Panics
    /// Panics if the region does not fit within `array_shape` or a byte
    /// offset exceeds [`usize::MAX`].
    #[must_use]
    pub fn byte_runs(&self, array_shape: &[u64], element_size: usize) -> ByteRuns {
        assert!(self.fits_within(array_shape));
        ByteRuns::new(self, array_shape, element_size)
    }

    /// Copy the bytes of this region out of a flat row-major buffer holding
    /// an array of `array_shape` with `element_size`, into a contiguous
    /// buffer of its own.
    ///
    /// # Panics
    /// Panics if the region does not fit within `array_shape` or the length
    /// of `bytes` is shorter than the buffer the shape implies.
    #[must_use]
    pub fn gather_bytes(&self, bytes: &[u8], array_shape: &[u64], element_size: usize) -> Vec<u8> {
        let mut window_bytes =
            Vec::with_capacity(usize::try_from(self.num_elements()).unwrap() * element_size);
        for (offset, length) in self.byte_runs(array_shape, element_size) {
            window_bytes.extend_from_slice(&bytes[offset..offset + length]);
        }
        window_bytes
    }
}

/// A rank mismatch error.
#[derive(Copy, Clone, Debug, Error)]
#[error("rank {0} does not match expected rank {1}")]
pub struct RankMismatchError(usize, usize);

impl RankMismatchError {
    /// Create a new rank mismatch error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}
