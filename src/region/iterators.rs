//! Iterators over [`Region`](super::Region) element indices and byte runs.

use std::iter::FusedIterator;

use crate::array::ArrayIndices;

use super::Region;

/// An iterator over the element indices of a region, in row-major order
/// (the last axis varies fastest).
///
/// Works like an odometer: the index tuple for the next element is kept and
/// incremented on the rightmost axis, carrying leftwards whenever an axis
/// wraps back to the region offset.
pub struct IndexIter {
    /// The index tuple to yield next. [`None`] once exhausted.
    next: Option<ArrayIndices>,
    offset: ArrayIndices,
    end: ArrayIndices,
    remaining: u64,
}

impl IndexIter {
    pub(crate) fn new(region: &Region) -> Self {
        let next = if region.is_empty() {
            None
        } else {
            Some(region.offset().to_vec())
        };
        Self {
            next,
            offset: region.offset().to_vec(),
            end: region.end(),
            remaining: region.num_elements(),
        }
    }
}

impl Iterator for IndexIter {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut bumped = current.clone();
        for axis in (0..bumped.len()).rev() {
            bumped[axis] += 1;
            if bumped[axis] < self.end[axis] {
                self.next = Some(bumped);
                break;
            }
            bumped[axis] = self.offset[axis];
        }
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexIter {}

impl FusedIterator for IndexIter {}

/// An iterator over the byte runs of a region within a flat row-major
/// buffer: `(byte offset, byte length)` pairs, each contiguous in the
/// buffer, in row-major order.
///
/// Trailing axes that the region spans completely fold into a single run,
/// so a region covering the whole buffer yields one run and a row-aligned
/// region yields one run per row. Byte offsets are computed from the
/// buffer's row-major strides.
pub struct ByteRuns {
    run_starts: IndexIter,
    /// Byte stride of each axis in the enclosing buffer.
    strides: Vec<usize>,
    run_bytes: usize,
}

impl ByteRuns {
    /// `region` must fit within `array_shape`; checked by
    /// [`Region::byte_runs`](super::Region::byte_runs).
    pub(crate) fn new(region: &Region, array_shape: &[u64], element_size: usize) -> Self {
        let rank = region.rank();

        let mut strides = vec![element_size; rank];
        for axis in (1..rank).rev() {
            strides[axis - 1] = strides[axis] * usize::try_from(array_shape[axis]).unwrap();
        }

        // Fold trailing axes into the run while the region spans them fully
        let mut run_elements: u64 = 1;
        let mut outer = rank;
        for axis in (0..rank).rev() {
            run_elements *= region.shape()[axis];
            outer = axis;
            if region.offset()[axis] != 0 || region.shape()[axis] != array_shape[axis] {
                break;
            }
        }

        let mut starts_shape = region.shape().to_vec();
        for len in &mut starts_shape[outer..] {
            *len = 1;
        }
        let starts =
            unsafe { Region::new_unchecked(region.offset().to_vec(), starts_shape) };

        Self {
            run_starts: starts.iter_indices(),
            strides,
            run_bytes: usize::try_from(run_elements).unwrap() * element_size,
        }
    }
}

impl Iterator for ByteRuns {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.run_starts.next().map(|indices| {
            let offset = std::iter::zip(&indices, &self.strides)
                .map(|(index, stride)| usize::try_from(*index).unwrap() * stride)
                .sum();
            (offset, self.run_bytes)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.run_starts.size_hint()
    }
}

impl ExactSizeIterator for ByteRuns {}

impl FusedIterator for ByteRuns {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_iter_row_major() {
        let indices: Vec<_> = Region::from_ranges([0..2, 3..5]).iter_indices().collect();
        assert_eq!(
            indices,
            vec![vec![0, 3], vec![0, 4], vec![1, 3], vec![1, 4]]
        );
    }

    #[test]
    fn index_iter_carries_across_axes() {
        let mut iter = Region::from_ranges([0..1, 1..3, 0..2]).iter_indices();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some(vec![0, 1, 0]));
        assert_eq!(iter.next(), Some(vec![0, 1, 1]));
        assert_eq!(iter.next(), Some(vec![0, 2, 0]));
        assert_eq!(iter.next(), Some(vec![0, 2, 1]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn index_iter_empty() {
        let mut iter = Region::from_ranges([0..2, 4..4]).iter_indices();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn byte_runs_whole_buffer() {
        let runs: Vec<_> = Region::whole(vec![3, 4]).byte_runs(&[3, 4], 1).collect();
        assert_eq!(runs, vec![(0, 12)]);
    }

    #[test]
    fn byte_runs_row_aligned() {
        // adjacent full rows fold into a single run
        let runs: Vec<_> = Region::from_ranges([1..3, 0..4]).byte_runs(&[3, 4], 1).collect();
        assert_eq!(runs, vec![(4, 8)]);
    }

    #[test]
    fn byte_runs_inner_window() {
        let runs: Vec<_> = Region::from_ranges([2..4, 1..3]).byte_runs(&[4, 3], 1).collect();
        assert_eq!(runs, vec![(7, 2), (10, 2)]);
    }

    #[test]
    fn byte_runs_element_size() {
        let runs: Vec<_> = Region::from_ranges([1..2, 0..3]).byte_runs(&[2, 3], 4).collect();
        assert_eq!(runs, vec![(12, 12)]);
    }

    #[test]
    fn byte_runs_3d() {
        let region = Region::from_ranges([0..2, 1..2, 0..2]);
        let runs: Vec<_> = region.byte_runs(&[2, 2, 2], 1).collect();
        assert_eq!(runs, vec![(2, 2), (6, 2)]);
    }
}
