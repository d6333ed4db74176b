//! A Rust library for chunked, compressed, N-dimensional array storage.
//!
//! A `gridstore` [`Array`](crate::array::Array) is a single logical
//! multidimensional array of numeric values whose data is transparently
//! sharded into fixed-size rectangular chunks.
//! Each chunk is persisted as an independently compressed, byte-ordered blob
//! in a key-value [store](crate::storage).
//! Clients read and write arbitrary axis-aligned [regions](crate::region) of
//! the logical array; the engine translates each region into the set of
//! touched chunks, decodes only those, performs partial copies in and out of
//! caller-supplied flat buffers, then re-encodes the affected chunks.
//!
//! Arrays are compatible with the Zarr storage specification version 2:
//! array metadata lives in a `.zarray` JSON document and chunks are keyed by
//! their grid indices joined with a `.` (flat) or `/` (nested) separator.
//! Arrays written before the `dimension_separator` metadata field existed do
//! not record their key layout; opening such an array probes the store to
//! detect it.
//!
//! The best docs to start with are [`array::Array`] and [`storage::store`].
//!
//! ## Example
//! ```
//! # use std::sync::Arc;
//! use gridstore::array::{ArrayBuilder, DataType, FillValue};
//! use gridstore::region::Region;
//! use gridstore::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(
//!     vec![8, 8],
//!     vec![4, 4],
//!     DataType::Float32,
//!     FillValue::from(0f32),
//! )
//! .create(store, "/array")?;
//!
//! array.store_region_elements::<f32>(
//!     &Region::from_ranges([3..5, 3..5]),
//!     vec![1.0, 2.0, 3.0, 4.0],
//! )?;
//! let corner = array.retrieve_region_elements::<f32>(&Region::from_ranges([4..6, 4..6]))?;
//! assert_eq!(corner, vec![4.0, 0.0, 0.0, 0.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//! The engine is synchronous: each call returns when all chunk I/O has
//! completed. Writes to the same chunk are serialised by a per-chunk-key
//! lock, so region writes touching disjoint chunks may proceed in parallel.
//! A write touching multiple chunks is **not** atomic as a whole.
//! Concurrent modification of one store from multiple processes is
//! undefined; coordinate writers externally.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod config;
pub mod metadata;
pub mod region;
pub mod storage;

/// Re-export [`bytemuck`].
pub use bytemuck;

/// Re-export [`serde_json`].
pub use serde_json;
