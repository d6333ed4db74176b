//! Key-value storage for arrays.
//!
//! An array persists its metadata and chunks through an abstract key-value
//! store: keys are `/`-separated strings ([`StoreKey`]) and values are opaque
//! byte blobs. The [`MemoryStore`](store::MemoryStore) and
//! [`FilesystemStore`](store::FilesystemStore) implementations are provided;
//! any type implementing the storage traits can back an array.
//!
//! The [array engine](crate::array) never interprets key structure; chunk
//! keys are formed by [`crate::array::chunk_key`] and resolved against a
//! [`NodePath`] with [`data_key`].

pub mod store;
mod store_key;
mod store_prefix;

use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError};

/// The value of a store key, or [`None`] if the key is not present.
pub type MaybeBytes = Option<Vec<u8>>;

/// Readable storage traits.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value (bytes) associated with a given [`StoreKey`].
    ///
    /// Returns [`None`] if the key is not found.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Return the size in bytes of the value at `key`.
    ///
    /// Returns [`None`] if the key is not found.
    /// This is an existence probe; implementations should avoid reading the
    /// value where possible.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;
}

/// Writable storage traits.
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`, overwriting any existing value.
    ///
    /// Concurrent readers of `key` through the same store must observe
    /// either the previous value or `value` in full, never a mixture.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError>;

    /// Erase the value at `key`, returning true if it existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase(&self, key: &StoreKey) -> Result<bool, StorageError>;

    /// Erase all values with keys under `prefix`, returning true if any existed.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<bool, StorageError>;
}

/// Listable storage traits.
pub trait ListableStorageTraits: Send + Sync {
    /// Retrieve all [`StoreKeys`] in the store, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list(&self) -> Result<StoreKeys, StorageError>;

    /// Retrieve all [`StoreKeys`] with a given [`StorePrefix`], sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying error with the store.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;
}

/// Readable and writable storage traits.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T: ?Sized + ReadableStorageTraits + WritableStorageTraits> ReadableWritableStorageTraits
    for T
{
}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error("invalid node path {0}")]
    NodePathError(#[from] NodePathError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// The path of an array node in a store.
///
/// A node path is `/`, or a `/`-separated sequence of non-empty names with a
/// leading `/` and no trailing `/` (e.g. `/measurements/temperature`).
#[derive(Clone, Eq, PartialEq, Hash, Debug, derive_more::Display)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, derive_more::From, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid according to [`NodePath::validate()`].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node path.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice of the underlying path [`String`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a node path.
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path == "/"
            || (path.starts_with('/')
                && !path.ends_with('/')
                && !path[1..].split('/').any(str::is_empty))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

/// Return the key of a metadata document named `metadata_file_name` under a node path.
#[must_use]
fn meta_key_any(path: &NodePath, metadata_file_name: &str) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        unsafe { StoreKey::new_unchecked(metadata_file_name.to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        unsafe { StoreKey::new_unchecked(format!("{path}/{metadata_file_name}")) }
    }
}

/// Return the array metadata key (`.zarray`) given a node path.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zarray")
}

/// Return the user attributes key (`.zattrs`) given a node path.
#[must_use]
pub fn attributes_key(path: &NodePath) -> StoreKey {
    meta_key_any(path, ".zattrs")
}

/// Return the data key given a node path and an encoded chunk key.
#[must_use]
pub fn data_key(path: &NodePath, chunk_key: &str) -> StoreKey {
    let path = path.as_str();
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        unsafe { StoreKey::new_unchecked(chunk_key.to_string()) }
    } else {
        unsafe { StoreKey::new_unchecked(format!("{path}/{chunk_key}")) }
    }
}

/// Return the prefix of all keys under a node path.
#[must_use]
pub fn node_prefix(path: &NodePath) -> StorePrefix {
    let path = path.as_str();
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        StorePrefix::root()
    } else {
        unsafe { StorePrefix::new_unchecked(format!("{path}/")) }
    }
}
