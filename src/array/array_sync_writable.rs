use crate::storage::{attributes_key, meta_key, StorageError, WritableStorageTraits};

use super::Array;

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Write the array metadata to the `.zarray` document in the store.
    ///
    /// Called by [`ArrayBuilder::create`](super::ArrayBuilder::create); only
    /// needed directly when rebuilding metadata in a new store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&self.header)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&meta_key(&self.path), &bytes)
    }

    /// Write the user attributes of the array to its `.zattrs` document.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying store error.
    pub fn store_attributes(
        &self,
        attributes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(attributes)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        self.storage.set(&attributes_key(&self.path), &bytes)
    }
}
