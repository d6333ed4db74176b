//! A filesystem store.

use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey, StoreKeys,
    StorePrefix, WritableStorageTraits,
};

use parking_lot::RwLock;
use thiserror::Error;
use walkdir::WalkDir;

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// A synchronous filesystem store.
///
/// Every key maps to one file below the root directory, with the key's `/`
/// separators as directory separators. Readers and writers of the same key
/// through one store instance exclude each other via a per-key lock, so a
/// `get` racing a `set` observes the old or the new value in full.
/// Access from other processes is not coordinated.
#[derive(Debug)]
pub struct FilesystemStore {
    root: PathBuf,
    key_locks: Mutex<HashMap<StoreKey, Arc<RwLock<()>>>>,
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The root path exists and is not a directory.
    #[error("filesystem store root {0} is not a directory")]
    RootNotADirectory(PathBuf),
}

impl FilesystemStore {
    /// Create a new filesystem store rooted at `root`.
    ///
    /// The root directory is created if it does not exist.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `root` names an existing
    /// non-directory or cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, FilesystemStoreCreateError> {
        let root = root.as_ref().to_path_buf();
        if root.exists() && !root.is_dir() {
            return Err(FilesystemStoreCreateError::RootNotADirectory(root));
        }
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            key_locks: Mutex::default(),
        })
    }

    /// The file holding the value of `key`.
    fn key_path(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// The directory holding the subtree of `prefix`.
    fn prefix_path(&self, prefix: &StorePrefix) -> PathBuf {
        self.root.join(prefix.as_str())
    }

    /// The store key of a file below the root.
    fn path_key(&self, path: &Path) -> Result<StoreKey, StorageError> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            StorageError::from(format!("{} lies outside the store root", path.display()))
        })?;
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Ok(StoreKey::new(key)?)
    }

    /// The lock serialising access to `key`, shared by all readers and
    /// writers of the key through this store.
    fn key_lock(&self, key: &StoreKey) -> Arc<RwLock<()>> {
        self.key_locks
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .clone()
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let lock = self.key_lock(key);
        let _guard = lock.read();

        match std::fs::read(self.key_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match std::fs::metadata(self.key_path(key)) {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        let lock = self.key_lock(key);
        let _guard = lock.write();

        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, value)?;
        Ok(())
    }

    fn erase(&self, key: &StoreKey) -> Result<bool, StorageError> {
        let lock = self.key_lock(key);
        let _guard = lock.write();

        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<bool, StorageError> {
        let dir = self.prefix_path(prefix);
        if !dir.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(dir)?;
        Ok(true)
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.list_prefix(&StorePrefix::root())
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let dir = self.prefix_path(prefix);
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let mut keys = StoreKeys::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                keys.push(self.path_key(entry.path())?);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
