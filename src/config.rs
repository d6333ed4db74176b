//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::array::chunk_key::ChunkKeySeparator;

/// Global configuration options for the `gridstore` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with
/// [`global_config_mut`].
///
/// ## Chunk Key Separator Default
/// > default: [`ChunkKeySeparator::Dot`]
///
/// The chunk key separator assumed for an array whose metadata omits
/// `dimension_separator` and whose store holds no chunks at open time.
/// An array in that state has an unknown key layout; reads and writes fall
/// back to this separator.
#[derive(Debug)]
pub struct Config {
    chunk_key_separator_default: ChunkKeySeparator,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_key_separator_default: ChunkKeySeparator::Dot,
        }
    }
}

impl Config {
    /// Get the [chunk key separator default](#chunk-key-separator-default) configuration.
    #[must_use]
    pub fn chunk_key_separator_default(&self) -> ChunkKeySeparator {
        self.chunk_key_separator_default
    }

    /// Set the [chunk key separator default](#chunk-key-separator-default) configuration.
    pub fn set_chunk_key_separator_default(&mut self, separator: ChunkKeySeparator) {
        self.chunk_key_separator_default = separator;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global `gridstore` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global `gridstore` configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
