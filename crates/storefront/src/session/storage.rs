//! Key-value persistence for the session.
//!
//! The session is stored as two entries, [`TOKEN_KEY`] and [`USER_KEY`], that
//! are always written and cleared together by the session store.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Entry holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Entry holding the JSON user profile.
pub const USER_KEY: &str = "user";

/// Session persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
}

/// Where the session token and profile are kept between runs.
pub trait SessionStorage: Send + Sync + 'static {
    /// Read an entry; `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or replace an entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete an entry. Deleting a missing entry succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry exists but cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStorage
// =============================================================================

/// One file per entry inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a partially written entry.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

fn io_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        std::fs::write(&tmp, value).map_err(|e| io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }

    /// Whether any entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
