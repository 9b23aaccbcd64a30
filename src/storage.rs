//! Key-value storage media for the persisted state record.
//!
//! A medium stores opaque byte records under string keys. Decoding is left
//! to the caller, so a record with unreadable content is reported as a
//! corrupt record rather than a failing medium. Three media are
//! built in:
//!
//! - [`FileStorage`]: one JSON file per key inside a directory.
//! - [`MemoryStorage`]: an in-process map, cheap to clone.
//! - [`DisabledStorage`]: rejects every call, modelling storage that the
//!   host has turned off.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::StorageError;

/// A key-value medium holding opaque records.
///
/// Implementations must be `Send + Sync` so a store can be shared by
/// reference across threads.
pub trait StateStorage: Send + Sync {
    /// Read the record stored under `key`.
    ///
    /// Returns `Ok(None)` when no record exists.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the record stored under `key`.
    fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the record stored under `key`. Removing a missing record is
    /// not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: StateStorage + ?Sized> StateStorage for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Stores each record as `<dir>/<key>.json`.
///
/// Writes are atomic via a temp-rename pattern so a crash mid-write never
/// leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file medium rooted at `dir`.
    ///
    /// The directory does not need to exist yet; it is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory of this medium.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compute the file path for a record key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if `key` is empty or would
    /// escape the storage directory.
    pub fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let escapes = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\'])
            || key.contains('\0');
        if escapes {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.record_path(key)?;
        match fs::read(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            // Never leave a stray temp file next to the record.
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                tracing::debug!(
                    path = %tmp_path.display(),
                    error = %cleanup,
                    "failed to remove temp record"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage medium.
///
/// `Clone` is cheap and clones share the same records, so a test can keep
/// a handle to inspect what a store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.remove(key);
        Ok(())
    }
}

/// A medium that is switched off: every call fails with
/// [`StorageError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStorage;

impl StateStorage for DisabledStorage {
    fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn write(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
