//! `StorageBackend` trait: the single-blob key/value interface the session
//! store persists through.

use crate::error::StorageError;

/// Backend-agnostic blob storage.
///
/// Each key maps to one serialized string. Implementations are synchronous:
/// every call completes before returning.
pub trait StorageBackend: Send + Sync {
    /// Read the blob under `key`. `Ok(None)` when nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the blob under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
