//! Durable key/value storage backends.
//!
//! The session store persists its fields through the `StorageBackend` trait,
//! keeping the session logic independent of where the bytes actually live.
//! `FileBackend` is the production implementation (one file per key under
//! the application data directory); `MemoryBackend` backs tests and
//! embedders that do not want sessions to outlive the process.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileBackend;
pub use memory::MemoryBackend;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt stored value: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable key/value store for string values.
///
/// Writes to a single key are atomic: a reader never observes a torn value
/// for one key. Nothing is guaranteed across keys.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the value for `key`. A missing key is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write the value for `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
