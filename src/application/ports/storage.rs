//! Local file storage port

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// File storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to copy {from} to {to}: {message}")]
    CopyFailed {
        from: String,
        to: String,
        message: String,
    },

    #[error("Failed to delete {path}: {message}")]
    DeleteFailed { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },
}

/// Port for local file operations on recordings
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Copy `from` to `to`, creating parent directories as needed
    async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Delete a file.
    ///
    /// With `idempotent` set, a missing file is not an error.
    async fn delete(&self, path: &Path, idempotent: bool) -> Result<(), StorageError>;

    async fn exists(&self, path: &Path) -> bool;

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Write `data` to `path`, replacing any existing file
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Size of a file in bytes
    async fn size(&self, path: &Path) -> Result<u64, StorageError>;
}
