//! Local filesystem storage adapter

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{FileStorage, StorageError};

/// File storage on the local filesystem via tokio::fs
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

#[async_trait]
impl FileStorage for FsStorage {
    async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let copy_error = |e: std::io::Error| {
            if e.kind() == ErrorKind::NotFound && !from.exists() {
                StorageError::NotFound(from.display().to_string())
            } else {
                StorageError::CopyFailed {
                    from: from.display().to_string(),
                    to: to.display().to_string(),
                    message: e.to_string(),
                }
            }
        };

        ensure_parent(to).await.map_err(copy_error)?;
        fs::copy(from, to).await.map_err(copy_error)?;
        Ok(())
    }

    async fn delete(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if idempotent {
                    Ok(())
                } else {
                    Err(StorageError::NotFound(path.display().to_string()))
                }
            }
            Err(e) => Err(StorageError::DeleteFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
            _ => StorageError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        })
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let write_error = |e: std::io::Error| StorageError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        ensure_parent(path).await.map_err(write_error)?;
        fs::write(path, data).await.map_err(write_error)
    }

    async fn size(&self, path: &Path) -> Result<u64, StorageError> {
        fs::metadata(path)
            .await
            .map(|m| m.len())
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
                _ => StorageError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copy_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("capture.wav");
        let to = dir.path().join("cache/nested/voice_1.wav");
        std::fs::write(&from, b"RIFF").unwrap();

        FsStorage::new().copy(&from, &to).await.unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), b"RIFF");
        assert!(from.exists());
    }

    #[tokio::test]
    async fn copy_missing_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = FsStorage::new()
            .copy(&dir.path().join("gone.wav"), &dir.path().join("out.wav"))
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_respects_idempotent_flag() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.wav");
        let storage = FsStorage::new();

        assert!(storage.delete(&missing, true).await.is_ok());
        assert!(matches!(
            storage.delete(&missing, false).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn write_read_size_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("voice_2.wav");
        let storage = FsStorage::new();

        assert!(!storage.exists(&path).await);
        storage.write(&path, &[1u8; 1200]).await.unwrap();
        assert!(storage.exists(&path).await);
        assert_eq!(storage.size(&path).await.unwrap(), 1200);
        assert_eq!(storage.read(&path).await.unwrap().len(), 1200);

        storage.delete(&path, false).await.unwrap();
        assert!(!storage.exists(&path).await);
    }
}
