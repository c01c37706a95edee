//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use deckdrop_core::{AppError, FileRecord, UploadResult};
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: StorageBackend,
        operation: &'static str,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => AppError::NotFound(format!("File not found: {}", id)),
            StorageError::InvalidKey(id) => AppError::InvalidInput(format!("Invalid file id: {}", id)),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
            StorageError::Authentication(msg) => AppError::Authentication(msg),
            unsupported @ StorageError::Unsupported { .. } => {
                AppError::Unsupported(unsupported.to_string())
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (local filesystem, S3, Cloudinary, Firebase Storage,
/// Salesforce Files) implement this trait. Callers hold an `Arc<dyn Storage>`
/// built once by [`create_storage`](crate::create_storage) and never branch on the
/// concrete backend.
///
/// `get_file` returns `Ok(None)` for ids that are unknown or expired, on every
/// backend. Operations a backend cannot offer return
/// [`StorageError::Unsupported`], which callers can tell apart from not-found.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store the file at `local_path` under the display name `filename`.
    ///
    /// The source file is only read. Callers remove their temp copy once this
    /// returns successfully.
    async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult>;

    /// Look up a stored file. `None` when the id is unknown or expired.
    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>>;

    /// Unexpired files, newest first, at most `limit`.
    async fn list_files(&self, _limit: usize) -> StorageResult<Vec<FileRecord>> {
        Err(StorageError::Unsupported {
            backend: self.backend_type(),
            operation: "list_files",
        })
    }

    /// Delete a stored file. Unknown ids are `NotFound`.
    async fn delete_file(&self, _file_id: &str) -> StorageResult<()> {
        Err(StorageError::Unsupported {
            backend: self.backend_type(),
            operation: "delete_file",
        })
    }

    /// Remove expired records and their bytes, returning how many were removed.
    ///
    /// Only backends that keep their own expiry bookkeeping implement this; the
    /// others rely on backend-side retention.
    async fn purge_expired(&self) -> StorageResult<usize> {
        Err(StorageError::Unsupported {
            backend: self.backend_type(),
            operation: "purge_expired",
        })
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
