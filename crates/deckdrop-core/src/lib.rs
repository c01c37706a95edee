//! Deckdrop Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Deckdrop component: segmentation, storage backends, the publishing
//! pipeline and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    CloudinaryConfig, Config, FirebaseConfig, LocalStorageConfig, S3Config, SalesforceConfig,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    CrmObjectChain, FileRecord, Segment, SegmentKind, SegmentationResult, Strategy, UploadResult,
};
pub use storage_types::StorageBackend;
// Note: Storage, StorageError, StorageResult live in deckdrop-storage
