//! Deckdrop Storage Library
//!
//! This crate provides the storage abstraction and its backends: local
//! filesystem, S3, Cloudinary, Firebase Storage and Salesforce Files.
//!
//! # File ids
//!
//! Each backend picks its own file id and hands it back in `UploadResult::file_id`:
//!
//! - **Local**: 128 random bits, hex encoded
//! - **S3 / Firebase**: the object key, `{prefix}/{unix_millis}-{sanitized filename}`
//! - **Cloudinary**: the public id, same layout as object keys
//! - **Salesforce**: the ContentVersion id
//!
//! Key generation is centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-local")]
pub(crate) mod mapping;
#[cfg(any(feature = "storage-s3", feature = "storage-firebase"))]
pub mod object_backend;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(feature = "storage-firebase")]
pub mod firebase;
#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
#[cfg(feature = "storage-salesforce")]
pub mod salesforce;
pub mod traits;

// Re-export commonly used types
pub use deckdrop_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStorage;
#[cfg(feature = "storage-firebase")]
pub use firebase::FirebaseStorage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(any(feature = "storage-s3", feature = "storage-firebase"))]
pub use object_backend::{ObjectBackend, UrlPresigner};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
#[cfg(feature = "storage-salesforce")]
pub use salesforce::{SalesforceStorage, TokenManager};
pub use traits::{Storage, StorageError, StorageResult};
