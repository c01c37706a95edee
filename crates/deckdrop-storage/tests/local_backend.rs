//! End-to-end checks of the local backend through the factory.

#![cfg(feature = "storage-local")]

use deckdrop_core::{AppError, Config, ErrorMetadata};
use deckdrop_storage::{create_storage, StorageBackend, StorageError};
use tempfile::tempdir;

#[tokio::test]
async fn publish_lookup_delete_cycle() {
    let store_dir = tempdir().unwrap();
    let src_dir = tempdir().unwrap();
    let source = src_dir.path().join("quarterly.md");
    std::fs::write(&source, "# Quarterly\n\n---\n\n## Numbers\n").unwrap();

    let config = Config::local(store_dir.path(), "https://decks.example.com/");
    let storage = create_storage(&config).await.unwrap();

    let upload = storage.upload_file(&source, "quarterly.md").await.unwrap();
    assert!(upload.success);
    assert_eq!(upload.backend, StorageBackend::Local);
    assert_eq!(
        upload.shareable_link,
        format!("https://decks.example.com/api/download/{}", upload.file_id)
    );

    // The caller's file is copied, not moved
    assert!(source.exists());

    let record = storage.get_file(&upload.file_id).await.unwrap().unwrap();
    assert_eq!(record.filename, "quarterly.md");
    assert!(record.original_path.starts_with(&*store_dir.path().to_string_lossy()));
    assert_eq!(record.expires_at, upload.expires_at);

    // The mapping survives a fresh backend instance over the same directory
    let reopened = create_storage(&config).await.unwrap();
    let listed = reopened.list_files(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_id, upload.file_id);

    reopened.delete_file(&upload.file_id).await.unwrap();
    assert!(storage.get_file(&upload.file_id).await.unwrap().is_none());

    let err = storage.delete_file(&upload.file_id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    let app: AppError = err.into();
    assert_eq!(app.http_status_code(), 404);
}

#[tokio::test]
async fn upload_of_missing_source_fails() {
    let store_dir = tempdir().unwrap();
    let config = Config::local(store_dir.path(), "http://localhost:3000");
    let storage = create_storage(&config).await.unwrap();

    let err = storage
        .upload_file(&store_dir.path().join("nope.md"), "nope.md")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::UploadFailed(_)));
    assert!(storage.list_files(10).await.unwrap().is_empty());
}
