use crate::object_backend::{ObjectBackend, UrlPresigner};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Duration;
use deckdrop_core::{FileRecord, UploadResult};
use http::Method;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Result as ObjectResult;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
impl UrlPresigner for GoogleCloudStorage {
    async fn presign_get(
        &self,
        location: &ObjectPath,
        expires_in: std::time::Duration,
    ) -> StorageResult<String> {
        let url_result: ObjectResult<_> = self.signed_url(Method::GET, location, expires_in).await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }
}

/// Firebase Storage implementation
///
/// A Firebase Storage bucket is a Google Cloud Storage bucket, so this talks to it
/// through the GCS API with a service account and shares V4 signed URLs.
pub struct FirebaseStorage {
    inner: ObjectBackend,
}

impl FirebaseStorage {
    /// Create a new FirebaseStorage instance
    ///
    /// # Arguments
    /// * `bucket` - Storage bucket (e.g., "my-project.appspot.com")
    /// * `service_account_path` - Service account JSON key; falls back to the
    ///   `GOOGLE_*` environment when absent
    /// * `key_prefix` - Prefix for object keys (e.g., "presentations")
    /// * `retention` - How long uploaded decks stay retrievable
    pub fn new(
        bucket: String,
        service_account_path: Option<String>,
        key_prefix: String,
        retention: Duration,
    ) -> StorageResult<Self> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket.clone());
        if let Some(path) = service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );

        Ok(FirebaseStorage {
            inner: ObjectBackend::new(
                store.clone(),
                store,
                StorageBackend::DocStore,
                "gs",
                bucket,
                key_prefix,
                retention,
            ),
        })
    }
}

#[async_trait]
impl Storage for FirebaseStorage {
    #[tracing::instrument(skip(self), fields(backend = "firebase"))]
    async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
        self.inner.upload_file(local_path, filename).await
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        self.inner.get_file(file_id).await
    }

    async fn list_files(&self, limit: usize) -> StorageResult<Vec<FileRecord>> {
        self.inner.list_files(limit).await
    }

    async fn delete_file(&self, file_id: &str) -> StorageResult<()> {
        self.inner.delete_file(file_id).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
