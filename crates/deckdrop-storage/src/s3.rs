use crate::object_backend::{ObjectBackend, UrlPresigner};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Duration;
use deckdrop_core::{FileRecord, UploadResult};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Result as ObjectResult;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
impl UrlPresigner for AmazonS3 {
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

/// S3 storage implementation
///
/// Decks are written under `{key_prefix}/` and shared through presigned GET URLs.
pub struct S3Storage {
    inner: ObjectBackend,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `key_prefix` - Prefix for object keys (e.g., "presentations")
    /// * `retention` - How long uploaded decks stay retrievable
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        key_prefix: String,
        retention: Duration,
    ) -> StorageResult<Self> {
        // Credentials come from the usual AWS_* environment variables
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );

        Ok(S3Storage {
            inner: ObjectBackend::new(
                store.clone(),
                store,
                StorageBackend::ObjectStore,
                "s3",
                bucket,
                key_prefix,
                retention,
            ),
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self), fields(backend = "s3"))]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_against_custom_endpoint() {
        let storage = S3Storage::new(
            "decks".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
            "presentations".to_string(),
            Duration::days(7),
        )
        .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::ObjectStore);
    }
}
