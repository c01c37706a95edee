//! Shared implementation for bucket-style backends (S3, Firebase Storage).
//!
//! Both talk to their bucket through `object_store`; they differ only in how the
//! store and its URL signer are built. The object key doubles as the file id, and
//! records are rebuilt from object metadata, so no side index is kept. The caller's
//! filename travels as a user metadata attribute because keys hold a sanitized copy.

use crate::keys::{expiry_after, filename_from_key, generate_object_key, is_safe_id};
use crate::traits::{StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use deckdrop_core::{FileRecord, UploadResult};
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectMeta, ObjectStore, ObjectStoreExt,
    PutOptions, PutPayload, Result as ObjectResult,
};
use std::path::Path;
use std::sync::Arc;

/// Longest lifetime a V4 / GCS signature may carry.
pub const MAX_PRESIGN_DAYS: i64 = 7;

/// User metadata key (`x-amz-meta-filename` / `x-goog-meta-filename`)
const FILENAME_ATTRIBUTE: &str = "filename";

fn filename_attribute() -> Attribute {
    Attribute::Metadata(FILENAME_ATTRIBUTE.into())
}

/// Produces time-limited GET URLs for objects.
#[async_trait]
pub trait UrlPresigner: Send + Sync {
    async fn presign_get(
        &self,
        location: &ObjectPath,
        expires_in: std::time::Duration,
    ) -> StorageResult<String>;
}

pub struct ObjectBackend {
    store: Arc<dyn ObjectStore>,
    presigner: Arc<dyn UrlPresigner>,
    backend: StorageBackend,
    /// `s3` or `gs`, used for `original_path`
    scheme: &'static str,
    bucket: String,
    prefix: String,
    retention: Duration,
}

impl ObjectBackend {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        presigner: Arc<dyn UrlPresigner>,
        backend: StorageBackend,
        scheme: &'static str,
        bucket: String,
        prefix: String,
        retention: Duration,
    ) -> Self {
        Self {
            store,
            presigner,
            backend,
            scheme,
            bucket,
            prefix: prefix.trim_matches('/').to_string(),
            retention,
        }
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.backend
    }

    /// Signature lifetime for a link created at `now` for a record expiring at `expires_at`.
    fn link_lifetime(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Duration {
        (expires_at - now).min(Duration::days(MAX_PRESIGN_DAYS))
    }

    async fn presign(&self, location: &ObjectPath, lifetime: Duration) -> StorageResult<String> {
        let expires_in = lifetime.to_std().map_err(|_| {
            StorageError::BackendError(format!("Invalid link lifetime: {}", lifetime))
        })?;
        self.presigner.presign_get(location, expires_in).await
    }

    /// Object metadata plus the filename recorded at upload, if any.
    async fn stat(&self, location: &ObjectPath) -> ObjectResult<(ObjectMeta, Option<String>)> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self.store.get_opts(location, options).await?;
        // Header values must be ASCII, so the name is stored percent-encoded
        let filename = result
            .attributes
            .get(&filename_attribute())
            .and_then(|value| urlencoding::decode(value).ok())
            .map(|name| name.into_owned());
        Ok((result.meta, filename))
    }

    async fn to_record(&self, meta: ObjectMeta, filename: Option<String>) -> StorageResult<FileRecord> {
        let key = meta.location.to_string();
        let created_at = meta.last_modified;
        let expires_at = expiry_after(created_at, self.retention)?;
        let link = self
            .presign(&meta.location, Self::link_lifetime(Utc::now(), expires_at))
            .await?;

        Ok(FileRecord {
            filename: filename.unwrap_or_else(|| filename_from_key(&key)),
            original_path: format!("{}://{}/{}", self.scheme, self.bucket, key),
            file_id: key,
            created_at,
            expires_at,
            size_bytes: Some(meta.size),
            download_url: Some(link),
        })
    }

    fn parse_id(file_id: &str) -> Option<ObjectPath> {
        if !is_safe_id(file_id) {
            return None;
        }
        ObjectPath::parse(file_id).ok()
    }

    pub async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len() as u64;

        let now = Utc::now();
        let key = generate_object_key(&self.prefix, filename, now);
        let location = ObjectPath::from(key.clone());

        let mut attributes = Attributes::new();
        attributes.insert(
            filename_attribute(),
            AttributeValue::from(urlencoding::encode(filename).into_owned()),
        );

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                PutOptions::from(attributes),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let lifetime = Self::link_lifetime(now, expiry_after(now, self.retention)?);
        let link = self.presign(&location, lifetime).await?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(UploadResult {
            success: true,
            file_id: key,
            filename: filename.to_string(),
            backend: self.backend,
            shareable_link: link.clone(),
            download_link: Some(link),
            public_link: None,
            expires_at: now + lifetime,
            crm: None,
        })
    }

    pub async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        let Some(location) = Self::parse_id(file_id) else {
            return Ok(None);
        };

        let (meta, filename) = match self.stat(&location).await {
            Ok(found) => found,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(None),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = %self.backend,
                    key = %file_id,
                    "Object head failed"
                );
                return Err(StorageError::BackendError(e.to_string()));
            }
        };

        if Utc::now() > expiry_after(meta.last_modified, self.retention)? {
            return Ok(None);
        }

        self.to_record(meta, filename).await.map(Some)
    }

    pub async fn list_files(&self, limit: usize) -> StorageResult<Vec<FileRecord>> {
        let prefix = (!self.prefix.is_empty()).then(|| ObjectPath::from(self.prefix.as_str()));
        let now = Utc::now();

        let mut objects: Vec<ObjectMeta> = self
            .store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        objects.retain(|meta| {
            expiry_after(meta.last_modified, self.retention).is_ok_and(|expires_at| now <= expires_at)
        });
        objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        objects.truncate(limit);

        let mut records = Vec::with_capacity(objects.len());
        for meta in objects {
            // Listings carry no attributes; removed between list and stat means skip
            let filename = match self.stat(&meta.location).await {
                Ok((_, filename)) => filename,
                Err(ObjectStoreError::NotFound { .. }) => continue,
                Err(e) => return Err(StorageError::BackendError(e.to_string())),
            };
            records.push(self.to_record(meta, filename).await?);
        }
        Ok(records)
    }

    pub async fn delete_file(&self, file_id: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location =
            Self::parse_id(file_id).ok_or_else(|| StorageError::InvalidKey(file_id.to_string()))?;

        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(file_id.to_string()))
            }
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;
        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                bucket = %self.bucket,
                key = %file_id,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %file_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use object_store::memory::InMemory;

    /// Presigner that encodes the requested lifetime into the URL.
    pub struct FakePresigner;

    #[async_trait]
    impl UrlPresigner for FakePresigner {
        async fn presign_get(
            &self,
            location: &ObjectPath,
            expires_in: std::time::Duration,
        ) -> StorageResult<String> {
            Ok(format!(
                "https://signed.test/{}?expires_in={}",
                location,
                expires_in.as_secs()
            ))
        }
    }

    pub fn in_memory(backend: StorageBackend, retention: Duration) -> (ObjectBackend, Arc<InMemory>) {
        let store = Arc::new(InMemory::new());
        let backend = ObjectBackend::new(
            store.clone(),
            Arc::new(FakePresigner),
            backend,
            "s3",
            "decks".to_string(),
            "presentations".to_string(),
            retention,
        );
        (backend, store)
    }
}
