use crate::keys::{expiry_after, generate_file_id, is_safe_id};
use crate::mapping::{FileMapping, MappingEntry};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use deckdrop_core::constants::LOCAL_DOWNLOAD_ROUTE;
use deckdrop_core::{FileRecord, UploadResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
///
/// Files are copied into `storage_path` as `{file_id}{.ext}` and described by a
/// JSON mapping. Links point at the application's own download route.
pub struct LocalStorage {
    storage_path: PathBuf,
    base_url: String,
    retention: Duration,
    mapping: FileMapping,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `storage_path` - Managed directory for stored decks (e.g., "./uploads")
    /// * `mapping_path` - JSON mapping file (e.g., "./uploads/file-mapping.json")
    /// * `base_url` - Base URL the download route is served under (e.g., "http://localhost:3000")
    /// * `retention` - How long a stored deck stays retrievable
    pub async fn new(
        storage_path: impl Into<PathBuf>,
        mapping_path: impl Into<PathBuf>,
        base_url: String,
        retention: Duration,
    ) -> StorageResult<Self> {
        let storage_path = storage_path.into();

        fs::create_dir_all(&storage_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                storage_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            storage_path,
            base_url,
            retention,
            mapping: FileMapping::new(mapping_path),
        })
    }

    /// Locally routed download URL: `{base_url}/api/download/{file_id}`
    fn generate_url(&self, file_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            LOCAL_DOWNLOAD_ROUTE,
            file_id
        )
    }

    fn managed_path(&self, file_id: &str, filename: &str) -> PathBuf {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        self.storage_path.join(format!("{}{}", file_id, ext))
    }

    fn to_record(&self, file_id: &str, entry: MappingEntry, size_bytes: Option<u64>) -> FileRecord {
        FileRecord {
            file_id: file_id.to_string(),
            filename: entry.filename,
            original_path: entry.original_path,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            size_bytes,
            download_url: Some(self.generate_url(file_id)),
        }
    }

    async fn remove_bytes(path: &str) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path, e
            ))),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    #[tracing::instrument(skip(self))]
    async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
        let start = std::time::Instant::now();
        let file_id = generate_file_id();
        let target = self.managed_path(&file_id, filename);

        let size = fs::copy(local_path, &target).await.map_err(|e| {
            tracing::error!(
                error = %e,
                source = %local_path.display(),
                target = %target.display(),
                "Local storage copy failed"
            );
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                target.display(),
                e
            ))
        })?;

        let created_at = Utc::now();
        let expires_at = expiry_after(created_at, self.retention)?;
        let entry = MappingEntry {
            filename: filename.to_string(),
            original_path: target.to_string_lossy().into_owned(),
            created_at,
            expires_at,
        };

        let id = file_id.clone();
        if let Err(e) = self
            .mapping
            .update(move |entries| {
                entries.insert(id, entry);
            })
            .await
        {
            // Don't leave unreferenced bytes behind
            let _ = fs::remove_file(&target).await;
            return Err(e);
        }

        let url = self.generate_url(&file_id);

        tracing::info!(
            file_id = %file_id,
            path = %target.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(UploadResult {
            success: true,
            file_id,
            filename: filename.to_string(),
            backend: StorageBackend::Local,
            shareable_link: url.clone(),
            download_link: Some(url),
            public_link: None,
            expires_at,
            crm: None,
        })
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        if !is_safe_id(file_id) {
            return Ok(None);
        }

        let Some(entry) = self.mapping.get(file_id).await? else {
            return Ok(None);
        };

        if entry.is_expired_at(Utc::now()) {
            tracing::debug!(file_id = %file_id, expires_at = %entry.expires_at, "File expired");
            return Ok(None);
        }

        let size = fs::metadata(&entry.original_path).await.ok().map(|m| m.len());
        Ok(Some(self.to_record(file_id, entry, size)))
    }

    async fn list_files(&self, limit: usize) -> StorageResult<Vec<FileRecord>> {
        let now = Utc::now();
        let mut live: Vec<(String, MappingEntry)> = self
            .mapping
            .load()
            .await?
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .collect();

        live.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        live.truncate(limit);

        let mut records = Vec::with_capacity(live.len());
        for (file_id, entry) in live {
            let size = fs::metadata(&entry.original_path).await.ok().map(|m| m.len());
            records.push(self.to_record(&file_id, entry, size));
        }
        Ok(records)
    }

    async fn delete_file(&self, file_id: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        if !is_safe_id(file_id) {
            return Err(StorageError::InvalidKey(file_id.to_string()));
        }
        let id = file_id.to_string();
        let removed = self
            .mapping
            .update(move |entries| entries.remove(&id))
            .await?
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;

        Self::remove_bytes(&removed.original_path).await?;

        tracing::info!(
            file_id = %file_id,
            path = %removed.original_path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn purge_expired(&self) -> StorageResult<usize> {
        let now = Utc::now();
        let expired = self
            .mapping
            .update(move |entries| {
                let ids: Vec<String> = entries
                    .iter()
                    .filter(|(_, entry)| entry.is_expired_at(now))
                    .map(|(id, _)| id.clone())
                    .collect();
                ids.into_iter()
                    .filter_map(|id| entries.remove(&id).map(|entry| (id, entry)))
                    .collect::<Vec<_>>()
            })
            .await?;

        for (file_id, entry) in &expired {
            if let Err(e) = Self::remove_bytes(&entry.original_path).await {
                tracing::warn!(
                    error = %e,
                    file_id = %file_id,
                    "Failed to remove bytes of expired file"
                );
            }
        }

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Purged expired files");
        }
        Ok(expired.len())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
