//! Cloudinary storage implementation
//!
//! Decks are uploaded as private `raw` resources. Links are signed
//! `raw/download` URLs carrying `expires_at`, so they stop working when the record
//! does. Lookups and listing use the Admin API with basic auth. The caller's
//! filename rides along as `filename` in the resource's custom context.

use crate::keys::{expiry_after, filename_from_key, generate_object_key, is_safe_id};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use deckdrop_core::{FileRecord, UploadResult};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;

const DELIVERY_TYPE: &str = "private";
const RESOURCE_TYPE: &str = "raw";
/// Admin API page size ceiling
const MAX_RESULTS: usize = 500;

/// Cloudinary API signature: SHA-1 over `k=v` pairs sorted by key and joined
/// with `&`, followed by the API secret.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomContext {
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceContext {
    #[serde(default)]
    custom: CustomContext,
}

#[derive(Debug, Deserialize)]
struct Resource {
    public_id: String,
    #[serde(default)]
    bytes: Option<u64>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    context: Option<ResourceContext>,
}

/// `key=value` context entry; `=` and `|` inside values must be escaped.
fn context_entry(key: &str, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '=' | '|' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("{}={}", key, escaped)
}

#[derive(Debug, Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudinaryStorage {
    client: Client,
    api_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    retention: Duration,
}

impl CloudinaryStorage {
    /// Create a new CloudinaryStorage instance
    ///
    /// # Arguments
    /// * `api_url` - API base (e.g., "https://api.cloudinary.com"); overridable for tests
    /// * `cloud_name` / `api_key` / `api_secret` - account credentials
    /// * `folder` - Folder prefix for public ids (e.g., "presentations")
    /// * `retention` - How long uploaded decks stay retrievable
    pub fn new(
        api_url: String,
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: String,
        retention: Duration,
    ) -> StorageResult<Self> {
        // Transport defaults only; callers wait until the backend answers or the connection fails
        let client = Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(CloudinaryStorage {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder: folder.trim_matches('/').to_string(),
            retention,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1_1/{}/{}", self.api_url, self.cloud_name, path)
    }

    /// Signed, expiring download link for a private raw resource.
    pub fn download_url(&self, public_id: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let mut params = vec![
            ("public_id", public_id.to_string()),
            ("type", DELIVERY_TYPE.to_string()),
            ("timestamp", now.timestamp().to_string()),
            ("expires_at", expires_at.timestamp().to_string()),
        ];
        let signature = sign_params(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.endpoint(&format!("{}/download", RESOURCE_TYPE)), query)
    }

    fn to_record(&self, resource: Resource, now: DateTime<Utc>) -> Option<FileRecord> {
        // No representable expiry means nothing to sign a link for
        let expires_at = expiry_after(resource.created_at, self.retention).ok()?;
        if now > expires_at {
            return None;
        }
        let filename = resource
            .context
            .and_then(|context| context.custom.filename)
            .unwrap_or_else(|| filename_from_key(&resource.public_id));
        Some(FileRecord {
            filename,
            original_path: format!(
                "cloudinary://{}/{}/{}/{}",
                self.cloud_name, RESOURCE_TYPE, DELIVERY_TYPE, resource.public_id
            ),
            download_url: Some(self.download_url(&resource.public_id, expires_at, now)),
            file_id: resource.public_id,
            created_at: resource.created_at,
            expires_at,
            size_bytes: resource.bytes,
        })
    }

    async fn error_from(response: Response, action: &str) -> StorageError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = format!("Cloudinary {} failed: {} - {}", action, status, error_text);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Authentication(message),
            _ => StorageError::BackendError(message),
        }
    }
}

#[async_trait]
impl Storage for CloudinaryStorage {
    #[tracing::instrument(skip(self), fields(backend = "cloudinary"))]
    async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len() as u64;

        let now = Utc::now();
        let public_id = generate_object_key(&self.folder, filename, now);
        let signed = vec![
            ("context", context_entry("filename", filename)),
            ("public_id", public_id.clone()),
            ("type", DELIVERY_TYPE.to_string()),
            ("timestamp", now.timestamp().to_string()),
        ];
        let signature = sign_params(&signed, &self.api_secret);

        let mut form = Form::new()
            .part("file", Part::bytes(data).file_name(filename.to_string()))
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint(&format!("{}/upload", RESOURCE_TYPE)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let err = match Self::error_from(response, "upload").await {
                StorageError::BackendError(msg) => StorageError::UploadFailed(msg),
                other => other,
            };
            tracing::error!(
                error = %err,
                public_id = %public_id,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Cloudinary upload failed"
            );
            return Err(err);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to parse upload response: {}", e)))?;

        let expires_at = expiry_after(now, self.retention)?;
        let link = self.download_url(&uploaded.public_id, expires_at, now);

        tracing::info!(
            public_id = %uploaded.public_id,
            size_bytes = uploaded.bytes.unwrap_or(size),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(UploadResult {
            success: true,
            file_id: uploaded.public_id,
            filename: filename.to_string(),
            backend: StorageBackend::CdnMedia,
            shareable_link: link.clone(),
            download_link: Some(link),
            public_link: None,
            expires_at,
            crm: None,
        })
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        if !is_safe_id(file_id) {
            return Ok(None);
        }

        let response = self
            .client
            .get(self.endpoint(&format!(
                "resources/{}/{}/{}",
                RESOURCE_TYPE, DELIVERY_TYPE, file_id
            )))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response, "resource lookup").await);
        }

        let resource: Resource = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to parse resource: {}", e)))?;

        Ok(self.to_record(resource, Utc::now()))
    }

    async fn list_files(&self, limit: usize) -> StorageResult<Vec<FileRecord>> {
        let max_results = limit.clamp(1, MAX_RESULTS).to_string();
        let prefix = format!("{}/", self.folder);
        let response = self
            .client
            .get(self.endpoint(&format!("resources/{}/{}", RESOURCE_TYPE, DELIVERY_TYPE)))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&[
                ("prefix", prefix.as_str()),
                ("max_results", max_results.as_str()),
                ("context", "true"),
            ])
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "resource listing").await);
        }

        let listing: ResourceList = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to parse listing: {}", e)))?;

        let now = Utc::now();
        let mut records: Vec<FileRecord> = listing
            .resources
            .into_iter()
            .filter_map(|resource| self.to_record(resource, now))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn delete_file(&self, file_id: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        if !is_safe_id(file_id) {
            return Err(StorageError::InvalidKey(file_id.to_string()));
        }

        let mut params = vec![
            ("public_id", file_id.to_string()),
            ("type", DELIVERY_TYPE.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign_params(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));

        let response = self
            .client
            .post(self.endpoint(&format!("{}/destroy", RESOURCE_TYPE)))
            .form(&params)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "destroy").await);
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Failed to parse destroy response: {}", e)))?;

        match destroyed.result.as_str() {
            "ok" => {
                tracing::info!(
                    public_id = %file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Cloudinary delete successful"
                );
                Ok(())
            }
            "not found" => Err(StorageError::NotFound(file_id.to_string())),
            other => Err(StorageError::DeleteFailed(format!(
                "Unexpected destroy result: {}",
                other
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::CdnMedia
    }
}
