//! Salesforce Files storage implementation
//!
//! An upload creates three linked records:
//!
//! 1. a `ContentVersion` carrying the bytes,
//! 2. its parent `ContentDocument`, read back through the version,
//! 3. optionally a `ContentDistribution` that exposes a public link.
//!
//! The distribution is best effort: orgs may disable public links, and the upload
//! still succeeds with the in-org links. File ids are ContentVersion ids.

mod token;
mod types;

pub use token::{Clock, OAuthToken, TokenManager};
pub use types::DistributionLink;

use crate::keys::expiry_after;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use deckdrop_core::{CrmObjectChain, FileRecord, UploadResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use types::{
    ApiError, ContentDistribution, ContentVersion, CreateResponse, NewContentDistribution,
    NewContentVersion, QueryResponse, CONTENT_DISTRIBUTION_FIELDS, CONTENT_VERSION_FIELDS,
};

pub struct SalesforceStorage {
    client: Client,
    tokens: TokenManager,
    api_version: String,
    retention: Duration,
}

impl SalesforceStorage {
    /// Create a new SalesforceStorage instance
    ///
    /// # Arguments
    /// * `login_url` - OAuth host (e.g., "https://login.salesforce.com" or a My Domain URL)
    /// * `client_id` / `client_secret` - Connected App credentials for the client-credentials flow
    /// * `api_version` - REST API version without the `v` (e.g., "59.0")
    /// * `retention` - How long uploaded decks and their public links stay valid
    pub fn new(
        login_url: String,
        client_id: String,
        client_secret: String,
        api_version: String,
        retention: Duration,
    ) -> StorageResult<Self> {
        // Transport defaults only; callers wait until the backend answers or the connection fails
        let client = Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(SalesforceStorage {
            tokens: TokenManager::new(client.clone(), login_url, client_id, client_secret),
            client,
            api_version: api_version.trim_start_matches('v').to_string(),
            retention,
        })
    }

    /// Replace the clock used for token expiry.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.tokens = self.tokens.with_clock(clock);
        self
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    fn data_url(&self, token: &OAuthToken, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            token.instance_url, self.api_version, path
        )
    }

    fn document_link(token: &OAuthToken, document_id: &str) -> String {
        format!(
            "{}/lightning/r/ContentDocument/{}/view",
            token.instance_url, document_id
        )
    }

    fn download_link(token: &OAuthToken, version_id: &str) -> String {
        format!(
            "{}/sfc/servlet.shepherd/version/download/{}",
            token.instance_url, version_id
        )
    }

    /// Salesforce ids are 15 or 18 alphanumeric characters.
    fn is_record_id(id: &str) -> bool {
        matches!(id.len(), 15 | 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Send an authorized request and decode a JSON body.
    ///
    /// A 401 means the session was revoked early; the cached token is dropped so
    /// the next call authenticates again.
    async fn send_json<T: DeserializeOwned>(
        &self,
        token: &OAuthToken,
        request: RequestBuilder,
        action: &str,
    ) -> StorageResult<T> {
        let response = self.send(token, request, action).await?;
        response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to parse {} response: {}", action, e)))
    }

    async fn send(
        &self,
        token: &OAuthToken,
        request: RequestBuilder,
        action: &str,
    ) -> StorageResult<Response> {
        let response = request
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Vec<ApiError>>(&body)
            .ok()
            .and_then(|errors| errors.into_iter().next())
            .map(|err| format!("{}: {}", err.error_code, err.message))
            .unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED => {
                self.tokens.invalidate().await;
                Err(StorageError::Authentication(format!(
                    "Salesforce rejected the session during {}: {}",
                    action, detail
                )))
            }
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(format!("{}: {}", action, detail))),
            _ => Err(StorageError::BackendError(format!(
                "Salesforce {} failed: {} - {}",
                action, status, detail
            ))),
        }
    }

    async fn fetch_version(
        &self,
        token: &OAuthToken,
        version_id: &str,
    ) -> StorageResult<ContentVersion> {
        let request = self
            .client
            .get(self.data_url(token, &format!("sobjects/ContentVersion/{}", version_id)))
            .query(&[("fields", CONTENT_VERSION_FIELDS)]);
        self.send_json(token, request, "ContentVersion read").await
    }

    async fn create_distribution(
        &self,
        token: &OAuthToken,
        version_id: &str,
        name: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<DistributionLink> {
        let body = NewContentDistribution {
            name,
            content_version_id: version_id,
            preferences_allow_view_in_browser: true,
            preferences_link_latest_version_only: true,
            preferences_notify_on_visit: false,
            preferences_password_required: false,
            preferences_allow_original_download: true,
            preferences_expires: true,
            expiry_date: expires_at,
        };
        let created: CreateResponse = self
            .send_json(
                token,
                self.client
                    .post(self.data_url(token, "sobjects/ContentDistribution"))
                    .json(&body),
                "ContentDistribution create",
            )
            .await?;

        let distribution: ContentDistribution = self
            .send_json(
                token,
                self.client
                    .get(self.data_url(token, &format!("sobjects/ContentDistribution/{}", created.id)))
                    .query(&[("fields", CONTENT_DISTRIBUTION_FIELDS)]),
                "ContentDistribution read",
            )
            .await?;

        let public_url = distribution.distribution_public_url.ok_or_else(|| {
            StorageError::BackendError("ContentDistribution has no public URL".to_string())
        })?;

        Ok(DistributionLink {
            id: created.id,
            public_url,
            download_url: distribution.content_download_url,
        })
    }

    fn to_record(
        &self,
        token: &OAuthToken,
        version_id: &str,
        version: ContentVersion,
        now: DateTime<Utc>,
    ) -> Option<FileRecord> {
        let created_at = version.created_date.unwrap_or(now);
        let expires_at = expiry_after(created_at, self.retention).ok()?;
        if now > expires_at {
            return None;
        }
        Some(FileRecord {
            file_id: version_id.to_string(),
            filename: version
                .path_on_client
                .or(version.title)
                .unwrap_or_else(|| version_id.to_string()),
            original_path: Self::document_link(token, &version.content_document_id),
            created_at,
            expires_at,
            size_bytes: version.content_size,
            download_url: Some(Self::download_link(token, version_id)),
        })
    }
}

#[async_trait]
impl Storage for SalesforceStorage {
    #[tracing::instrument(skip(self), fields(backend = "salesforce"))]
    async fn upload_file(&self, local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len();

        let token = self.tokens.authenticate().await?;

        // 1. ContentVersion with the file bytes
        let new_version = NewContentVersion {
            title: filename,
            path_on_client: filename,
            version_data: general_purpose::STANDARD.encode(&data),
        };
        let created: CreateResponse = self
            .send_json(
                &token,
                self.client
                    .post(self.data_url(&token, "sobjects/ContentVersion"))
                    .json(&new_version),
                "ContentVersion create",
            )
            .await
            .map_err(|e| match e {
                StorageError::BackendError(msg) | StorageError::NotFound(msg) => {
                    StorageError::UploadFailed(msg)
                }
                other => other,
            })?;
        let version_id = created.id;

        // 2. Parent ContentDocument and canonical metadata
        let version = self
            .fetch_version(&token, &version_id)
            .await
            .map_err(|e| match e {
                StorageError::BackendError(msg) | StorageError::NotFound(msg) => {
                    StorageError::UploadFailed(msg)
                }
                other => other,
            })?;

        // 3. Public link, best effort
        let expires_at = expiry_after(Utc::now(), self.retention)?;
        let distribution = match self
            .create_distribution(&token, &version_id, filename, expires_at)
            .await
        {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    version_id = %version_id,
                    "ContentDistribution unavailable, continuing without public link"
                );
                None
            }
        };

        tracing::info!(
            version_id = %version_id,
            document_id = %version.content_document_id,
            public_link = distribution.is_some(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Salesforce upload successful"
        );

        let (distribution_id, public_link, distribution_download_url) = match distribution {
            Some(link) => (Some(link.id), Some(link.public_url), link.download_url),
            None => (None, None, None),
        };
        Ok(UploadResult {
            success: true,
            file_id: version_id.clone(),
            filename: filename.to_string(),
            backend: StorageBackend::Crm,
            shareable_link: Self::document_link(&token, &version.content_document_id),
            download_link: Some(Self::download_link(&token, &version_id)),
            public_link: public_link.clone(),
            expires_at,
            crm: Some(CrmObjectChain {
                version_id,
                document_id: version.content_document_id,
                distribution_url: public_link,
                distribution_id,
                distribution_download_url,
                content_size: version.content_size,
                created_date: version.created_date,
            }),
        })
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        if !Self::is_record_id(file_id) {
            return Ok(None);
        }
        let token = self.tokens.authenticate().await?;
        match self.fetch_version(&token, file_id).await {
            Ok(version) => Ok(self.to_record(&token, file_id, version, Utc::now())),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_files(&self, limit: usize) -> StorageResult<Vec<FileRecord>> {
        let token = self.tokens.authenticate().await?;
        let now = Utc::now();
        let cutoff = now
            .checked_sub_signed(self.retention)
            .ok_or_else(|| StorageError::ConfigError("Retention window precedes the epoch range".to_string()))?
            .format("%Y-%m-%dT%H:%M:%SZ");
        let soql = format!(
            "SELECT Id, {} FROM ContentVersion WHERE IsLatest = true AND CreatedDate >= {} ORDER BY CreatedDate DESC LIMIT {}",
            CONTENT_VERSION_FIELDS,
            cutoff,
            limit.max(1)
        );
        let url = format!(
            "{}?q={}",
            self.data_url(&token, "query"),
            urlencoding::encode(&soql)
        );

        let result: QueryResponse<ContentVersion> = self
            .send_json(&token, self.client.get(url), "ContentVersion query")
            .await?;

        tracing::debug!(total_size = result.total_size, "Queried Salesforce files");

        let mut records: Vec<FileRecord> = result
            .records
            .into_iter()
            .filter_map(|version| {
                let id = version.id.clone()?;
                self.to_record(&token, &id, version, now)
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn delete_file(&self, file_id: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        if !Self::is_record_id(file_id) {
            return Err(StorageError::InvalidKey(file_id.to_string()));
        }
        let token = self.tokens.authenticate().await?;

        let version = self
            .fetch_version(&token, file_id)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => StorageError::NotFound(file_id.to_string()),
                other => other,
            })?;

        self.send(
            &token,
            self.client.delete(self.data_url(
                &token,
                &format!("sobjects/ContentDocument/{}", version.content_document_id),
            )),
            "ContentDocument delete",
        )
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => StorageError::NotFound(file_id.to_string()),
            StorageError::BackendError(msg) => StorageError::DeleteFailed(msg),
            other => other,
        })?;

        tracing::info!(
            version_id = %file_id,
            document_id = %version.content_document_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Salesforce delete successful"
        );
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Crm
    }
}
