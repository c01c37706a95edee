//! OAuth token lifecycle for the Salesforce backend.
//!
//! One `TokenManager` per adapter owns the only copy of the access token:
//! fetched on first use, reused while valid, refetched once stale. Concurrent
//! callers that find the token stale wait on a single in-flight fetch.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::{TokenError, TokenResponse};
use crate::traits::{StorageError, StorageResult};

/// Refresh this long before the recorded expiry.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token response carries no `expires_in`.
pub const TOKEN_DEFAULT_TTL_SECS: i64 = 60 * 60;

/// Source of "now"; swapped out in tests to move through token lifetimes.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Access token plus the instance it is valid for. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthToken {
    pub access_token: String,
    pub instance_url: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

pub struct TokenManager {
    client: Client,
    login_url: String,
    client_id: String,
    client_secret: String,
    cache: RwLock<Option<OAuthToken>>,
    clock: Clock,
}

impl TokenManager {
    pub fn new(client: Client, login_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            client,
            login_url: login_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            cache: RwLock::new(None),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Drop the cached token so the next call fetches a fresh one.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid token, fetching one if none is cached or the cached one is stale.
    pub async fn authenticate(&self) -> StorageResult<OAuthToken> {
        // Fast path
        {
            let cache = self.cache.read().await;
            if let Some(token) = cache.as_ref() {
                if token.is_valid_at((self.clock)()) {
                    return Ok(token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cache.as_ref() {
            if token.is_valid_at((self.clock)()) {
                return Ok(token.clone());
            }
        }

        let token = self.fetch().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    async fn fetch(&self) -> StorageResult<OAuthToken> {
        let url = format!("{}/services/oauth2/token", self.login_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                StorageError::Authentication(format!("Token request to {} failed: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TokenError>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            warn!(status = %status, "Salesforce token request rejected");
            return Err(StorageError::Authentication(format!(
                "Token request rejected ({}): {}",
                status, detail
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            StorageError::Authentication(format!("Failed to parse token response: {}", e))
        })?;

        let ttl = body
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(TOKEN_DEFAULT_TTL_SECS);
        let expires_at = (self.clock)() + Duration::seconds(ttl);

        debug!(
            instance_url = %body.instance_url,
            expires_at = %expires_at,
            "Fetched Salesforce access token"
        );

        Ok(OAuthToken {
            access_token: body.access_token,
            instance_url: body.instance_url.trim_end_matches('/').to_string(),
            expires_at,
        })
    }
}
