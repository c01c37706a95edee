//! Wire types for the Salesforce REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `POST /services/oauth2/token` response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
    /// Seconds; only some org configurations return it
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Error body of the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewContentVersion<'a> {
    pub title: &'a str,
    pub path_on_client: &'a str,
    /// Base64 file bytes
    pub version_data: String,
}

/// `sobjects/...` create response
#[derive(Debug, Deserialize)]
pub struct CreateResponse {
    pub id: String,
    #[serde(default)]
    pub success: bool,
}

/// Fields requested when re-reading a ContentVersion
pub const CONTENT_VERSION_FIELDS: &str = "ContentDocumentId,Title,PathOnClient,ContentSize,CreatedDate";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentVersion {
    #[serde(default)]
    pub id: Option<String>,
    pub content_document_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub path_on_client: Option<String>,
    #[serde(default)]
    pub content_size: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_sf_datetime")]
    pub created_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewContentDistribution<'a> {
    pub name: &'a str,
    pub content_version_id: &'a str,
    pub preferences_allow_view_in_browser: bool,
    pub preferences_link_latest_version_only: bool,
    pub preferences_notify_on_visit: bool,
    pub preferences_password_required: bool,
    pub preferences_allow_original_download: bool,
    pub preferences_expires: bool,
    pub expiry_date: DateTime<Utc>,
}

pub const CONTENT_DISTRIBUTION_FIELDS: &str = "DistributionPublicUrl,ContentDownloadUrl";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentDistribution {
    #[serde(default)]
    pub distribution_public_url: Option<String>,
    #[serde(default)]
    pub content_download_url: Option<String>,
}

/// Public link pair of a ContentDistribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionLink {
    pub id: String,
    pub public_url: String,
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct QueryResponse<T> {
    #[serde(rename = "totalSize", default)]
    pub total_size: usize,
    #[serde(default)]
    pub records: Vec<T>,
}

/// Error entries returned by the data API
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(rename = "errorCode", default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

/// Salesforce emits `2024-05-01T12:00:00.000+0000`, which is not strict RFC 3339.
pub fn parse_sf_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_sf_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_sf_datetime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_salesforce_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_sf_datetime("2024-05-01T12:00:00.000+0000"), Some(expected));
        assert_eq!(parse_sf_datetime("2024-05-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_sf_datetime("yesterday"), None);
    }

    #[test]
    fn content_version_uses_pascal_case() {
        let body = serde_json::json!({
            "attributes": {"type": "ContentVersion"},
            "ContentDocumentId": "069xx0000000001",
            "Title": "deck.md",
            "ContentSize": 42,
            "CreatedDate": "2024-05-01T12:00:00.000+0000"
        });
        let version: ContentVersion = serde_json::from_value(body).unwrap();
        assert_eq!(version.content_document_id, "069xx0000000001");
        assert_eq!(version.content_size, Some(42));
        assert!(version.created_date.is_some());

        let new = NewContentVersion {
            title: "deck.md",
            path_on_client: "deck.md",
            version_data: "eA==".to_string(),
        };
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["PathOnClient"], "deck.md");
        assert_eq!(json["VersionData"], "eA==");
    }

    #[test]
    fn query_response_of_versions_deserializes() {
        let body = serde_json::json!({
            "totalSize": 1,
            "done": true,
            "records": [{
                "Id": "068xx0000000001AAA",
                "ContentDocumentId": "069xx0000000001AAA",
                "Title": "deck.md"
            }]
        });
        let page: QueryResponse<ContentVersion> = serde_json::from_value(body).unwrap();
        assert_eq!(page.total_size, 1);
        assert_eq!(page.records[0].id.as_deref(), Some("068xx0000000001AAA"));

        let empty: QueryResponse<ContentVersion> =
            serde_json::from_value(serde_json::json!({"totalSize": 0})).unwrap();
        assert!(empty.records.is_empty());
    }
}
