use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StorageBackend;

/// Result of a successful `upload_file` call on any backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: bool,
    pub file_id: String,
    pub filename: String,
    pub backend: StorageBackend,
    /// Link to hand to users; time-limited where the backend supports it
    pub shareable_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    /// Unauthenticated public link (CRM distributions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_link: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm: Option<CrmObjectChain>,
}

/// The three linked remote objects a CRM upload produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmObjectChain {
    pub version_id: String,
    pub document_id: String,
    /// Absent when the org refused to create a public distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,
    /// Direct download URL of the distribution, when the org exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
}

/// Metadata describing one stored file and its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub filename: String,
    /// Managed copy on disk (local) or remote object location
    pub original_path: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl FileRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>) -> FileRecord {
        FileRecord {
            file_id: "abc".to_string(),
            filename: "deck.md".to_string(),
            original_path: "/tmp/abc.md".to_string(),
            created_at: expires_at - Duration::days(7),
            expires_at,
            size_bytes: None,
            download_url: None,
        }
    }

    #[test]
    fn expiry_is_strictly_after_expires_at() {
        let now = Utc::now();
        let rec = record(now);
        assert!(!rec.is_expired_at(now));
        assert!(rec.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn upload_result_serializes_backend_in_kebab_case() {
        let result = UploadResult {
            success: true,
            file_id: "id".to_string(),
            filename: "deck.md".to_string(),
            backend: StorageBackend::ObjectStore,
            shareable_link: "https://example.com/x".to_string(),
            download_link: None,
            public_link: None,
            expires_at: Utc::now(),
            crm: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["backend"], "object-store");
        assert!(json.get("public_link").is_none());
        assert!(json.get("crm").is_none());
    }
}
