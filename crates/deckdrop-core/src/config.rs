//! Configuration module
//!
//! Configuration is read once at process start from the environment (and an
//! optional `.env` file). Per-backend sections are optional here; the selected
//! backend's section is validated eagerly so a misconfigured process fails before
//! it accepts any work.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CLOUDINARY_API_URL, DEFAULT_KEY_PREFIX, DEFAULT_RETENTION_DAYS,
    DEFAULT_SALESFORCE_API_VERSION, DEFAULT_SALESFORCE_LOGIN_URL, MAX_RETENTION_DAYS,
};
use crate::storage_types::StorageBackend;

const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Local filesystem backend settings
#[derive(Clone, Debug)]
pub struct LocalStorageConfig {
    pub storage_path: PathBuf,
    pub mapping_path: PathBuf,
}

/// S3 / S3-compatible backend settings
#[derive(Clone, Debug, Default)]
pub struct S3Config {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub key_prefix: String,
}

/// Cloudinary backend settings
#[derive(Clone, Debug, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
    pub api_url: String,
}

/// Firebase Storage backend settings
#[derive(Clone, Debug, Default)]
pub struct FirebaseConfig {
    pub bucket: Option<String>,
    pub service_account_path: Option<String>,
    pub key_prefix: String,
}

/// Salesforce backend settings
#[derive(Clone, Debug, Default)]
pub struct SalesforceConfig {
    pub login_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_version: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub retention_days: i64,
    /// Base for locally routed download links
    pub base_url: String,
    /// Seconds between expiry sweeps. 0 = disabled.
    pub cleanup_interval_secs: u64,
    pub local: LocalStorageConfig,
    pub s3: S3Config,
    pub cloudinary: CloudinaryConfig,
    pub firebase: FirebaseConfig,
    pub salesforce: SalesforceConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) if !value.trim().is_empty() => value.parse::<StorageBackend>()?,
            _ => StorageBackend::Local,
        };

        let retention_days = match env::var("FILE_RETENTION_DAYS") {
            Ok(value) => parse_whole("FILE_RETENTION_DAYS", &value)?,
            Err(_) => DEFAULT_RETENTION_DAYS,
        };
        let cleanup_interval_secs = match env::var("CLEANUP_INTERVAL_SECS") {
            Ok(value) => parse_whole("CLEANUP_INTERVAL_SECS", &value)?,
            Err(_) => CLEANUP_INTERVAL_SECS,
        };

        let storage_path = PathBuf::from(
            env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./uploads".to_string()),
        );
        let mapping_path = env::var("LOCAL_FILE_MAPPING_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| storage_path.join("file-mapping.json"));

        let config = Config {
            environment,
            storage_backend,
            retention_days,
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cleanup_interval_secs,
            local: LocalStorageConfig {
                storage_path,
                mapping_path,
            },
            s3: S3Config {
                bucket: non_empty_var("S3_BUCKET"),
                region: non_empty_var("S3_REGION").or_else(|| non_empty_var("AWS_REGION")),
                endpoint: non_empty_var("S3_ENDPOINT"),
                key_prefix: env::var("S3_KEY_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: non_empty_var("CLOUDINARY_CLOUD_NAME"),
                api_key: non_empty_var("CLOUDINARY_API_KEY"),
                api_secret: non_empty_var("CLOUDINARY_API_SECRET"),
                folder: env::var("CLOUDINARY_FOLDER")
                    .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
                api_url: env::var("CLOUDINARY_API_URL")
                    .unwrap_or_else(|_| DEFAULT_CLOUDINARY_API_URL.to_string()),
            },
            firebase: FirebaseConfig {
                bucket: non_empty_var("FIREBASE_STORAGE_BUCKET"),
                service_account_path: non_empty_var("FIREBASE_SERVICE_ACCOUNT_PATH")
                    .or_else(|| non_empty_var("GOOGLE_APPLICATION_CREDENTIALS")),
                key_prefix: env::var("FIREBASE_KEY_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            },
            salesforce: SalesforceConfig {
                login_url: env::var("SALESFORCE_LOGIN_URL")
                    .unwrap_or_else(|_| DEFAULT_SALESFORCE_LOGIN_URL.to_string()),
                client_id: non_empty_var("SALESFORCE_CLIENT_ID"),
                client_secret: non_empty_var("SALESFORCE_CLIENT_SECRET"),
                api_version: env::var("SALESFORCE_API_VERSION")
                    .unwrap_or_else(|_| DEFAULT_SALESFORCE_API_VERSION.to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Config for the local backend rooted at `storage_path`; used by tests and tools.
    pub fn local(storage_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let storage_path = storage_path.into();
        Config {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Local,
            retention_days: DEFAULT_RETENTION_DAYS,
            base_url: base_url.into(),
            cleanup_interval_secs: 0,
            local: LocalStorageConfig {
                mapping_path: storage_path.join("file-mapping.json"),
                storage_path,
            },
            s3: S3Config {
                key_prefix: DEFAULT_KEY_PREFIX.to_string(),
                ..Default::default()
            },
            cloudinary: CloudinaryConfig {
                folder: DEFAULT_KEY_PREFIX.to_string(),
                api_url: DEFAULT_CLOUDINARY_API_URL.to_string(),
                ..Default::default()
            },
            firebase: FirebaseConfig {
                key_prefix: DEFAULT_KEY_PREFIX.to_string(),
                ..Default::default()
            },
            salesforce: SalesforceConfig {
                login_url: DEFAULT_SALESFORCE_LOGIN_URL.to_string(),
                api_version: DEFAULT_SALESFORCE_API_VERSION.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    /// Retention window; `None` when `retention_days` is outside `1..=MAX_RETENTION_DAYS`.
    pub fn retention(&self) -> Option<chrono::Duration> {
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return None;
        }
        chrono::Duration::try_days(self.retention_days)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.retention().is_none() {
            return Err(anyhow::anyhow!(
                "FILE_RETENTION_DAYS must be between 1 and {}",
                MAX_RETENTION_DAYS
            ));
        }

        match self.storage_backend {
            StorageBackend::Local => {
                if self.base_url.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::ObjectStore => {
                if self.s3.bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using object-store storage backend"
                    ));
                }
                if self.s3.region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using object-store storage backend"
                    ));
                }
            }
            StorageBackend::CdnMedia => {
                if self.cloudinary.cloud_name.is_none()
                    || self.cloudinary.api_key.is_none()
                    || self.cloudinary.api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when using cdn-media storage backend"
                    ));
                }
            }
            StorageBackend::DocStore => {
                if self.firebase.bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "FIREBASE_STORAGE_BUCKET must be set when using doc-store storage backend"
                    ));
                }
            }
            StorageBackend::Crm => {
                if self.salesforce.client_id.is_none() || self.salesforce.client_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "SALESFORCE_CLIENT_ID and SALESFORCE_CLIENT_SECRET must be set when using crm storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_whole<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, anyhow::Error> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("{} must be a whole number, got {:?}", name, value))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_is_valid_by_default() {
        let config = Config::local("/tmp/deckdrop", "http://localhost:3000");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.local.mapping_path,
            PathBuf::from("/tmp/deckdrop/file-mapping.json")
        );
        assert_eq!(config.retention(), Some(chrono::Duration::days(7)));
    }

    #[test]
    fn rejects_non_positive_retention() {
        let mut config = Config::local("/tmp/deckdrop", "http://localhost:3000");
        config.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_retention_beyond_a_century() {
        let mut config = Config::local("/tmp/deckdrop", "http://localhost:3000");
        config.retention_days = MAX_RETENTION_DAYS;
        assert!(config.validate().is_ok());

        config.retention_days = 100_000_000;
        assert!(config.retention().is_none());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("36500"));
    }

    #[test]
    fn selected_backend_requires_its_credentials() {
        let mut config = Config::local("/tmp/deckdrop", "http://localhost:3000");

        config.storage_backend = StorageBackend::ObjectStore;
        assert!(config.validate().is_err());
        config.s3.bucket = Some("decks".to_string());
        config.s3.region = Some("us-east-1".to_string());
        assert!(config.validate().is_ok());

        config.storage_backend = StorageBackend::Crm;
        config.salesforce.client_id = Some("id".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SALESFORCE_CLIENT_SECRET"));
    }

    #[test]
    fn numeric_variables_reject_garbage_alike() {
        assert_eq!(parse_whole::<i64>("FILE_RETENTION_DAYS", " 14 ").unwrap(), 14);
        assert_eq!(parse_whole::<u64>("CLEANUP_INTERVAL_SECS", "0").unwrap(), 0);

        let err = parse_whole::<i64>("FILE_RETENTION_DAYS", "two weeks").unwrap_err();
        assert!(err.to_string().contains("FILE_RETENTION_DAYS"));
        let err = parse_whole::<u64>("CLEANUP_INTERVAL_SECS", "hourly").unwrap_err();
        assert!(err.to_string().contains("CLEANUP_INTERVAL_SECS"));
        assert!(parse_whole::<u64>("CLEANUP_INTERVAL_SECS", "-5").is_err());
    }
}
