#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStorage;
#[cfg(feature = "storage-firebase")]
use crate::FirebaseStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
#[cfg(feature = "storage-salesforce")]
use crate::SalesforceStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use deckdrop_core::constants::MAX_RETENTION_DAYS;
use deckdrop_core::Config;
use std::sync::Arc;

fn required(value: &Option<String>, name: &str) -> StorageResult<String> {
    value
        .clone()
        .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
}

/// Create a storage backend based on configuration
///
/// Credentials are checked here, so a misconfigured backend fails at startup
/// rather than on the first upload.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let retention = config.retention().ok_or_else(|| {
        StorageError::ConfigError(format!(
            "FILE_RETENTION_DAYS must be between 1 and {}",
            MAX_RETENTION_DAYS
        ))
    })?;

    let storage: Arc<dyn Storage> = match config.storage_backend() {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => Arc::new(
            LocalStorage::new(
                config.local.storage_path.clone(),
                config.local.mapping_path.clone(),
                config.base_url.clone(),
                retention,
            )
            .await?,
        ),

        #[cfg(feature = "storage-s3")]
        StorageBackend::ObjectStore => {
            let bucket = required(&config.s3.bucket, "S3_BUCKET")?;
            let region = required(&config.s3.region, "S3_REGION or AWS_REGION")?;
            Arc::new(S3Storage::new(
                bucket,
                region,
                config.s3.endpoint.clone(),
                config.s3.key_prefix.clone(),
                retention,
            )?)
        }

        #[cfg(feature = "storage-cloudinary")]
        StorageBackend::CdnMedia => Arc::new(CloudinaryStorage::new(
            config.cloudinary.api_url.clone(),
            required(&config.cloudinary.cloud_name, "CLOUDINARY_CLOUD_NAME")?,
            required(&config.cloudinary.api_key, "CLOUDINARY_API_KEY")?,
            required(&config.cloudinary.api_secret, "CLOUDINARY_API_SECRET")?,
            config.cloudinary.folder.clone(),
            retention,
        )?),

        #[cfg(feature = "storage-firebase")]
        StorageBackend::DocStore => Arc::new(FirebaseStorage::new(
            required(&config.firebase.bucket, "FIREBASE_STORAGE_BUCKET")?,
            config.firebase.service_account_path.clone(),
            config.firebase.key_prefix.clone(),
            retention,
        )?),

        #[cfg(feature = "storage-salesforce")]
        StorageBackend::Crm => Arc::new(SalesforceStorage::new(
            config.salesforce.login_url.clone(),
            required(&config.salesforce.client_id, "SALESFORCE_CLIENT_ID")?,
            required(&config.salesforce.client_secret, "SALESFORCE_CLIENT_SECRET")?,
            config.salesforce.api_version.clone(),
            retention,
        )?),

        #[allow(unreachable_patterns)]
        other => {
            return Err(StorageError::ConfigError(format!(
                "{} storage backend not available (feature not enabled)",
                other
            )))
        }
    };

    tracing::info!(backend = %storage.backend_type(), "Storage backend initialized");
    Ok(storage)
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_local_backend() {
        let dir = tempdir().unwrap();
        let config = Config::local(dir.path(), "http://localhost:3000");
        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }

    #[cfg(all(
        feature = "storage-s3",
        feature = "storage-cloudinary",
        feature = "storage-salesforce"
    ))]
    #[tokio::test]
    async fn missing_credentials_fail_fast() {
        let dir = tempdir().unwrap();
        let mut config = Config::local(dir.path(), "http://localhost:3000");

        config.storage_backend = StorageBackend::CdnMedia;
        config.cloudinary.cloud_name = Some("demo".to_string());
        let err = create_storage(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::ConfigError(ref msg) if msg.contains("CLOUDINARY_API_KEY")));

        config.storage_backend = StorageBackend::Crm;
        let err = create_storage(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::ConfigError(ref msg) if msg.contains("SALESFORCE_CLIENT_ID")));

        config.storage_backend = StorageBackend::ObjectStore;
        let err = create_storage(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::ConfigError(ref msg) if msg.contains("S3_BUCKET")));
    }

    #[tokio::test]
    async fn rejects_zero_retention() {
        let dir = tempdir().unwrap();
        let mut config = Config::local(dir.path(), "http://localhost:3000");
        config.retention_days = 0;
        assert!(create_storage(&config).await.is_err());
    }

    #[tokio::test]
    async fn rejects_unbounded_retention() {
        let dir = tempdir().unwrap();
        let mut config = Config::local(dir.path(), "http://localhost:3000");
        config.retention_days = 100_000_000;
        let err = create_storage(&config).await.err().unwrap();
        assert!(matches!(err, StorageError::ConfigError(ref msg) if msg.contains("36500")));
    }
}
