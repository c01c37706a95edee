use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Selected once from `STORAGE_BACKEND` at startup. Defined in core because both
/// configuration and the storage factory need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// Managed directory on the local filesystem plus a JSON file mapping
    Local,
    /// S3 or an S3-compatible object store
    ObjectStore,
    /// Cloudinary raw uploads
    CdnMedia,
    /// Firebase Storage (a Google Cloud Storage bucket)
    DocStore,
    /// Salesforce Files (ContentVersion / ContentDocument)
    Crm,
}

impl StorageBackend {
    pub const ALL: [StorageBackend; 5] = [
        StorageBackend::Local,
        StorageBackend::ObjectStore,
        StorageBackend::CdnMedia,
        StorageBackend::DocStore,
        StorageBackend::Crm,
    ];
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "object-store" | "s3" => Ok(StorageBackend::ObjectStore),
            "cdn-media" | "cloudinary" => Ok(StorageBackend::CdnMedia),
            "doc-store" | "firebase" => Ok(StorageBackend::DocStore),
            "crm" | "salesforce" => Ok(StorageBackend::Crm),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::ObjectStore => write!(f, "object-store"),
            StorageBackend::CdnMedia => write!(f, "cdn-media"),
            StorageBackend::DocStore => write!(f, "doc-store"),
            StorageBackend::Crm => write!(f, "crm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names_and_aliases() {
        assert_eq!("local".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::ObjectStore);
        assert_eq!(
            "cloudinary".parse::<StorageBackend>().unwrap(),
            StorageBackend::CdnMedia
        );
        assert_eq!(
            "firebase".parse::<StorageBackend>().unwrap(),
            StorageBackend::DocStore
        );
        assert_eq!("salesforce".parse::<StorageBackend>().unwrap(), StorageBackend::Crm);
        assert!("nfs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for backend in StorageBackend::ALL {
            assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
        }
    }
}
