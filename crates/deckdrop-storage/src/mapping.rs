//! JSON file mapping for the local backend.
//!
//! The mapping is one JSON object keyed by file id:
//!
//! ```json
//! { "3f2a...": { "filename": "deck.md", "originalPath": "./uploads/3f2a....md",
//!               "createdAt": "2024-05-01T12:00:00Z", "expiresAt": "2024-05-08T12:00:00Z" } }
//! ```
//!
//! Every read-modify-write runs under one async mutex and lands through a temp
//! file plus rename, so concurrent uploads in one process never lose entries and a
//! crash never leaves a half-written mapping.

use crate::traits::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub filename: String,
    /// Path of the managed copy
    pub original_path: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MappingEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

pub type Entries = BTreeMap<String, MappingEntry>;

pub struct FileMapping {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMapping {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Snapshot of all entries.
    pub async fn load(&self) -> StorageResult<Entries> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    pub async fn get(&self, file_id: &str) -> StorageResult<Option<MappingEntry>> {
        Ok(self.load().await?.remove(file_id))
    }

    /// Apply `f` to the current entries and persist the result atomically.
    pub async fn update<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Entries) -> T,
    {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_unlocked().await?;
        let out = f(&mut entries);
        self.write_unlocked(&entries).await?;
        Ok(out)
    }

    async fn read_unlocked(&self) -> StorageResult<Entries> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Entries::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StorageError::BackendError(format!(
                    "Corrupt file mapping {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_unlocked(&self, entries: &Entries) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::BackendError(format!("Failed to encode mapping: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
