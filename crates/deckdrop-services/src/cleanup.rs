use deckdrop_storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Periodically removes expired decks from backends that track expiry themselves.
#[derive(Clone)]
pub struct CleanupService {
    storage: Arc<dyn Storage>,
    period: Duration,
}

impl CleanupService {
    pub fn new(storage: Arc<dyn Storage>, period: Duration) -> Self {
        Self { storage, period }
    }

    /// Start the background sweep.
    /// Returns a JoinHandle for graceful shutdown. The task ends on its own when the
    /// backend cannot purge.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.period);

            loop {
                sweep_interval.tick().await;

                tracing::debug!("Starting scheduled sweep of expired decks");

                match self.run_once().await {
                    Ok(_) => {}
                    Err(StorageError::Unsupported { backend, .. }) => {
                        tracing::info!(
                            backend = %backend,
                            "Backend manages its own retention, stopping expiry sweep"
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry sweep failed");
                    }
                }
            }
        })
    }

    /// Run a single sweep and return how many decks were removed.
    #[tracing::instrument(skip(self), fields(backend = %self.storage.backend_type()))]
    pub async fn run_once(&self) -> StorageResult<usize> {
        let start = std::time::Instant::now();
        let removed = self.storage.purge_expired().await?;

        tracing::info!(
            removed,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Expiry sweep completed"
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deckdrop_core::{FileRecord, UploadResult};
    use deckdrop_storage::StorageBackend;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts purge calls; fails every other call when `flaky`.
    struct CountingStorage {
        backend: StorageBackend,
        purges: AtomicUsize,
        flaky: bool,
    }

    impl CountingStorage {
        fn new(backend: StorageBackend, flaky: bool) -> Arc<Self> {
            Arc::new(Self {
                backend,
                purges: AtomicUsize::new(0),
                flaky,
            })
        }
    }

    #[async_trait]
    impl Storage for CountingStorage {
        async fn upload_file(&self, _local_path: &Path, filename: &str) -> StorageResult<UploadResult> {
            Err(StorageError::UploadFailed(filename.to_string()))
        }

        async fn get_file(&self, _file_id: &str) -> StorageResult<Option<FileRecord>> {
            Ok(None)
        }

        async fn purge_expired(&self) -> StorageResult<usize> {
            if self.backend != StorageBackend::Local {
                return Err(StorageError::Unsupported {
                    backend: self.backend,
                    operation: "purge_expired",
                });
            }
            let call = self.purges.fetch_add(1, Ordering::SeqCst);
            if self.flaky && call % 2 == 0 {
                return Err(StorageError::BackendError("disk busy".to_string()));
            }
            Ok(1)
        }

        fn backend_type(&self) -> StorageBackend {
            self.backend
        }
    }

    #[tokio::test]
    async fn keeps_sweeping_through_failures() {
        let storage = CountingStorage::new(StorageBackend::Local, true);
        let service = Arc::new(CleanupService::new(storage.clone(), Duration::from_millis(10)));
        let handle = service.start();

        tokio::time::timeout(Duration::from_secs(5), async {
            while storage.purges.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn stops_when_backend_cannot_purge() {
        let storage = CountingStorage::new(StorageBackend::CdnMedia, false);
        let service = Arc::new(CleanupService::new(storage, Duration::from_millis(10)));

        tokio::time::timeout(Duration::from_secs(5), service.start())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn run_once_reports_count() {
        let storage = CountingStorage::new(StorageBackend::Local, false);
        let service = CleanupService::new(storage, Duration::from_secs(3600));
        assert_eq!(service.run_once().await.unwrap(), 1);
    }
}
