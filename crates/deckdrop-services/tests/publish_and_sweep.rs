//! Publish through the pipeline, let the deck expire, sweep it away.

use deckdrop_core::{Config, Strategy};
use deckdrop_services::{
    create_storage, CleanupService, DeckPipeline, MarkdownDeckRenderer, PublishRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn expire(mapping: &std::path::Path, file_id: &str) {
    let mut raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(mapping).unwrap()).unwrap();
    raw[file_id]["expiresAt"] =
        serde_json::json!((chrono::Utc::now() - chrono::Duration::minutes(5)).to_rfc3339());
    std::fs::write(mapping, serde_json::to_vec(&raw).unwrap()).unwrap();
}

#[tokio::test]
async fn expired_decks_are_swept() {
    let dir = tempdir().unwrap();
    let config = Config::local(dir.path(), "http://localhost:3000");
    let storage = create_storage(&config).await.unwrap();
    let pipeline = DeckPipeline::new(storage.clone(), Arc::new(MarkdownDeckRenderer));

    let text = "# Roadmap\nShip the beta.\n# Risks\nHiring is slow.";
    let stale = pipeline
        .publish(PublishRequest {
            title: Some("Roadmap".to_string()),
            text: text.to_string(),
            strategy: Strategy::Topic,
        })
        .await
        .unwrap();
    let live = pipeline
        .publish(PublishRequest {
            title: Some("Roadmap v2".to_string()),
            text: text.to_string(),
            strategy: Strategy::Length,
        })
        .await
        .unwrap();

    let stale_record = storage.get_file(&stale.upload.file_id).await.unwrap().unwrap();
    expire(&config.local.mapping_path, &stale.upload.file_id);
    assert!(storage.get_file(&stale.upload.file_id).await.unwrap().is_none());

    let sweeper = CleanupService::new(storage.clone(), Duration::from_secs(3600));
    assert_eq!(sweeper.run_once().await.unwrap(), 1);
    assert_eq!(sweeper.run_once().await.unwrap(), 0);

    assert!(!std::path::Path::new(&stale_record.original_path).exists());
    let remaining = storage.list_files(10).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].file_id, live.upload.file_id);
    assert_eq!(remaining[0].filename, "roadmap-v2.md");
}
