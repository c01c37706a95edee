//! Publish pipeline: text in, shareable deck link out.
//!
//! Segments the text, renders the outline into a scratch directory, hands the
//! rendered file to the configured storage backend and removes the scratch copy.

use anyhow::Context;
use deckdrop_core::{AppError, SegmentationResult, Strategy, UploadResult};
use deckdrop_processing::{derive_title, segment, DeckOutline, DeckRenderer};
use deckdrop_storage::Storage;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Deck title; the first segment's title when absent
    pub title: Option<String>,
    pub text: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub segmentation: SegmentationResult,
    pub upload: UploadResult,
}

#[derive(Clone)]
pub struct DeckPipeline {
    storage: Arc<dyn Storage>,
    renderer: Arc<dyn DeckRenderer>,
}

impl DeckPipeline {
    pub fn new(storage: Arc<dyn Storage>, renderer: Arc<dyn DeckRenderer>) -> Self {
        Self { storage, renderer }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[tracing::instrument(skip(self, request), fields(strategy = %request.strategy))]
    pub async fn publish(&self, request: PublishRequest) -> anyhow::Result<PublishOutcome> {
        let start = std::time::Instant::now();

        let segmentation = segment(&request.text, request.strategy)?;
        if segmentation.fell_back() {
            tracing::info!(
                requested = %segmentation.requested_strategy,
                used = %segmentation.strategy,
                "Segmentation fell back to paragraphs"
            );
        }

        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| segmentation.segments.first().map(|s| s.title.clone()))
            .unwrap_or_else(|| derive_title(&request.text));
        let outline = DeckOutline::new(title, segmentation.segments.clone());

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let rendered = self
            .renderer
            .render(&outline, scratch.path())
            .await
            .map_err(|e| AppError::Rendering(format!("{:#}", e)))?;

        let filename = format!("{}.{}", outline.file_stem(), self.renderer.extension());
        let upload = self.storage.upload_file(&rendered, &filename).await;

        if let Err(e) = tokio::fs::remove_file(&rendered).await {
            tracing::warn!(error = %e, path = %rendered.display(), "Failed to remove rendered deck");
        }
        drop(scratch);

        let upload = upload.context("Failed to upload deck")?;

        tracing::info!(
            file_id = %upload.file_id,
            backend = %upload.backend,
            slides = segmentation.estimated_slide_count,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Deck published"
        );

        Ok(PublishOutcome {
            segmentation,
            upload,
        })
    }
}
