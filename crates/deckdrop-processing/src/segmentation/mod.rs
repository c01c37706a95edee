//! Content segmentation
//!
//! Partitions raw text into slide-sized [`Segment`]s under one of four strategies.
//! Everything here is pure: no I/O and no shared state.

mod keyword;
mod length;
mod paragraph;
mod text;
mod topic;

use deckdrop_core::{Segment, SegmentKind, SegmentationResult, Strategy};

pub use text::derive_title;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SegmentationError {
    #[error("Cannot segment empty text")]
    EmptyInput,

    #[error("Unknown segmentation strategy: {0}")]
    UnknownStrategy(String),
}

impl From<SegmentationError> for deckdrop_core::AppError {
    fn from(err: SegmentationError) -> Self {
        deckdrop_core::AppError::Segmentation(err.to_string())
    }
}

/// A segment before it is numbered and tagged with the producing strategy.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    pub title: String,
    pub body: String,
    pub keyword: Option<String>,
}

/// Segment `text` with the given strategy.
///
/// `topic` and `keyword` fall back to `paragraph` when they find no structure; the
/// result then reports `strategy == Paragraph` and keeps `requested_strategy`.
pub fn segment(text: &str, strategy: Strategy) -> Result<SegmentationResult, SegmentationError> {
    if text.trim().is_empty() {
        return Err(SegmentationError::EmptyInput);
    }

    let structured = match strategy {
        Strategy::Paragraph => Some(paragraph::drafts(text)),
        Strategy::Length => Some(length::drafts(text)),
        Strategy::Topic => topic::drafts(text),
        Strategy::Keyword => keyword::drafts(text),
    };

    let (used, drafts) = match structured {
        Some(drafts) if !drafts.is_empty() => (strategy, drafts),
        _ => {
            tracing::debug!(
                requested = %strategy,
                "No structure found for strategy, falling back to paragraph"
            );
            (Strategy::Paragraph, paragraph::drafts(text))
        }
    };

    let kind = SegmentKind::from(used);
    let segments: Vec<Segment> = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Segment {
            kind,
            title: draft.title,
            body: draft.body,
            index: i + 1,
            keyword: draft.keyword,
        })
        .collect();

    let estimated_slide_count = segments.len() + 1;
    Ok(SegmentationResult {
        strategy: used,
        requested_strategy: strategy,
        total_words: text::count_words(text),
        total_paragraphs: text::split_paragraphs(text).len().max(1),
        segments,
        estimated_slide_count,
    })
}

/// Segment `text` with a strategy given by name (`paragraph`, `topic`, `length`, `keyword`).
pub fn segment_named(text: &str, strategy: &str) -> Result<SegmentationResult, SegmentationError> {
    let strategy = strategy
        .parse::<Strategy>()
        .map_err(|_| SegmentationError::UnknownStrategy(strategy.to_string()))?;
    segment(text, strategy)
}
