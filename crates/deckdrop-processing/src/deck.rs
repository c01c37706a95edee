//! Deck rendering boundary
//!
//! Binary presentation formats are produced by external renderers implementing
//! [`DeckRenderer`]. [`MarkdownDeckRenderer`] is the built-in one: a slide-separated
//! Markdown file that most slide tools import directly.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use deckdrop_core::Segment;
use std::path::{Path, PathBuf};

/// Everything a renderer needs to lay out one deck.
#[derive(Debug, Clone)]
pub struct DeckOutline {
    pub title: String,
    pub segments: Vec<Segment>,
}

impl DeckOutline {
    pub fn new(title: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            title: title.into(),
            segments,
        }
    }

    /// Filesystem-safe stem derived from the title; `deck` when nothing usable remains.
    pub fn file_stem(&self) -> String {
        let mut stem = String::new();
        for c in self.title.trim().chars() {
            if c.is_ascii_alphanumeric() {
                stem.push(c.to_ascii_lowercase());
            } else if !stem.ends_with('-') && !stem.is_empty() {
                stem.push('-');
            }
        }
        let stem = stem.trim_end_matches('-');
        if stem.is_empty() {
            "deck".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Renders a deck outline to a file inside `output_dir` and returns its path.
#[async_trait]
pub trait DeckRenderer: Send + Sync {
    async fn render(&self, deck: &DeckOutline, output_dir: &Path) -> Result<PathBuf>;

    /// File extension of rendered decks, without the dot
    fn extension(&self) -> &'static str;
}

const SLIDE_SEPARATOR: &str = "\n---\n\n";

pub struct MarkdownDeckRenderer;

impl MarkdownDeckRenderer {
    pub fn to_markdown(deck: &DeckOutline) -> String {
        let mut slides = Vec::with_capacity(deck.segments.len() + 1);
        slides.push(format!(
            "# {}\n\n_{} slides_\n",
            deck.title.trim(),
            deck.segments.len() + 1
        ));
        for segment in &deck.segments {
            slides.push(format!("## {}\n\n{}\n", segment.title, segment.body));
        }
        slides.join(SLIDE_SEPARATOR)
    }
}

#[async_trait]
impl DeckRenderer for MarkdownDeckRenderer {
    #[tracing::instrument(skip(self, deck), fields(slides = deck.segments.len() + 1))]
    async fn render(&self, deck: &DeckOutline, output_dir: &Path) -> Result<PathBuf> {
        if deck.segments.is_empty() {
            return Err(anyhow!("Deck has no segments to render"));
        }

        let path = output_dir.join(format!("{}.{}", deck.file_stem(), self.extension()));
        tokio::fs::write(&path, Self::to_markdown(deck))
            .await
            .with_context(|| format!("Failed to write deck to {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Rendered markdown deck");
        Ok(path)
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}
