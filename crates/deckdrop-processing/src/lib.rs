//! Deckdrop Processing Library
//!
//! Turns raw text into slide-sized segments and renders segments into a deck file.
//!
//! - [`segmentation`]: the four segmentation strategies and `derive_title`
//! - [`deck`]: the `DeckRenderer` boundary and the built-in Markdown renderer

pub mod deck;
pub mod segmentation;

pub use deck::{DeckOutline, DeckRenderer, MarkdownDeckRenderer};
pub use segmentation::{derive_title, segment, segment_named, SegmentationError};
