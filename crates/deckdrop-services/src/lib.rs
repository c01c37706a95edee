//! Deckdrop Services Layer
//!
//! Orchestration on top of segmentation, rendering and storage: the publish
//! pipeline and the background expiry sweep. Binaries depend on this crate as a
//! single facade.

pub mod cleanup;
pub mod pipeline;

pub use cleanup::CleanupService;
pub use pipeline::{DeckPipeline, PublishOutcome, PublishRequest};

pub use deckdrop_processing::{
    derive_title, segment, segment_named, DeckOutline, DeckRenderer, MarkdownDeckRenderer,
    SegmentationError,
};
pub use deckdrop_storage::{
    create_storage, Storage, StorageBackend, StorageError, StorageResult,
};
