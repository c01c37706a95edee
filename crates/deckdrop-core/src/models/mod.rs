pub mod file;
pub mod segment;

pub use file::{CrmObjectChain, FileRecord, UploadResult};
pub use segment::{Segment, SegmentKind, SegmentationResult, Strategy};
