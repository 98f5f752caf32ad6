//! Domain types for ytmeta.
//!
//! This module contains the core data structures:
//! - Video: identifiers and the metadata records written per video
//! - Report: per-video outcomes of a batch run

pub mod report;
pub mod video;

// Re-export commonly used types
pub use report::{BatchMode, BatchReport, InvalidLine, ItemOutcome, SkipReason};
pub use video::{InvalidVideoId, VideoId, VideoMetadata, VIDEO_ID_LEN};
