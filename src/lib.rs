//! ytmeta - YouTube metadata batch fetcher
//!
//! Resolves video ids from a list of URLs, fetches title and description
//! from the YouTube Data API and writes one JSON record per video.
//!
//! # Architecture
//!
//! The batch is a single linear pass:
//! - Input lines are classified and video ids extracted
//! - (sync only) Existing deck metadata is scanned and known ids are skipped
//! - Each remaining id is fetched and written to `<id>.json`
//! - Every id ends up with an outcome in the batch report
//!
//! # Modules
//!
//! - `adapters`: Metadata sources (YouTube Data API)
//! - `core`: Batch logic (Extractor, Scanner, Orchestrator)
//! - `domain`: Data structures (VideoId, VideoMetadata, BatchReport)
//! - `config`: Layered configuration and credential lookup
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Fetch every video in videos.txt into output/
//! YOUTUBE_API_KEY=... ytmeta fetch
//!
//! # Fetch only videos missing from ../decks into ../decks/processing/
//! ytmeta sync --decks ../decks
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{FetchError, MetadataSource, YouTubeClient};
pub use crate::core::{BatchOptions, FailurePolicy, Orchestrator};
pub use domain::{BatchReport, ItemOutcome, VideoId, VideoMetadata};
