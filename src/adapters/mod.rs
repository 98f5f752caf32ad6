//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for looking up video metadata
//! from a remote service such as the YouTube Data API.

pub mod youtube;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{VideoId, VideoMetadata};

// Re-export the YouTube adapter
pub use youtube::{FetcherConfig, YouTubeClient, DEFAULT_API_BASE};

/// Errors from a single metadata lookup
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Video not found: {0}")]
    NotFound(VideoId),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode API response: {0}")]
    Decode(String),
}

/// Trait for metadata sources
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// Look up title and description for one video
    async fn fetch(&self, id: &VideoId) -> Result<VideoMetadata, FetchError>;
}
