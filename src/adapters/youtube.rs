//! YouTube Data API adapter.
//!
//! Issues one `GET /videos?part=snippet&id=<id>&key=<key>` per video and reads
//! the title and description of the first returned item.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{FetchError, MetadataSource};
use crate::domain::{VideoId, VideoMetadata};

/// Public YouTube Data API v3 root
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the client needs, resolved once by the caller
#[derive(Clone)]
pub struct FetcherConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,

    /// API root, without the trailing `/videos`
    pub api_base: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl FetcherConfig {
    /// Config for the public API with default timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the videos resource
    pub fn videos_url(&self) -> String {
        format!("{}/videos", self.api_base.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for FetcherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Response from the videos resource
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// YouTube Data API client
pub struct YouTubeClient {
    config: FetcherConfig,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Create a client from resolved configuration
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self { config, client })
    }

    /// Build the GET request for one video
    pub fn build_request(&self, id: &VideoId) -> Result<reqwest::Request, FetchError> {
        self.client
            .get(self.config.videos_url())
            .query(&[
                ("part", "snippet"),
                ("id", id.as_str()),
                ("key", self.config.api_key.as_str()),
            ])
            .build()
            .map_err(FetchError::Transport)
    }
}

/// Turn a videos-resource body into metadata for `id`
///
/// Only the first item is consulted; an empty or missing `items` array means
/// the video does not exist (or is private).
pub fn parse_response(id: &VideoId, body: &str) -> Result<VideoMetadata, FetchError> {
    let response: VideoListResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NotFound(id.clone()))?;

    Ok(VideoMetadata::new(
        id.clone(),
        item.snippet.title,
        item.snippet.description,
    ))
}

#[async_trait]
impl MetadataSource for YouTubeClient {
    fn name(&self) -> &str {
        "youtube"
    }

    #[instrument(skip_all, fields(id = %id))]
    async fn fetch(&self, id: &VideoId) -> Result<VideoMetadata, FetchError> {
        let request = self.build_request(id)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Transport)?;
        debug!(status = status.as_u16(), bytes = body.len(), "API response");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        parse_response(id, &body)
    }
}
