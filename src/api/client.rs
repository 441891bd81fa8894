use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{TikTokVideo, VideoListData, VideoListResponse};

/// Fields requested from the video list endpoint
pub const DEFAULT_VIDEO_FIELDS: &[&str] = &[
    "item_id",
    "create_time",
    "thumbnail_url",
    "share_url",
    "embed_url",
    "caption",
    "video_views",
    "likes",
    "comments",
    "shares",
    "favorites",
    "reach",
    "video_duration",
    "full_video_watched_rate",
    "total_time_watched",
    "average_time_watched",
    "impression_sources",
    "audience_countries",
    "media_type",
    // Consumed by highlight analysis
    "video_view_retention",
    "engagement_likes",
];

const DEFAULT_BASE_URL: &str = "https://business-api.tiktok.com/open_api/v1.3";

/// Configuration for the TikTok Business API client
#[derive(Debug, Clone)]
pub struct TikTokConfig {
    /// Access token (from TIKTOK_ACCESS_TOKEN env var)
    pub access_token: String,
    /// Business account ID (the account's open_id)
    pub business_id: String,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Videos requested per page
    pub max_count: u32,
    /// Hard stop on pagination
    pub max_pages: u32,
    /// Pause between page requests in milliseconds
    pub page_delay_ms: u64,
}

impl TikTokConfig {
    /// Create config from environment variables
    ///
    /// `TIKTOK_BUSINESS_ID` is used when `business_id` is `None`.
    pub fn from_env(business_id: Option<String>) -> Result<Self> {
        let access_token = std::env::var("TIKTOK_ACCESS_TOKEN")
            .context("TIKTOK_ACCESS_TOKEN environment variable not set")?;
        let business_id = match business_id {
            Some(id) => id,
            None => std::env::var("TIKTOK_BUSINESS_ID")
                .context("No --business-id given and TIKTOK_BUSINESS_ID not set")?,
        };

        Ok(Self::new(access_token, business_id))
    }

    /// Create with default paging settings
    pub fn new(access_token: String, business_id: String) -> Self {
        Self {
            access_token,
            business_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_count: 20,
            max_pages: 50,
            page_delay_ms: 500,
        }
    }

    fn video_list_url(&self) -> String {
        format!("{}/business/video/list/", self.base_url.trim_end_matches('/'))
    }
}

/// Failures talking to the video list endpoint
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to TikTok API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TikTok API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("TikTok API error {code}: {message}")]
    Business { code: i64, message: String },

    #[error("failed to encode request parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the failure looks like an expired or revoked access token
    pub fn is_token_error(&self) -> bool {
        let message = match self {
            ApiError::Business { message, .. } => message.as_str(),
            ApiError::Status { status, body } => {
                if *status == StatusCode::UNAUTHORIZED {
                    return true;
                }
                body.as_str()
            }
            _ => return false,
        };
        message.contains("Access token") || message.contains("token") || message.contains("revoked")
    }

    /// What the user should do about this failure, if anything specific
    pub fn hint(&self) -> Option<&'static str> {
        self.is_token_error().then_some(
            "Access token looks expired or revoked; refresh it and set TIKTOK_ACCESS_TOKEN again",
        )
    }
}

/// What to do after a page of the video list arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    /// Request the next page at this cursor
    Next(Option<i64>),
    /// The listing is complete
    Done,
    /// More pages exist but `max_pages` was reached
    PageLimit,
}

/// Decide how pagination continues after page `page` (1-based)
///
/// A page without `data` ends the listing and keeps what was already fetched.
pub fn next_page_step(page: u32, max_pages: u32, data: Option<&VideoListData>) -> PageStep {
    match data {
        Some(data) if data.has_more => {
            if page >= max_pages {
                PageStep::PageLimit
            } else {
                PageStep::Next(data.cursor)
            }
        }
        _ => PageStep::Done,
    }
}

/// TikTok Business API client for video analytics
pub struct TikTokClient {
    client: Client,
    config: TikTokConfig,
}

impl TikTokClient {
    pub fn new(config: TikTokConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[cfg(test)]
    fn with_client(config: TikTokConfig, client: Client) -> Self {
        Self { client, config }
    }

    /// Query string for one page of the video list
    fn page_query(&self, cursor: Option<i64>) -> Result<Vec<(&'static str, String)>, ApiError> {
        let fields = serde_json::to_string(DEFAULT_VIDEO_FIELDS)?;
        let mut query = vec![
            ("business_id", self.config.business_id.clone()),
            ("fields", fields),
            ("max_count", self.config.max_count.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        Ok(query)
    }

    /// Fetch one page of videos starting at `cursor`
    ///
    /// `Ok(None)` means the API answered successfully but sent no `data`.
    pub async fn fetch_video_page(&self, cursor: Option<i64>) -> Result<Option<VideoListData>, ApiError> {
        let response = self
            .client
            .get(self.config.video_list_url())
            .header("Accept", "application/json")
            .header("Access-Token", &self.config.access_token)
            .query(&self.page_query(cursor)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let response: VideoListResponse = response.json().await?;
        into_page(response)
    }

    /// Fetch every page of videos, following the cursor until `has_more` is false
    pub async fn fetch_all_videos(&self) -> Result<Vec<TikTokVideo>, ApiError> {
        let mut videos = Vec::new();
        let mut cursor = None;

        for page in 1..=self.config.max_pages {
            let data = self.fetch_video_page(cursor).await?;
            let step = next_page_step(page, self.config.max_pages, data.as_ref());

            match data {
                Some(data) => {
                    debug!(
                        "Page {}: {} videos, has_more={}",
                        page,
                        data.videos.len(),
                        data.has_more
                    );
                    videos.extend(data.videos);
                }
                None => debug!("Page {}: no data, stopping", page),
            }

            match step {
                PageStep::Next(next) => {
                    cursor = next;
                    tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)).await;
                }
                PageStep::Done => {
                    info!("Fetched {} videos in {} pages", videos.len(), page);
                    return Ok(videos);
                }
                PageStep::PageLimit => break,
            }
        }

        warn!(
            "Stopped after {} pages with more videos remaining",
            self.config.max_pages
        );
        Ok(videos)
    }
}

/// Unwrap a video list envelope into its page data
fn into_page(response: VideoListResponse) -> Result<Option<VideoListData>, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Business {
            code: response.code,
            message: response.error_message(),
        });
    }
    Ok(response.data)
}
