use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RawPoint;

/// Envelope returned by the TikTok Business video list endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoListResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub data: Option<VideoListData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VideoListData {
    #[serde(default)]
    pub videos: Vec<TikTokVideo>,
    /// Opaque cursor for the next page
    #[serde(default)]
    pub cursor: Option<i64>,
    #[serde(default)]
    pub has_more: bool,
}

/// A single video with its metrics
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TikTokVideo {
    pub item_id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub share_url: Option<String>,
    /// Per-second audience retention
    #[serde(default)]
    pub video_view_retention: Option<Vec<RawPoint>>,
    /// Per-second like distribution
    #[serde(default)]
    pub engagement_likes: Option<Vec<RawPoint>>,
    /// Every other field the API returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoListResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Best available error text for a failed response
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}
