use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{TikTokVideo, VideoListResponse};

/// Shapes accepted for offline analytics input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VideoInput {
    /// Full video list API response
    Envelope(VideoListResponse),
    /// Bare array of videos, e.g. `data.videos` saved on its own
    List(Vec<TikTokVideo>),
    /// A single video object
    Single(Box<TikTokVideo>),
}

/// Read videos from a JSON file
pub fn parse_video_list_file(path: &Path) -> Result<Vec<TikTokVideo>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_video_list_json(&content)
}

/// Parse videos from a JSON string in any of the accepted shapes
pub fn parse_video_list_json(json: &str) -> Result<Vec<TikTokVideo>> {
    let input: VideoInput =
        serde_json::from_str(json).context("Failed to parse video analytics JSON")?;

    match input {
        VideoInput::Envelope(response) => {
            if !response.is_success() {
                anyhow::bail!(
                    "Video list response has error code {}: {}",
                    response.code,
                    response.error_message()
                );
            }
            Ok(response.data.map(|d| d.videos).unwrap_or_default())
        }
        VideoInput::List(videos) => Ok(videos),
        VideoInput::Single(video) => Ok(vec![*video]),
    }
}
