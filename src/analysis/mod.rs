pub mod frames;
pub mod segments;

pub use frames::*;
pub use segments::*;

use serde::Serialize;
use tracing::debug;

use crate::models::{HighlightConfig, ScoredFrame, Segment, TikTokVideo};

/// Highlights derived for one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoHighlights {
    /// TikTok item ID of the analyzed video
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Seconds ranked by like-rate
    pub highlight_frames: Vec<ScoredFrame>,
    /// Time ranges ranked by blended retention and like score
    pub highlight_segments: Vec<Segment>,
}

impl VideoHighlights {
    pub fn has_highlights(&self) -> bool {
        !self.highlight_frames.is_empty() || !self.highlight_segments.is_empty()
    }
}

/// Run both highlight passes over one video's analytics
///
/// Frames need `engagement_likes`; segments need `video_view_retention` and
/// treat absent likes as zero.
pub fn analyze_video(video: &TikTokVideo, config: &HighlightConfig) -> VideoHighlights {
    let likes = video.engagement_likes.as_deref();

    let highlight_frames = likes
        .map(|l| calculate_highlight_frames(l, config))
        .unwrap_or_default();

    let highlight_segments = video
        .video_view_retention
        .as_deref()
        .map(|r| calculate_highlight_segments(r, likes, config))
        .unwrap_or_default();

    debug!(
        "Video {}: {} frames, {} segments",
        video.item_id,
        highlight_frames.len(),
        highlight_segments.len()
    );

    VideoHighlights {
        item_id: video.item_id.clone(),
        caption: video.caption.clone(),
        highlight_frames,
        highlight_segments,
    }
}

/// Analyze every video in order
pub fn analyze_videos(videos: &[TikTokVideo], config: &HighlightConfig) -> Vec<VideoHighlights> {
    videos.iter().map(|v| analyze_video(v, config)).collect()
}
