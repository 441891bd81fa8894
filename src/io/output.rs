use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::analysis::VideoHighlights;
use crate::models::{HighlightConfig, ScoredFrame, Segment};

/// Machine-readable report for a batch of analyzed videos
#[derive(Debug, Clone, Serialize)]
pub struct HighlightReport {
    /// RFC 3339 time the report was built
    pub generated_at: String,
    /// Configuration the highlights were computed with
    pub config: HighlightConfig,
    pub videos: Vec<ReportVideo>,
    pub metadata: ReportMetadata,
}

/// One video in the report, with the display strings written back to the video record
#[derive(Debug, Clone, Serialize)]
pub struct ReportVideo {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub highlight_frames: Vec<ScoredFrame>,
    pub highlight_segments: Vec<Segment>,
    /// e.g. "12秒, 45秒"
    pub highlight_frames_text: String,
    /// e.g. "10~18秒, 30~36秒"
    pub highlight_segments_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub total_videos: usize,
    pub videos_with_frames: usize,
    pub videos_with_segments: usize,
    pub total_frames: usize,
    pub total_segments: usize,
}

impl ReportMetadata {
    pub fn from_highlights(highlights: &[VideoHighlights]) -> Self {
        Self {
            total_videos: highlights.len(),
            videos_with_frames: highlights
                .iter()
                .filter(|h| !h.highlight_frames.is_empty())
                .count(),
            videos_with_segments: highlights
                .iter()
                .filter(|h| !h.highlight_segments.is_empty())
                .count(),
            total_frames: highlights.iter().map(|h| h.highlight_frames.len()).sum(),
            total_segments: highlights.iter().map(|h| h.highlight_segments.len()).sum(),
        }
    }
}

impl HighlightReport {
    /// Build a report from analysis results
    pub fn from_highlights(highlights: &[VideoHighlights], config: &HighlightConfig) -> Self {
        let videos = highlights
            .iter()
            .map(|h| ReportVideo {
                item_id: h.item_id.clone(),
                caption: h.caption.clone(),
                highlight_frames: h.highlight_frames.clone(),
                highlight_segments: h.highlight_segments.clone(),
                highlight_frames_text: format_frames(&h.highlight_frames),
                highlight_segments_text: format_segments(&h.highlight_segments),
            })
            .collect();

        Self {
            generated_at: Utc::now().to_rfc3339(),
            config: config.clone(),
            videos,
            metadata: ReportMetadata::from_highlights(highlights),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Human-readable highlight summary
pub struct HumanReport<'a> {
    highlights: &'a [VideoHighlights],
}

impl<'a> HumanReport<'a> {
    pub fn new(highlights: &'a [VideoHighlights]) -> Self {
        Self { highlights }
    }

    /// Format all videos as text blocks
    pub fn format(&self) -> String {
        let mut output = String::new();

        for video in self.highlights {
            match &video.caption {
                Some(caption) if !caption.is_empty() => {
                    output.push_str(&format!("Video {} ({}):\n", video.item_id, caption));
                }
                _ => output.push_str(&format!("Video {}:\n", video.item_id)),
            }

            output.push_str(&format!(
                "  Highlight frames:   {}\n",
                or_none(format_frames(&video.highlight_frames))
            ));
            output.push_str(&format!(
                "  Highlight segments: {}\n",
                or_none(format_segments(&video.highlight_segments))
            ));

            for segment in &video.highlight_segments {
                output.push_str(&format!(
                    "    {:>4}~{:<4} score {:.3}  retention {:.1}%  likes {:.1}%\n",
                    segment.start,
                    segment.end,
                    segment.score,
                    segment.avg_retention * 100.0,
                    segment.avg_like * 100.0
                ));
            }
            output.push('\n');
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

/// Format frames in rank order as "n秒, n秒"
pub fn format_frames(frames: &[ScoredFrame]) -> String {
    frames
        .iter()
        .map(|f| format!("{}秒", f.second))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format segments in rank order as "n~m秒, n~m秒"
pub fn format_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}~{}秒", s.start, s.end))
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_none(text: String) -> String {
    if text.is_empty() {
        "(none)".to_string()
    } else {
        text
    }
}
