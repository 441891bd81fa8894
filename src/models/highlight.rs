use serde::{Deserialize, Serialize};

/// Tunable weights and thresholds for highlight detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Weight of retention in segment scoring
    pub retention_weight: f64,
    /// Weight of like-rate in both frame and segment scoring
    pub like_weight: f64,
    /// Minimum like-rate for a second to count as a highlight frame
    pub min_like_percentage: f64,
    /// Maximum number of frames returned
    pub top_n: usize,
    /// Scaled by `retention_weight` to give the per-second segment threshold
    pub min_retention_percentage: f64,
    /// Shortest run (end - start, in seconds) kept as a segment
    pub min_segment_duration: i64,
    /// Longest merged segment (in seconds) kept in the output
    pub max_segment_duration: i64,
    /// Largest gap in seconds between two segments that still merges them
    pub merge_threshold: i64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            retention_weight: 0.6,
            like_weight: 0.4,
            min_like_percentage: 0.05,
            top_n: 5,
            min_retention_percentage: 0.7,
            min_segment_duration: 3,
            max_segment_duration: 15,
            merge_threshold: 2,
        }
    }
}

impl HighlightConfig {
    /// Score a second must reach to extend a segment (0.42 with defaults)
    pub fn segment_score_threshold(&self) -> f64 {
        self.min_retention_percentage * self.retention_weight
    }
}

/// A single second ranked by like-rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFrame {
    pub second: i64,
    pub percentage: f64,
    /// `percentage * like_weight`
    pub score: f64,
}

/// Blended score for one distinct second across both series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePointScore {
    pub second: i64,
    pub retention: f64,
    pub like: f64,
    /// `retention * retention_weight + like * like_weight`
    pub score: f64,
}

/// A contiguous time range whose seconds cleared the segment threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: i64,
    pub end: i64,
    pub score: f64,
    pub avg_retention: f64,
    pub avg_like: f64,
}

impl Segment {
    /// Length in seconds, measured between the first and last sampled second
    ///
    /// Saturates at the `i64` bounds for out-of-range seconds.
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}
