use crate::models::{HighlightConfig, RawPoint, ScoredFrame};

/// Rank single seconds by like-rate
///
/// Points below `min_like_percentage` are dropped, the rest are sorted by
/// score (highest first, ties keep input order) and cut to `top_n`.
pub fn calculate_highlight_frames(likes: &[RawPoint], config: &HighlightConfig) -> Vec<ScoredFrame> {
    let mut frames: Vec<ScoredFrame> = likes
        .iter()
        .map(RawPoint::parse)
        .map(|p| ScoredFrame {
            second: p.second,
            percentage: p.percentage,
            score: p.percentage * config.like_weight,
        })
        .filter(|f| f.percentage >= config.min_like_percentage)
        .collect();

    // sort_by is stable
    frames.sort_by(|a, b| b.score.total_cmp(&a.score));
    frames.truncate(config.top_n);
    frames
}
