use std::collections::BTreeMap;

use crate::models::{HighlightConfig, RawPoint, Segment, TimePointScore};

/// Find time ranges where retention and like-rate stay high together
///
/// Every distinct second is scored, runs of seconds at or above the segment
/// threshold become candidate segments, near-adjacent candidates are merged,
/// and whatever survives the duration filter is ranked by score.
/// Missing likes count as zero for every second.
pub fn calculate_highlight_segments(
    retention: &[RawPoint],
    likes: Option<&[RawPoint]>,
    config: &HighlightConfig,
) -> Vec<Segment> {
    if retention.is_empty() {
        return Vec::new();
    }

    let points = build_time_points(retention, likes.unwrap_or(&[]), config);
    let runs = detect_runs(&points, config);
    let mut segments: Vec<Segment> = merge_adjacent(runs, config)
        .into_iter()
        .filter(|s| s.duration() <= config.max_segment_duration)
        .collect();

    segments.sort_by(|a, b| b.score.total_cmp(&a.score));
    segments
}

/// Join both series on `second` and score each distinct second
///
/// Retention samples are applied first (later duplicates win), then like
/// samples fill in `like`, creating zero-retention entries for seconds that
/// only appear in the like series. Output is ordered by second.
pub fn build_time_points(
    retention: &[RawPoint],
    likes: &[RawPoint],
    config: &HighlightConfig,
) -> Vec<TimePointScore> {
    // (retention, like) per second
    let mut by_second: BTreeMap<i64, (f64, f64)> = BTreeMap::new();

    for point in retention.iter().map(RawPoint::parse) {
        by_second.insert(point.second, (point.percentage, 0.0));
    }

    for point in likes.iter().map(RawPoint::parse) {
        by_second
            .entry(point.second)
            .and_modify(|entry| entry.1 = point.percentage)
            .or_insert((0.0, point.percentage));
    }

    by_second
        .into_iter()
        .map(|(second, (retention, like))| TimePointScore {
            second,
            retention,
            like,
            score: retention * config.retention_weight + like * config.like_weight,
        })
        .collect()
}

/// A run of high-scoring seconds that has not been closed yet
struct OpenRun {
    start: i64,
    end: i64,
    scores: Vec<f64>,
    retentions: Vec<f64>,
    likes: Vec<f64>,
}

impl OpenRun {
    fn start(point: &TimePointScore) -> Self {
        Self {
            start: point.second,
            end: point.second,
            scores: vec![point.score],
            retentions: vec![point.retention],
            likes: vec![point.like],
        }
    }

    fn extend(&mut self, point: &TimePointScore) {
        self.end = point.second;
        self.scores.push(point.score);
        self.retentions.push(point.retention);
        self.likes.push(point.like);
    }

    /// Close the run, keeping it only if it lasted long enough
    fn close(self, min_duration: i64) -> Option<Segment> {
        if self.end.saturating_sub(self.start) < min_duration {
            return None;
        }
        Some(Segment {
            start: self.start,
            end: self.end,
            score: mean(&self.scores),
            avg_retention: mean(&self.retentions),
            avg_like: mean(&self.likes),
        })
    }
}

/// Scan second-ordered points and emit every run that cleared the threshold
///
/// `points` must already be sorted by second, as `build_time_points` returns.
pub fn detect_runs(points: &[TimePointScore], config: &HighlightConfig) -> Vec<Segment> {
    let threshold = config.segment_score_threshold();
    let mut segments = Vec::new();
    let mut open: Option<OpenRun> = None;

    for point in points {
        let is_high = point.score >= threshold;

        match (open.as_mut(), is_high) {
            (Some(run), true) => run.extend(point),
            (None, true) => open = Some(OpenRun::start(point)),
            (Some(_), false) => {
                if let Some(segment) = open.take().and_then(|run| run.close(config.min_segment_duration)) {
                    segments.push(segment);
                }
            }
            (None, false) => {}
        }
    }

    if let Some(segment) = open.and_then(|run| run.close(config.min_segment_duration)) {
        segments.push(segment);
    }

    segments
}

/// Merge segments whose gap to the previous output segment is within `merge_threshold`
///
/// Merged metrics are the two-way average `(previous + next) / 2`, applied
/// pairwise in detection order, not a mean over all merged members.
pub fn merge_adjacent(segments: Vec<Segment>, config: &HighlightConfig) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());

    for segment in segments {
        match merged.last_mut() {
            Some(last) if segment.start.saturating_sub(last.end) <= config.merge_threshold => {
                last.end = segment.end;
                last.score = (last.score + segment.score) / 2.0;
                last.avg_retention = (last.avg_retention + segment.avg_retention) / 2.0;
                last.avg_like = (last.avg_like + segment.avg_like) / 2.0;
            }
            _ => merged.push(segment),
        }
    }

    merged
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn retention_series(values: &[(i64, f64)]) -> Vec<RawPoint> {
        values.iter().map(|&(s, p)| RawPoint::new(s, p)).collect()
    }

    fn ranges(segments: &[Segment]) -> Vec<(i64, i64)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_empty_retention_returns_nothing() {
        let likes = retention_series(&[(0, 0.9), (1, 0.9), (2, 0.9), (3, 0.9)]);
        let config = HighlightConfig::default();

        assert!(calculate_highlight_segments(&[], Some(&likes), &config).is_empty());
        assert!(calculate_highlight_segments(&[], None, &config).is_empty());
    }

    #[test]
    fn test_short_run_is_discarded() {
        let retention = vec![
            RawPoint::from_strs("0", "0.9"),
            RawPoint::from_strs("1", "0.8"),
            RawPoint::from_strs("2", "0.75"),
            RawPoint::from_strs("3", "0.3"),
        ];
        let likes = vec![RawPoint::from_strs("0", "0.1"), RawPoint::from_strs("1", "0.05")];

        let segments = calculate_highlight_segments(&retention, Some(&likes), &HighlightConfig::default());

        // Seconds 0..=2 clear 0.42 but span only 2 seconds
        assert!(segments.is_empty());
    }

    #[test]
    fn test_sustained_run_becomes_segment() {
        let retention = vec![
            RawPoint::from_strs("0", "0.9"),
            RawPoint::from_strs("1", "0.8"),
            RawPoint::from_strs("2", "0.75"),
            RawPoint::from_strs("3", "0.75"),
            RawPoint::from_strs("4", "0.3"),
        ];
        let likes = vec![RawPoint::from_strs("0", "0.1"), RawPoint::from_strs("1", "0.05")];

        let segments = calculate_highlight_segments(&retention, Some(&likes), &HighlightConfig::default());

        assert_eq!(ranges(&segments), vec![(0, 3)]);
        let segment = &segments[0];
        assert!((segment.score - (0.58 + 0.50 + 0.45 + 0.45) / 4.0).abs() < EPS);
        assert!((segment.avg_retention - 0.8).abs() < EPS);
        assert!((segment.avg_like - 0.0375).abs() < EPS);
    }

    #[test]
    fn test_open_run_closes_at_end_of_scan() {
        let retention = retention_series(&[(0, 0.1), (1, 0.9), (2, 0.9), (3, 0.9), (4, 0.9)]);

        let segments = calculate_highlight_segments(&retention, None, &HighlightConfig::default());

        assert_eq!(ranges(&segments), vec![(1, 4)]);
    }

    #[test]
    fn test_score_equal_to_threshold_is_high() {
        let retention = retention_series(&[(0, 0.7), (1, 0.7), (2, 0.7), (3, 0.7)]);

        let segments = calculate_highlight_segments(&retention, None, &HighlightConfig::default());

        assert_eq!(ranges(&segments), vec![(0, 3)]);
    }

    #[test]
    fn test_like_only_second_breaks_run() {
        let retention = retention_series(&[(0, 0.9), (1, 0.9), (2, 0.9), (4, 0.9), (5, 0.9), (6, 0.9), (7, 0.9)]);
        let config = HighlightConfig::default();

        // Without likes the gap at second 3 is invisible to the scan
        let unbroken = calculate_highlight_segments(&retention, None, &config);
        assert_eq!(ranges(&unbroken), vec![(0, 7)]);

        // A like sample at second 3 adds a zero-retention point scoring 0.2
        let likes = retention_series(&[(3, 0.5)]);
        let points = build_time_points(&retention, &likes, &config);
        let third = points.iter().find(|p| p.second == 3).unwrap();
        assert_eq!(third.retention, 0.0);
        assert!((third.score - 0.2).abs() < EPS);

        let split = calculate_highlight_segments(&retention, Some(&likes), &config);
        assert_eq!(ranges(&split), vec![(4, 7)]);
    }

    #[test]
    fn test_build_time_points_sorted_and_overwritten() {
        let retention = retention_series(&[(5, 0.5), (1, 0.9), (5, 0.6)]);
        let likes = retention_series(&[(1, 0.2), (1, 0.3), (9, 0.4)]);

        let points = build_time_points(&retention, &likes, &HighlightConfig::default());

        let seconds: Vec<i64> = points.iter().map(|p| p.second).collect();
        assert_eq!(seconds, vec![1, 5, 9]);
        assert_eq!(points[0].like, 0.3);
        assert_eq!(points[1].retention, 0.6);
        assert_eq!(points[1].like, 0.0);
        assert_eq!(points[2].retention, 0.0);
        assert_eq!(points[2].like, 0.4);
    }

    #[test]
    fn test_merge_uses_running_pairwise_average() {
        let retention = retention_series(&[
            (0, 0.8),
            (1, 0.8),
            (2, 0.8),
            (3, 0.8),
            (4, 0.1),
            (5, 1.0),
            (6, 1.0),
            (7, 1.0),
            (8, 1.0),
            (9, 0.1),
            (10, 0.75),
            (11, 0.75),
            (12, 0.75),
            (13, 0.75),
        ]);
        let config = HighlightConfig::default();

        let runs = detect_runs(&build_time_points(&retention, &[], &config), &config);
        assert_eq!(ranges(&runs), vec![(0, 3), (5, 8), (10, 13)]);

        let segments = calculate_highlight_segments(&retention, None, &config);

        assert_eq!(ranges(&segments), vec![(0, 13)]);
        // ((0.48 + 0.6) / 2 + 0.45) / 2, not the three-way mean of 0.51
        assert!((segments[0].score - 0.495).abs() < EPS);
        assert!((segments[0].avg_retention - 0.825).abs() < EPS);
        assert_eq!(segments[0].avg_like, 0.0);
    }

    #[test]
    fn test_gap_beyond_threshold_keeps_segments_apart() {
        let retention = retention_series(&[
            (0, 0.8),
            (1, 0.8),
            (2, 0.8),
            (3, 0.8),
            (4, 0.1),
            (5, 0.1),
            (6, 1.0),
            (7, 1.0),
            (8, 1.0),
            (9, 1.0),
        ]);

        let segments = calculate_highlight_segments(&retention, None, &HighlightConfig::default());

        // Ranked by score, not by time
        assert_eq!(ranges(&segments), vec![(6, 9), (0, 3)]);
        assert!(segments[0].score > segments[1].score);
    }

    #[test]
    fn test_max_duration_filter() {
        let config = HighlightConfig::default();

        let fifteen: Vec<RawPoint> = (0..=15).map(|s| RawPoint::new(s, 0.9)).collect();
        let kept = calculate_highlight_segments(&fifteen, None, &config);
        assert_eq!(ranges(&kept), vec![(0, 15)]);

        let sixteen: Vec<RawPoint> = (0..=16).map(|s| RawPoint::new(s, 0.9)).collect();
        assert!(calculate_highlight_segments(&sixteen, None, &config).is_empty());
    }

    #[test]
    fn test_sparse_seconds_extend_run() {
        let retention = retention_series(&[(0, 0.9), (5, 0.9), (10, 0.9)]);

        let segments = calculate_highlight_segments(&retention, None, &HighlightConfig::default());

        assert_eq!(ranges(&segments), vec![(0, 10)]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let retention = retention_series(&[
            (0, 0.8),
            (1, 0.8),
            (2, 0.8),
            (3, 0.8),
            (4, 0.1),
            (5, 0.1),
            (6, 1.0),
            (7, 1.0),
            (8, 1.0),
            (9, 1.0),
        ]);
        let likes = retention_series(&[(1, 0.2), (7, 0.1), (8, 0.3)]);
        let config = HighlightConfig::default();

        let expected = calculate_highlight_segments(&retention, Some(&likes), &config);

        let mut shuffled_retention = retention.clone();
        shuffled_retention.reverse();
        shuffled_retention.rotate_left(3);
        let mut shuffled_likes = likes.clone();
        shuffled_likes.reverse();

        let actual = calculate_highlight_segments(&shuffled_retention, Some(&shuffled_likes), &config);
        assert_eq!(actual, expected);
        assert_eq!(calculate_highlight_segments(&retention, Some(&likes), &config), expected);
    }

    #[test]
    fn test_segments_respect_duration_bounds() {
        let config = HighlightConfig::default();
        let retention: Vec<RawPoint> = (0..60)
            .map(|s| RawPoint::new(s, if s % 9 < 5 { 0.95 } else { 0.2 }))
            .collect();

        let segments = calculate_highlight_segments(&retention, None, &config);

        assert!(!segments.is_empty());
        for segment in &segments {
            assert!(segment.duration() >= config.min_segment_duration);
            assert!(segment.duration() <= config.max_segment_duration);
        }
        assert!(segments.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(segments.windows(2).all(|w| w[0].end < w[1].start || w[1].end < w[0].start));
    }

    #[test]
    fn test_extreme_seconds_do_not_overflow() {
        let config = HighlightConfig::default();

        let text_extremes = vec![
            RawPoint::from_strs("-9223372036854775808", "0.9"),
            RawPoint::from_strs("9223372036854775807", "0.9"),
        ];
        let numeric_extremes = vec![
            RawPoint {
                second: Some(json!(-1e300)),
                percentage: Some(json!(0.9)),
            },
            RawPoint {
                second: Some(json!(1e300)),
                percentage: Some(json!(0.9)),
            },
        ];

        for retention in [text_extremes, numeric_extremes] {
            let points = build_time_points(&retention, &[], &config);
            assert_eq!(points.first().map(|p| p.second), Some(i64::MIN));
            assert_eq!(points.last().map(|p| p.second), Some(i64::MAX));

            // The single run spans the whole i64 range and fails the max duration
            let runs = detect_runs(&points, &config);
            assert_eq!(runs.len(), 1);
            assert_eq!(runs[0].duration(), i64::MAX);
            assert!(calculate_highlight_segments(&retention, None, &config).is_empty());
        }

        let far_apart = vec![
            Segment {
                start: i64::MIN,
                end: i64::MIN + 3,
                score: 0.5,
                avg_retention: 0.8,
                avg_like: 0.0,
            },
            Segment {
                start: i64::MAX - 3,
                end: i64::MAX,
                score: 0.6,
                avg_retention: 0.9,
                avg_like: 0.0,
            },
        ];
        assert_eq!(merge_adjacent(far_apart, &config).len(), 2);
    }
}
