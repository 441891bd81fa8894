pub mod analysis;
pub mod api;
pub mod io;
pub mod models;

pub use analysis::{
    analyze_video, analyze_videos, build_time_points, calculate_highlight_frames,
    calculate_highlight_segments, detect_runs, merge_adjacent, VideoHighlights,
};
pub use api::{ApiError, TikTokClient, TikTokConfig};
pub use io::{
    format_frames, format_segments, parse_video_list_file, parse_video_list_json,
    HighlightReport, HumanReport, ReportMetadata,
};
pub use models::{
    HighlightConfig, RawPoint, SamplePoint, ScoredFrame, Segment, TikTokVideo, TimePointScore,
};
