use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vidlight::{
    analyze_videos, format_frames, format_segments, parse_video_list_file, HighlightConfig,
    HighlightReport, HumanReport, TikTokClient, TikTokConfig, TikTokVideo, VideoHighlights,
};

#[derive(Parser)]
#[command(name = "vidlight")]
#[command(author, version, about = "Highlight detection from TikTok retention and like analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze video analytics saved as JSON
    Analyze {
        /// Input file (video list response, array of videos, or a single video)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        highlight: HighlightArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fetch videos from the TikTok Business API and analyze them
    Fetch {
        /// Business account ID (falls back to TIKTOK_BUSINESS_ID)
        #[arg(long)]
        business_id: Option<String>,

        /// Videos per page
        #[arg(long, default_value = "20")]
        max_count: u32,

        /// Maximum number of pages to fetch
        #[arg(long, default_value = "50")]
        max_pages: u32,

        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        highlight: HighlightArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Output file for the machine-readable report (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file for the human-readable report (text)
    #[arg(long)]
    human_readable: Option<PathBuf>,
}

/// Overrides for `HighlightConfig`; unset flags keep the library defaults
#[derive(Args)]
struct HighlightArgs {
    /// Weight of retention in segment scoring
    #[arg(long)]
    retention_weight: Option<f64>,

    /// Weight of like-rate in frame and segment scoring
    #[arg(long)]
    like_weight: Option<f64>,

    /// Minimum like-rate for a highlight frame
    #[arg(long)]
    min_like_percentage: Option<f64>,

    /// Maximum number of highlight frames per video
    #[arg(long)]
    top_n: Option<usize>,

    /// Retention level that, scaled by the retention weight, sets the segment threshold
    #[arg(long)]
    min_retention_percentage: Option<f64>,

    /// Minimum segment duration in seconds
    #[arg(long)]
    min_segment_duration: Option<i64>,

    /// Maximum segment duration in seconds
    #[arg(long)]
    max_segment_duration: Option<i64>,

    /// Maximum gap in seconds for merging neighbouring segments
    #[arg(long)]
    merge_threshold: Option<i64>,
}

impl HighlightArgs {
    fn to_config(&self) -> HighlightConfig {
        let defaults = HighlightConfig::default();
        HighlightConfig {
            retention_weight: self.retention_weight.unwrap_or(defaults.retention_weight),
            like_weight: self.like_weight.unwrap_or(defaults.like_weight),
            min_like_percentage: self.min_like_percentage.unwrap_or(defaults.min_like_percentage),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            min_retention_percentage: self
                .min_retention_percentage
                .unwrap_or(defaults.min_retention_percentage),
            min_segment_duration: self.min_segment_duration.unwrap_or(defaults.min_segment_duration),
            max_segment_duration: self.max_segment_duration.unwrap_or(defaults.max_segment_duration),
            merge_threshold: self.merge_threshold.unwrap_or(defaults.merge_threshold),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            report,
            highlight,
            verbose,
        } => {
            setup_logging(verbose);
            info!("Loading videos from {:?}", input);
            let videos = parse_video_list_file(&input).context("Failed to parse input analytics")?;
            run_analysis(&videos, &highlight.to_config(), &report)
        }
        Commands::Fetch {
            business_id,
            max_count,
            max_pages,
            report,
            highlight,
            verbose,
        } => {
            setup_logging(verbose);
            let api_config = TikTokConfig {
                max_count,
                max_pages,
                ..TikTokConfig::from_env(business_id)?
            };
            info!("Fetching videos for business account {}", api_config.business_id);
            let client = TikTokClient::new(api_config);
            let videos = client.fetch_all_videos().await.map_err(|err| {
                let context = err.hint().unwrap_or("Failed to fetch video list");
                anyhow::Error::new(err).context(context)
            })?;
            run_analysis(&videos, &highlight.to_config(), &report)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run_analysis(videos: &[TikTokVideo], config: &HighlightConfig, report: &ReportArgs) -> Result<()> {
    info!("Analyzing {} videos...", videos.len());
    let highlights = analyze_videos(videos, config);

    let summary = HighlightReport::from_highlights(&highlights, config);
    info!(
        "Found {} frames across {} videos, {} segments across {} videos",
        summary.metadata.total_frames,
        summary.metadata.videos_with_frames,
        summary.metadata.total_segments,
        summary.metadata.videos_with_segments
    );

    if let Some(path) = &report.output {
        summary.write_json(path)?;
        info!("Report written to {:?}", path);
    }

    if let Some(path) = &report.human_readable {
        HumanReport::new(&highlights).write_file(path)?;
        info!("Human-readable report written to {:?}", path);
    }

    if report.output.is_none() && report.human_readable.is_none() {
        print_summary(&highlights);
    }

    Ok(())
}

fn print_summary(highlights: &[VideoHighlights]) {
    println!("Highlight Analysis");
    println!("==================");
    for video in highlights {
        println!("Video {}", video.item_id);
        if !video.highlight_frames.is_empty() {
            println!("  frames:   {}", format_frames(&video.highlight_frames));
        }
        if !video.highlight_segments.is_empty() {
            println!("  segments: {}", format_segments(&video.highlight_segments));
        }
        if !video.has_highlights() {
            println!("  no highlights");
        }
    }
}
