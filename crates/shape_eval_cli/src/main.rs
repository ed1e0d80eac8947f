use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use gtfs_shape_eval_core::{
    discover_feed_sources, run_with_progress, EvaluationConfig, FeedTally, GtfsFeedLoader,
    GtfsInputError, ProgressHandler, DEFAULT_MAX_DISTANCE_METERS,
};

#[derive(Debug, Parser)]
#[command(name = "gtfs-shp-eval")]
#[command(about = "Analyze shapes.txt quality and coverage of GTFS feeds")]
#[command(disable_help_flag = true)]
struct Args {
    /// Folders searched recursively for GTFS feeds (directories or zip archives)
    #[arg(value_name = "FOLDER")]
    folders: Vec<PathBuf>,

    /// Maximum distance in meters between a stop and its trip's shape
    #[arg(
        short = 'd',
        long = "max-dist",
        default_value_t = DEFAULT_MAX_DISTANCE_METERS,
        value_parser = parse_max_distance
    )]
    max_dist: f64,

    /// Print the report as JSON
    #[arg(long = "json")]
    json: bool,

    /// Print help
    #[arg(short = '?', long = "help", short_alias = 'h', action = ArgAction::Help)]
    help: Option<bool>,
}

fn parse_max_distance(value: &str) -> Result<f64, String> {
    let distance: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !distance.is_finite() || distance < 0.0 {
        return Err(format!("'{}' is not a non-negative distance", value));
    }
    Ok(distance)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = EvaluationConfig {
        max_distance_meters: args.max_dist,
    };
    let sources = discover_feed_sources(&args.folders);
    info!(
        "found {} GTFS feeds, max distance {} m",
        sources.len(),
        config.max_distance_meters
    );

    let progress = IndicatifHandler::new();
    let result = run_with_progress(&sources, &GtfsFeedLoader, &config, &progress);
    progress.finish();
    let report = result?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", report);
    }
    Ok(())
}

use indicatif::{ProgressBar, ProgressStyle};

struct IndicatifHandler {
    feeds_pb: ProgressBar,
}

impl IndicatifHandler {
    fn new() -> Self {
        let feeds_pb = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        feeds_pb.set_style(style);
        feeds_pb.set_message("Searching feeds...");
        Self { feeds_pb }
    }

    fn finish(&self) {
        self.feeds_pb.finish_and_clear();
    }
}

impl ProgressHandler for IndicatifHandler {
    fn set_total_feeds(&self, count: usize) {
        self.feeds_pb.set_length(count as u64);
    }

    fn on_start_feed(&self, path: &Path) {
        self.feeds_pb
            .set_message(format!("Parsing GTFS feed in '{}'", path.display()));
    }

    fn on_finish_feed(&self, _path: &Path, _tally: &FeedTally) {
        self.feeds_pb.inc(1);
    }

    fn on_skip_feed(&self, _path: &Path, _error: &GtfsInputError) {
        self.feeds_pb.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn max_distance_defaults_to_250() {
        let args = Args::try_parse_from(["gtfs-shp-eval", "feeds"]).expect("args");
        assert_eq!(args.max_dist, 250.0);
        assert_eq!(args.folders, vec![PathBuf::from("feeds")]);
        assert!(!args.json);
    }

    #[test]
    fn short_and_long_distance_flags() {
        let args = Args::try_parse_from(["gtfs-shp-eval", "-d", "100", "a", "b"]).expect("args");
        assert_eq!(args.max_dist, 100.0);
        assert_eq!(args.folders.len(), 2);

        let args = Args::try_parse_from(["gtfs-shp-eval", "--max-dist=12.5"]).expect("args");
        assert_eq!(args.max_dist, 12.5);
        assert!(args.folders.is_empty());
    }

    #[test]
    fn rejects_invalid_distance() {
        assert!(Args::try_parse_from(["gtfs-shp-eval", "-d", "-1"]).is_err());
        assert!(Args::try_parse_from(["gtfs-shp-eval", "-d", "far"]).is_err());
        assert!(Args::try_parse_from(["gtfs-shp-eval", "-d", "NaN"]).is_err());
    }

    #[test]
    fn question_mark_shows_help() {
        let err = Args::try_parse_from(["gtfs-shp-eval", "-?"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
