use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::evaluator::{evaluate_feed, Classification, EvaluationConfig, FeedTally};
use crate::feed::{Feed, LoadStats};
use crate::progress::{NoOpProgressHandler, ProgressHandler};
use crate::{GtfsInput, GtfsInputError};

/// Turns a feed location into a resolved [`Feed`].
pub trait FeedLoader {
    fn load(&self, path: &Path) -> Result<Feed, GtfsInputError>;
}

/// Loads GTFS directories and zip archives from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct GtfsFeedLoader;

impl FeedLoader for GtfsFeedLoader {
    fn load(&self, path: &Path) -> Result<Feed, GtfsInputError> {
        let input = GtfsInput::from_path(path)?;
        debug!(source = ?input.source(), "loading {}", input.path().display());
        let mut stats = LoadStats::default();
        let feed = Feed::from_input_with_stats(&input, &mut stats)?;
        if stats.malformed_rows > 0 {
            warn!(
                "{}: dropped {} malformed rows",
                input.path().display(),
                stats.malformed_rows
            );
        }
        let invalid_coordinates = stats.invalid_stop_coordinates + stats.invalid_shape_points;
        if invalid_coordinates > 0 {
            warn!(
                "{}: dropped {} stops or shape points with invalid coordinates",
                input.path().display(),
                invalid_coordinates
            );
        }
        Ok(feed)
    }
}

/// Totals accumulated over every feed of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub feeds_analyzed: usize,
    pub feeds_with_shapes: usize,
    pub trips_analyzed: usize,
    pub ok: usize,
    pub suspicious: usize,
    pub degenerate: usize,
    pub no_shape: usize,
}

impl RunCounters {
    pub fn record_feed(&mut self, feed: &Feed, tally: &FeedTally) {
        self.feeds_analyzed += 1;
        if feed.has_shapes() {
            self.feeds_with_shapes += 1;
        }
        self.trips_analyzed += tally.total();
        self.ok += tally.ok;
        self.suspicious += tally.suspicious;
        self.degenerate += tally.degenerate;
        self.no_shape += tally.no_shape;
    }

    pub fn count(&self, classification: Classification) -> usize {
        match classification {
            Classification::Ok => self.ok,
            Classification::Suspicious => self.suspicious,
            Classification::Degenerate => self.degenerate,
            Classification::NoShape => self.no_shape,
        }
    }
}

/// A feed source that was skipped because it could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub max_distance_meters: f64,
    pub counters: RunCounters,
    pub failures: Vec<FeedFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("No GTFS location specified, see --help")]
    NoInput,
    #[error("unexpected failure while evaluating feeds: {0}")]
    Fault(String),
}

pub fn run<L: FeedLoader>(
    sources: &[PathBuf],
    loader: &L,
    config: &EvaluationConfig,
) -> Result<RunReport, RunError> {
    run_with_progress(sources, loader, config, &NoOpProgressHandler)
}

/// Evaluates every source in order and aggregates the results.
///
/// Sources that fail to load are recorded in the report and skipped. A panic
/// anywhere below this call is turned into [`RunError::Fault`].
pub fn run_with_progress<L: FeedLoader>(
    sources: &[PathBuf],
    loader: &L,
    config: &EvaluationConfig,
    progress: &dyn ProgressHandler,
) -> Result<RunReport, RunError> {
    if sources.is_empty() {
        return Err(RunError::NoInput);
    }
    progress.set_total_feeds(sources.len());

    let result = catch_unwind(AssertUnwindSafe(|| {
        evaluate_sources(sources, loader, config, progress)
    }));

    match result {
        Ok(report) => {
            info!(
                feeds = report.counters.feeds_analyzed,
                trips = report.counters.trips_analyzed,
                skipped = report.failures.len(),
                "evaluation finished"
            );
            Ok(report)
        }
        Err(panic) => Err(RunError::Fault(panic_payload_message(&*panic))),
    }
}

fn evaluate_sources<L: FeedLoader>(
    sources: &[PathBuf],
    loader: &L,
    config: &EvaluationConfig,
    progress: &dyn ProgressHandler,
) -> RunReport {
    let mut counters = RunCounters::default();
    let mut failures = Vec::new();

    for path in sources {
        progress.on_start_feed(path);
        let feed = match loader.load(path) {
            Ok(feed) => feed,
            Err(err) => {
                warn!(
                    "Error while parsing GTFS feed '{}': {}. Skipping...",
                    path.display(),
                    err
                );
                progress.on_skip_feed(path, &err);
                failures.push(FeedFailure {
                    path: path.clone(),
                    message: err.to_string(),
                });
                continue;
            }
        };

        let tally = evaluate_feed(&feed, config.max_distance_meters);
        debug!(
            path = %path.display(),
            trips = tally.total(),
            ok = tally.ok,
            suspicious = tally.suspicious,
            degenerate = tally.degenerate,
            no_shape = tally.no_shape,
            "evaluated feed"
        );
        counters.record_feed(&feed, &tally);
        progress.on_finish_feed(path, &tally);
    }

    RunReport {
        max_distance_meters: config.max_distance_meters,
        counters,
        failures,
    }
}

fn panic_payload_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
