use std::path::Path;

use crate::evaluator::FeedTally;
use crate::GtfsInputError;

/// Trait for handling progress events while feeds are evaluated
pub trait ProgressHandler {
    /// Set total number of feed sources that will be processed
    fn set_total_feeds(&self, count: usize) {
        let _ = count;
    }

    /// Called before a feed is loaded
    fn on_start_feed(&self, path: &Path);

    /// Called after a feed was loaded and all of its trips classified
    fn on_finish_feed(&self, path: &Path, tally: &FeedTally);

    /// Called when a feed could not be loaded and was skipped
    fn on_skip_feed(&self, path: &Path, error: &GtfsInputError);
}

/// A no-op progress handler
pub struct NoOpProgressHandler;

impl ProgressHandler for NoOpProgressHandler {
    fn on_start_feed(&self, _path: &Path) {}
    fn on_finish_feed(&self, _path: &Path, _tally: &FeedTally) {}
    fn on_skip_feed(&self, _path: &Path, _error: &GtfsInputError) {}
}
