//! Checks how well the shapes of GTFS feeds match the stops their trips serve.
//!
//! Every trip is classified as [`Classification::Ok`],
//! [`Classification::Suspicious`], [`Classification::Degenerate`] or
//! [`Classification::NoShape`], and the counts are aggregated over a run of
//! feeds.

mod csv_reader;
mod discovery;
mod engine;
mod evaluator;
mod feed;
pub mod geo;
mod input;
mod progress;
mod report;

pub use csv_reader::{read_csv_from_reader, CsvTable};
pub use discovery::{discover_feed_sources, is_feed_directory};
pub use engine::{
    run, run_with_progress, FeedFailure, FeedLoader, GtfsFeedLoader, RunCounters, RunError,
    RunReport,
};
pub use evaluator::{
    evaluate_feed, evaluate_feed_with, Classification, EvaluationConfig, FeedEvaluator, FeedTally,
    ProjectedShapeCache, DEFAULT_MAX_DISTANCE_METERS,
};
pub use feed::{
    Feed, LoadStats, Shape, ShapeRef, Stop, StopTime, Trip, SHAPES_FILE, STOPS_FILE,
    STOP_TIMES_FILE, TRIPS_FILE,
};
pub use geo::{PlanarPoint, Point, Projection, WebMercator};
pub use input::{is_zip_path, GtfsInput, GtfsInputError, GtfsInputReader, GtfsInputSource};
pub use progress::{NoOpProgressHandler, ProgressHandler};
pub use report::percentage;
