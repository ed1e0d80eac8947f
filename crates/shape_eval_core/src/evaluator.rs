//! Trip classification against shape geometry.
//!
//! A trip is checked by projecting every visited stop onto the Mercator plane
//! and measuring its scale-corrected distance to the trip's shape polyline.
//! Projected shapes are cached per feed, so a shape shared by many trips is
//! projected once.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::{Feed, Shape, ShapeRef, Trip};
use crate::geo::{min_distance_to_polyline, PlanarPoint, Projection, WebMercator};

pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Largest tolerated ground distance between a stop and its trip's shape.
    pub max_distance_meters: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_distance_meters: DEFAULT_MAX_DISTANCE_METERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Every stop lies within the distance threshold of the shape.
    Ok,
    /// At least one stop lies farther than the threshold.
    Suspicious,
    /// The shape has exactly as many points as the trip has stop-times,
    /// which usually means it was generated by connecting the stops.
    Degenerate,
    NoShape,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Ok,
        Classification::Suspicious,
        Classification::Degenerate,
        Classification::NoShape,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Ok => "ok",
            Classification::Suspicious => "suspicious",
            Classification::Degenerate => "degenerate",
            Classification::NoShape => "no_shape",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projected shape points for one feed, keyed by shape.
#[derive(Debug, Default)]
pub struct ProjectedShapeCache {
    shapes: FxHashMap<ShapeRef, Vec<PlanarPoint>>,
}

impl ProjectedShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected points of `shape`, computing them on first request.
    pub fn get_or_project<P: Projection>(
        &mut self,
        shape_ref: ShapeRef,
        shape: &Shape,
        projection: &P,
    ) -> &[PlanarPoint] {
        self.shapes.entry(shape_ref).or_insert_with(|| {
            shape
                .points
                .iter()
                .map(|point| projection.convert(*point))
                .collect()
        })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Classification counts for the trips of one feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedTally {
    pub ok: usize,
    pub suspicious: usize,
    pub degenerate: usize,
    pub no_shape: usize,
}

impl FeedTally {
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Ok => self.ok += 1,
            Classification::Suspicious => self.suspicious += 1,
            Classification::Degenerate => self.degenerate += 1,
            Classification::NoShape => self.no_shape += 1,
        }
    }

    pub fn count(&self, classification: Classification) -> usize {
        match classification {
            Classification::Ok => self.ok,
            Classification::Suspicious => self.suspicious,
            Classification::Degenerate => self.degenerate,
            Classification::NoShape => self.no_shape,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.suspicious + self.degenerate + self.no_shape
    }
}

/// Classifies the trips of a single feed.
///
/// The evaluator owns the feed's projection cache; dropping it discards the
/// cache.
pub struct FeedEvaluator<'f, P = WebMercator> {
    feed: &'f Feed,
    projection: P,
    cache: ProjectedShapeCache,
}

impl<'f> FeedEvaluator<'f, WebMercator> {
    pub fn new(feed: &'f Feed) -> Self {
        Self::with_projection(feed, WebMercator)
    }
}

impl<'f, P: Projection> FeedEvaluator<'f, P> {
    pub fn with_projection(feed: &'f Feed, projection: P) -> Self {
        Self {
            feed,
            projection,
            cache: ProjectedShapeCache::new(),
        }
    }

    pub fn cache(&self) -> &ProjectedShapeCache {
        &self.cache
    }

    pub fn classify_trip(&mut self, trip: &Trip, max_distance: f64) -> Classification {
        let Some(shape_ref) = trip.shape else {
            return Classification::NoShape;
        };
        let feed = self.feed;
        let Some(shape) = feed.shape(shape_ref) else {
            return Classification::NoShape;
        };
        if shape.points.len() == trip.stop_times.len() {
            return Classification::Degenerate;
        }

        let projection = &self.projection;
        let polyline = self.cache.get_or_project(shape_ref, shape, projection);
        for stop_time in &trip.stop_times {
            let location = stop_time.stop.location;
            let distance = min_distance_to_polyline(projection.convert(location), polyline)
                * projection.scale_correction(f64::from(location.lat));
            if distance > max_distance {
                debug!(
                    trip_id = %trip.id,
                    shape_id = %shape.id,
                    stop_id = %stop_time.stop.id,
                    distance,
                    "stop too far from shape"
                );
                return Classification::Suspicious;
            }
        }
        Classification::Ok
    }

    /// Classifies every trip of the feed in order.
    pub fn evaluate(&mut self, max_distance: f64) -> FeedTally {
        let feed = self.feed;
        let mut tally = FeedTally::default();
        for trip in &feed.trips {
            tally.record(self.classify_trip(trip, max_distance));
        }
        tally
    }
}

pub fn evaluate_feed(feed: &Feed, max_distance: f64) -> FeedTally {
    FeedEvaluator::new(feed).evaluate(max_distance)
}

pub fn evaluate_feed_with<P: Projection>(
    feed: &Feed,
    projection: P,
    max_distance: f64,
) -> FeedTally {
    FeedEvaluator::with_projection(feed, projection).evaluate(max_distance)
}
