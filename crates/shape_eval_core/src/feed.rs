use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::csv_reader::CsvTable;
use crate::geo::Point;
use crate::{GtfsInput, GtfsInputError, GtfsInputReader};

pub const STOPS_FILE: &str = "stops.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const SHAPES_FILE: &str = "shapes.txt";

/// Parent stations are followed at most this many levels up.
const MAX_PARENT_DEPTH: usize = 3;

/// Index of a shape in [`Feed::shapes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeRef(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub location: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub stop_sequence: u32,
    pub stop: Arc<Stop>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub shape: Option<ShapeRef>,
    /// Ordered by `stop_sequence`.
    pub stop_times: Vec<StopTime>,
}

/// Trips and shapes of one feed, with references already resolved.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub trips: Vec<Trip>,
    pub shapes: Vec<Shape>,
}

/// What the loader left out while resolving a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub malformed_rows: usize,
    pub duplicate_trips: usize,
    pub invalid_shape_points: usize,
    pub invalid_stop_coordinates: usize,
    pub unknown_shape_refs: usize,
    pub orphan_stop_times: usize,
    pub unlocated_stop_times: usize,
}

impl Feed {
    pub fn shape(&self, shape_ref: ShapeRef) -> Option<&Shape> {
        self.shapes.get(shape_ref.0)
    }

    pub fn has_shapes(&self) -> bool {
        !self.shapes.is_empty()
    }

    pub fn from_input(input: &GtfsInput) -> Result<Self, GtfsInputError> {
        let mut stats = LoadStats::default();
        Self::from_input_with_stats(input, &mut stats)
    }

    pub fn from_input_with_stats(
        input: &GtfsInput,
        stats: &mut LoadStats,
    ) -> Result<Self, GtfsInputError> {
        let mut reader = input.reader()?;
        Self::from_reader_with_stats(&mut reader, stats)
    }

    pub fn from_reader_with_stats(
        reader: &mut GtfsInputReader,
        stats: &mut LoadStats,
    ) -> Result<Self, GtfsInputError> {
        let stops = reader.read_required_csv(STOPS_FILE)?;
        let trips = reader.read_required_csv(TRIPS_FILE)?;
        let stop_times = reader.read_required_csv(STOP_TIMES_FILE)?;
        let shapes = reader.read_optional_csv(SHAPES_FILE)?;

        let feed = Self::from_tables(&stops, &trips, &stop_times, shapes.as_ref(), stats);
        debug!(
            trips = feed.trips.len(),
            shapes = feed.shapes.len(),
            ?stats,
            "resolved feed"
        );
        Ok(feed)
    }

    /// Resolves raw GTFS rows into trips with ordered, located stop-times.
    ///
    /// Rows that cannot be resolved are dropped and counted in `stats`.
    pub fn from_tables(
        stops: &CsvTable<gtfs_model::Stop>,
        trips: &CsvTable<gtfs_model::Trip>,
        stop_times: &CsvTable<gtfs_model::StopTime>,
        shapes: Option<&CsvTable<gtfs_model::Shape>>,
        stats: &mut LoadStats,
    ) -> Self {
        stats.malformed_rows += stops.dropped_rows + trips.dropped_rows + stop_times.dropped_rows;

        let (shapes, shape_refs) = match shapes {
            Some(table) => {
                stats.malformed_rows += table.dropped_rows;
                build_shapes(table, stats)
            }
            None => (Vec::new(), FxHashMap::default()),
        };

        let located_stops = locate_stops(stops, stats);

        let mut trip_index: FxHashMap<&str, usize> = FxHashMap::default();
        let mut resolved_trips = Vec::with_capacity(trips.rows.len());
        for trip in &trips.rows {
            let trip_id = trip.trip_id.trim();
            if trip_id.is_empty() {
                stats.malformed_rows += 1;
                continue;
            }
            if trip_index.contains_key(trip_id) {
                stats.duplicate_trips += 1;
                continue;
            }
            let shape = match trip.shape_id() {
                Some(shape_id) => {
                    let shape_ref = shape_refs.get(shape_id).copied();
                    if shape_ref.is_none() {
                        stats.unknown_shape_refs += 1;
                    }
                    shape_ref
                }
                None => None,
            };
            trip_index.insert(trip_id, resolved_trips.len());
            resolved_trips.push(Trip {
                id: trip_id.to_string(),
                shape,
                stop_times: Vec::new(),
            });
        }

        for stop_time in &stop_times.rows {
            let Some(&index) = trip_index.get(stop_time.trip_id.trim()) else {
                stats.orphan_stop_times += 1;
                continue;
            };
            let Some(stop) = located_stops.get(stop_time.stop_id.trim()) else {
                stats.unlocated_stop_times += 1;
                continue;
            };
            resolved_trips[index].stop_times.push(StopTime {
                stop_sequence: stop_time.stop_sequence,
                stop: Arc::clone(stop),
            });
        }
        for trip in resolved_trips.iter_mut() {
            trip.stop_times.sort_by_key(|stop_time| stop_time.stop_sequence);
        }

        Self {
            trips: resolved_trips,
            shapes,
        }
    }
}

fn build_shapes<'a>(
    table: &'a CsvTable<gtfs_model::Shape>,
    stats: &mut LoadStats,
) -> (Vec<Shape>, FxHashMap<&'a str, ShapeRef>) {
    let mut shape_refs: FxHashMap<&str, ShapeRef> = FxHashMap::default();
    let mut grouped: Vec<(&str, Vec<&gtfs_model::Shape>)> = Vec::new();
    for (index, row) in table.rows.iter().enumerate() {
        let shape_id = row.shape_id.trim();
        if shape_id.is_empty() || !row.has_valid_coordinates() {
            debug!(
                file = SHAPES_FILE,
                row = table.row_number(index),
                "dropping shape point without id or valid coordinates"
            );
            stats.invalid_shape_points += 1;
            continue;
        }
        let shape_ref = *shape_refs.entry(shape_id).or_insert_with(|| {
            grouped.push((shape_id, Vec::new()));
            ShapeRef(grouped.len() - 1)
        });
        grouped[shape_ref.0].1.push(row);
    }

    let shapes = grouped
        .into_iter()
        .map(|(shape_id, mut points)| {
            points.sort_by_key(|point| point.shape_pt_sequence);
            Shape {
                id: shape_id.to_string(),
                points: points
                    .into_iter()
                    .map(|point| Point::new(point.shape_pt_lat as f32, point.shape_pt_lon as f32))
                    .collect(),
            }
        })
        .collect();
    (shapes, shape_refs)
}

fn locate_stops<'a>(
    table: &'a CsvTable<gtfs_model::Stop>,
    stats: &mut LoadStats,
) -> FxHashMap<&'a str, Arc<Stop>> {
    let mut stops_by_id: FxHashMap<&str, &gtfs_model::Stop> = FxHashMap::default();
    for (index, stop) in table.rows.iter().enumerate() {
        let stop_id = stop.stop_id.trim();
        if stop_id.is_empty() {
            continue;
        }
        // Out-of-range coordinates drop the stop, they do not fall back to a parent.
        if stop.has_coordinates() && stop.coordinates().is_none() {
            debug!(
                file = STOPS_FILE,
                row = table.row_number(index),
                stop_id,
                "dropping stop with invalid coordinates"
            );
            stats.invalid_stop_coordinates += 1;
            continue;
        }
        stops_by_id.entry(stop_id).or_insert(stop);
    }

    stops_by_id
        .keys()
        .filter_map(|&stop_id| {
            let (lat, lon) = stop_or_parent_coordinates(&stops_by_id, stop_id)?;
            Some((
                stop_id,
                Arc::new(Stop {
                    id: stop_id.to_string(),
                    location: Point::new(lat as f32, lon as f32),
                }),
            ))
        })
        .collect()
}

fn stop_or_parent_coordinates(
    stops_by_id: &FxHashMap<&str, &gtfs_model::Stop>,
    stop_id: &str,
) -> Option<(f64, f64)> {
    let mut current_id = stop_id;
    for _ in 0..MAX_PARENT_DEPTH {
        let stop = stops_by_id.get(current_id)?;
        if let Some(coordinates) = stop.coordinates() {
            return Some(coordinates);
        }
        current_id = stop.parent_station_id()?;
    }
    None
}
