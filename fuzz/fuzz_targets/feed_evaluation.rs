#![no_main]
use libfuzzer_sys::fuzz_target;
use gtfs_shape_eval_core::{evaluate_feed, CsvTable, Feed, LoadStats};
use gtfs_shape_eval_model::{Shape, Stop, StopTime, Trip};
use arbitrary::Arbitrary;

#[derive(Debug, Arbitrary)]
struct FuzzData {
    stops: Vec<StopData>,
    trips: Vec<TripData>,
    stop_times: Vec<StopTimeData>,
    shape_points: Vec<ShapePointData>,
    max_distance: u16,
}

#[derive(Debug, Arbitrary)]
struct StopData {
    stop_id: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    parent_station: Option<u8>,
}

#[derive(Debug, Arbitrary)]
struct TripData {
    trip_id: u8,
    shape_id: Option<u8>,
}

#[derive(Debug, Arbitrary)]
struct StopTimeData {
    trip_id: u8,
    stop_id: u8,
    stop_sequence: u32,
}

#[derive(Debug, Arbitrary)]
struct ShapePointData {
    shape_id: u8,
    lat: f64,
    lon: f64,
    sequence: u32,
}

fn table<T>(rows: Vec<T>) -> CsvTable<T> {
    CsvTable {
        rows,
        ..CsvTable::default()
    }
}

fuzz_target!(|data: FuzzData| {
    let stops = data
        .stops
        .iter()
        .map(|stop| Stop {
            stop_id: format!("S{}", stop.stop_id),
            stop_lat: stop.lat,
            stop_lon: stop.lon,
            parent_station: stop.parent_station.map(|id| format!("S{}", id)),
            ..Default::default()
        })
        .collect();
    let trips = data
        .trips
        .iter()
        .map(|trip| Trip {
            trip_id: format!("T{}", trip.trip_id),
            shape_id: trip.shape_id.map(|id| format!("SH{}", id)),
            ..Default::default()
        })
        .collect();
    let stop_times = data
        .stop_times
        .iter()
        .map(|stop_time| StopTime {
            trip_id: format!("T{}", stop_time.trip_id),
            stop_id: format!("S{}", stop_time.stop_id),
            stop_sequence: stop_time.stop_sequence,
            ..Default::default()
        })
        .collect();
    let shapes = table(
        data.shape_points
            .iter()
            .map(|point| Shape {
                shape_id: format!("SH{}", point.shape_id),
                shape_pt_lat: point.lat,
                shape_pt_lon: point.lon,
                shape_pt_sequence: point.sequence,
                ..Default::default()
            })
            .collect(),
    );

    let feed = Feed::from_tables(
        &table(stops),
        &table(trips),
        &table(stop_times),
        Some(&shapes),
        &mut LoadStats::default(),
    );
    let tally = evaluate_feed(&feed, f64::from(data.max_distance));
    assert_eq!(tally.total(), feed.trips.len());
});
