#![no_main]
use libfuzzer_sys::fuzz_target;
use gtfs_shape_eval_core::geo::{min_distance_to_polyline, perpendicular_distance};
use gtfs_shape_eval_core::{PlanarPoint, Point, Projection, WebMercator};
use arbitrary::Arbitrary;

#[derive(Debug, Arbitrary)]
struct FuzzData {
    stop: (f32, f32),
    shape: Vec<(f32, f32)>,
}

fn in_range(lat: f32, lon: f32) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

fuzz_target!(|data: FuzzData| {
    let (lat, lon) = data.stop;
    if !in_range(lat, lon) || !data.shape.iter().all(|&(lat, lon)| in_range(lat, lon)) {
        return;
    }

    let projection = WebMercator;
    let stop = projection.convert(Point::new(lat, lon));
    let polyline: Vec<PlanarPoint> = data
        .shape
        .iter()
        .map(|&(lat, lon)| projection.convert(Point::new(lat, lon)))
        .collect();

    let distance = min_distance_to_polyline(stop, &polyline);
    if polyline.len() < 2 {
        assert!(distance.is_infinite());
        return;
    }
    assert!(distance.is_finite() && distance >= 0.0);
    for segment in polyline.windows(2) {
        assert!(distance <= perpendicular_distance(stop, segment[0], segment[1]));
    }
});
