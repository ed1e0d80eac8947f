use gtfs_shape_eval_core::{
    discover_feed_sources, run, Classification, EvaluationConfig, Feed, FeedEvaluator,
    FeedLoader, GtfsFeedLoader, GtfsInput, GtfsInputError, RunError,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .unwrap()
        .parent() // root
        .unwrap()
        .to_path_buf()
}

fn conformance_root() -> PathBuf {
    project_root().join("test-gtfs-feeds").join("conformance")
}

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
}

fn zip_feed_dir(feed_dir: &Path, zip_path: &Path, folder: &str) {
    let file = fs::File::create(zip_path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    for name in ["stops.txt", "trips.txt", "stop_times.txt", "shapes.txt"] {
        let contents = fs::read(feed_dir.join(name)).expect("read fixture");
        writer
            .start_file(format!("{}{}", folder, name), zip::write::FileOptions::default())
            .expect("start file");
        writer.write_all(&contents).expect("write entry");
    }
    writer.finish().expect("finish zip");
}

#[test]
fn test_line_feed_classification() {
    let feed_path = conformance_root().join("line-feed");
    assert!(feed_path.exists(), "line feed not found at {:?}", feed_path);

    let input = GtfsInput::from_path(&feed_path).expect("Failed to create input");
    let feed = Feed::from_input(&input).expect("Failed to load feed");
    let mut evaluator = FeedEvaluator::new(&feed);

    let classes: Vec<(String, Classification)> = feed
        .trips
        .iter()
        .map(|trip| (trip.id.clone(), evaluator.classify_trip(trip, 250.0)))
        .collect();

    assert_eq!(
        classes,
        vec![
            ("T_OK".to_string(), Classification::Ok),
            ("T_FAR".to_string(), Classification::Suspicious),
            ("T_DEG".to_string(), Classification::Degenerate),
            ("T_NOSHAPE".to_string(), Classification::NoShape),
            ("T_UNKNOWN".to_string(), Classification::NoShape),
        ]
    );
    // Both trips on "line" share one projection, "tri" is never projected.
    assert_eq!(evaluator.cache().len(), 1);
}

#[test]
fn test_conformance_run() {
    let sources = discover_feed_sources(&[conformance_root()]);
    assert_eq!(
        sources,
        vec![
            conformance_root().join("line-feed"),
            conformance_root().join("missing-stop-times"),
            conformance_root().join("no-shapes"),
        ]
    );

    let report = run(&sources, &GtfsFeedLoader, &EvaluationConfig::default())
        .expect("run should succeed");

    let counters = report.counters;
    assert_eq!(counters.feeds_analyzed, 2);
    assert_eq!(counters.feeds_with_shapes, 1);
    assert_eq!(counters.trips_analyzed, 7);
    assert_eq!(counters.ok, 1);
    assert_eq!(counters.suspicious, 1);
    assert_eq!(counters.degenerate, 1);
    assert_eq!(counters.no_shape, 4);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].path,
        conformance_root().join("missing-stop-times")
    );
    assert!(report.failures[0].message.contains("stop_times.txt"));

    let text = report.to_string();
    assert!(text.starts_with("Analyzed 2 feeds with 7 trips\n"));
    assert!(text.contains("1 feeds had shapes (50.00 %)"));
}

#[test]
fn test_larger_threshold_accepts_far_stop() {
    let sources = vec![conformance_root().join("line-feed")];
    let config = EvaluationConfig {
        max_distance_meters: 200_000.0,
    };

    let report = run(&sources, &GtfsFeedLoader, &config).expect("run should succeed");

    assert_eq!(report.counters.ok, 2);
    assert_eq!(report.counters.suspicious, 0);
}

#[test]
fn test_zip_feeds_and_broken_archive() {
    let root = temp_dir("gtfs_shape_eval_zip_run");
    let nested = root.join("agencies");
    fs::create_dir_all(&nested).expect("create dir");
    zip_feed_dir(
        &conformance_root().join("line-feed"),
        &nested.join("line.zip"),
        "gtfs/",
    );
    fs::write(root.join("broken.zip"), "not a zip archive").expect("write file");

    let sources = discover_feed_sources(&[&root]);
    assert_eq!(sources, vec![nested.join("line.zip"), root.join("broken.zip")]);

    let loader = GtfsFeedLoader;
    let err = loader.load(&root.join("broken.zip")).unwrap_err();
    assert!(matches!(err, GtfsInputError::ZipArchive { .. }));

    let report = run(&sources, &loader, &EvaluationConfig::default()).expect("run");
    assert_eq!(report.counters.feeds_analyzed, 1);
    assert_eq!(report.counters.trips_analyzed, 5);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, root.join("broken.zip"));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_partial_feed_is_reported_as_skipped() {
    let root = temp_dir("gtfs_shape_eval_partial");
    let partial = root.join("stops-only");
    fs::create_dir_all(&partial).expect("create dir");
    fs::write(
        partial.join("stops.txt"),
        "stop_id,stop_lat,stop_lon\nA,52.52,13.405\n",
    )
    .expect("write file");

    let sources = discover_feed_sources(&[&root]);
    assert_eq!(sources, vec![partial.clone()]);

    let report = run(&sources, &GtfsFeedLoader, &EvaluationConfig::default()).expect("run");
    assert_eq!(report.counters.feeds_analyzed, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, partial);
    assert!(report.failures[0].message.contains("trips.txt"));
    assert!(report.to_string().contains("Skipped 1 feeds:"));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_polar_and_out_of_range_stops() {
    let root = temp_dir("gtfs_shape_eval_polar");
    fs::create_dir_all(&root).expect("create dir");
    fs::write(
        root.join("stops.txt"),
        "stop_id,stop_lat,stop_lon\nNORTH,90,0.5\nSOUTH,-90,0.5\nBAD,135,0.5\nNEAR,0,0.5\n",
    )
    .expect("write file");
    fs::write(
        root.join("trips.txt"),
        "route_id,service_id,trip_id,shape_id\n\
         R1,WK,T_NORTH,line\n\
         R1,WK,T_SOUTH,line\n\
         R1,WK,T_BAD,line\n",
    )
    .expect("write file");
    fs::write(
        root.join("stop_times.txt"),
        "trip_id,stop_id,stop_sequence\n\
         T_NORTH,NEAR,1\nT_NORTH,NORTH,2\nT_NORTH,NEAR,3\n\
         T_SOUTH,NEAR,1\nT_SOUTH,SOUTH,2\nT_SOUTH,NEAR,3\n\
         T_BAD,NEAR,1\nT_BAD,BAD,2\nT_BAD,NEAR,3\nT_BAD,NEAR,4\n",
    )
    .expect("write file");
    fs::write(
        root.join("shapes.txt"),
        "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\nline,0,0,1\nline,0,1,2\n",
    )
    .expect("write file");

    let input = GtfsInput::from_path(&root).expect("input");
    let feed = Feed::from_input(&input).expect("load feed");
    let mut evaluator = FeedEvaluator::new(&feed);
    let classes: Vec<Classification> = feed
        .trips
        .iter()
        .map(|trip| evaluator.classify_trip(trip, 250.0))
        .collect();

    // T_BAD loses its out-of-range stop and keeps the three on the line.
    assert_eq!(feed.trips[2].stop_times.len(), 3);
    assert_eq!(
        classes,
        vec![
            Classification::Suspicious,
            Classification::Suspicious,
            Classification::Ok,
        ]
    );

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_no_sources() {
    let root = temp_dir("gtfs_shape_eval_empty");
    fs::create_dir_all(&root).expect("create dir");

    let sources = discover_feed_sources(&[&root]);
    let err = run(&sources, &GtfsFeedLoader, &EvaluationConfig::default()).unwrap_err();
    assert!(matches!(err, RunError::NoInput));

    fs::remove_dir_all(&root).ok();
}
