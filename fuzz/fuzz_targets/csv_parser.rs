#![no_main]
use libfuzzer_sys::fuzz_target;
use gtfs_shape_eval_core::read_csv_from_reader;
use gtfs_shape_eval_model::{Shape, Stop};

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = read_csv_from_reader::<Stop, _>(data, "stops.txt") {
        assert_eq!(table.rows.len(), table.row_numbers.len());
    }
    let _ = read_csv_from_reader::<Shape, _>(data, "shapes.txt");
});
