use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::input::GtfsInputError;

/// Rows of one GTFS table that deserialized cleanly.
#[derive(Debug, Clone)]
pub struct CsvTable<T> {
    pub headers: Vec<String>,
    pub rows: Vec<T>,
    pub row_numbers: Vec<u64>,
    /// Rows that could not be read or deserialized and were left out.
    pub dropped_rows: usize,
}

impl<T> Default for CsvTable<T> {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
            row_numbers: Vec::new(),
            dropped_rows: 0,
        }
    }
}

impl<T> CsvTable<T> {
    pub fn row_number(&self, index: usize) -> u64 {
        self.row_numbers
            .get(index)
            .copied()
            .unwrap_or(index as u64 + 2)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Reads a GTFS table, dropping malformed rows instead of failing the file.
///
/// Only an unreadable header line is an error.
pub fn read_csv_from_reader<T, R>(reader: R, file: &str) -> Result<CsvTable<T>, GtfsInputError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|source| GtfsInputError::Csv {
            file: file.to_string(),
            source,
        })?
        .clone();

    let mut table = CsvTable {
        headers: headers.iter().map(str::to_string).collect(),
        ..CsvTable::default()
    };

    for (index, record) in csv_reader.records().enumerate() {
        let fallback_row = index as u64 + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!(file, row = fallback_row, error = %err, "dropping unreadable row");
                table.dropped_rows += 1;
                continue;
            }
        };
        let row_number = record
            .position()
            .map(|position| position.line())
            .unwrap_or(fallback_row);
        if record.iter().all(str::is_empty) {
            continue;
        }
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => {
                table.rows.push(row);
                table.row_numbers.push(row_number);
            }
            Err(err) => {
                debug!(file, row = row_number, error = %err, "dropping malformed row");
                table.dropped_rows += 1;
            }
        }
    }

    Ok(table)
}
