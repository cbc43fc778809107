//! Raw dataset CSV ingest.
//!
//! Reads the scraped ticket CSV into `RawRecord`s:
//! - columns are looked up by header name (BOM and surrounding whitespace ignored)
//! - rows with any missing field are dropped wholesale, before parsing; a
//!   field is missing when the cell is empty or exactly one of the pandas
//!   default NA markers (whitespace-only cells are kept, then trimmed)
//! - `Price` must be an integer; a bad price fails the read with its line number

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::RawRecord;
use crate::error::IngestError;

/// Columns every raw dataset must carry.
pub const RAW_COLUMNS: [&str; 11] = [
    "Airline",
    "Date_of_Journey",
    "Source",
    "Destination",
    "Route",
    "Dep_Time",
    "Arrival_Time",
    "Duration",
    "Total_Stops",
    "Additional_Info",
    "Price",
];

/// Cell values treated as missing, on top of empty cells (pandas' default `na_values`).
pub const NA_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A raw record with the 1-based CSV line it came from.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: usize,
    pub record: RawRecord,
}

/// Ingest output: complete rows + bookkeeping about dropped ones.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub rows: Vec<RawRow>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Read the raw dataset file at `path`.
pub fn read_raw_dataset(path: &Path) -> Result<RawDataset, IngestError> {
    let file = File::open(path)?;
    let dataset = read_raw_records(file)?;
    if dataset.rows.is_empty() {
        return Err(IngestError::EmptyDataset(path.display().to_string()));
    }
    Ok(dataset)
}

/// Read raw records from any CSV source. An empty result is not an error here.
pub fn read_raw_records<R: Read>(reader: R) -> Result<RawDataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut rows = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header on line 2.
        let line = idx + 2;
        rows_read += 1;

        let record = result?;
        let Some(fields) = complete_fields(&record, &columns) else {
            rows_dropped += 1;
            continue;
        };

        let record = to_raw_record(fields).map_err(|e| e.at_line(line))?;
        rows.push(RawRow { line, record });
    }

    if rows_dropped > 0 {
        tracing::info!(rows_read, rows_dropped, "dropped rows with missing fields");
    }

    Ok(RawDataset {
        rows,
        rows_read,
        rows_dropped,
    })
}

fn resolve_columns(headers: &StringRecord) -> Result<[usize; 11], IngestError> {
    let header_map: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}'), idx))
        .collect();

    let mut columns = [0usize; 11];
    for (slot, name) in columns.iter_mut().zip(RAW_COLUMNS) {
        *slot = *header_map.get(name).ok_or(IngestError::MissingColumn(name))?;
    }
    Ok(columns)
}

/// The row's values in `RAW_COLUMNS` order, or `None` if any is missing.
fn complete_fields<'a>(record: &'a StringRecord, columns: &[usize; 11]) -> Option<[&'a str; 11]> {
    let mut fields = [""; 11];
    for (slot, &idx) in fields.iter_mut().zip(columns) {
        let cell = record.get(idx)?;
        if cell.is_empty() || NA_MARKERS.contains(&cell) {
            return None;
        }
        *slot = cell.trim();
    }
    Some(fields)
}

fn to_raw_record(fields: [&str; 11]) -> Result<RawRecord, IngestError> {
    let [
        airline,
        date_of_journey,
        source,
        destination,
        route,
        dep_time,
        arrival_time,
        duration,
        total_stops,
        additional_info,
        price,
    ] = fields;

    let price = price
        .parse::<i64>()
        .map_err(|e| IngestError::malformed("Price", price, format!("expected an integer ({e})")))?;

    Ok(RawRecord {
        airline: airline.to_string(),
        date_of_journey: date_of_journey.to_string(),
        source: source.to_string(),
        destination: destination.to_string(),
        route: route.to_string(),
        dep_time: dep_time.to_string(),
        arrival_time: arrival_time.to_string(),
        duration: duration.to_string(),
        total_stops: total_stops.to_string(),
        additional_info: additional_info.to_string(),
        price,
    })
}
