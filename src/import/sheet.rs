//! Tabular row decoding
//!
//! Turns an uploaded CSV payload into an ordered sequence of loosely-typed
//! row records. The first row is a header naming columns; recognized
//! columns are `code`, `description`, `quantity`, and any number of
//! `loc_<NAME>` columns carrying per-location quantities. Unrecognized
//! columns are ignored. Cell values stay raw strings here; numeric coercion
//! is the upsert engine's concern.

use thiserror::Error;

/// Column header prefix marking a per-location quantity column.
pub const LOCATION_COLUMN_PREFIX: &str = "loc_";

/// One decoded data row. `line` is the 1-based data row number matching the
/// source file, used for error reporting.
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub line: u64,
    pub code: String,
    pub description: String,
    pub quantity: String,
    pub locations: Vec<(String, String)>,
}

/// Decode failures. Any of these is run-fatal: no rows are processed.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("file is not valid tabular data: {0}")]
    Malformed(#[from] csv::Error),
    #[error("header row is missing a 'code' column")]
    MissingCodeColumn,
}

fn strip_location_prefix(header: &str) -> Option<&str> {
    let prefix_len = LOCATION_COLUMN_PREFIX.len();
    if header.len() > prefix_len
        && header[..prefix_len].eq_ignore_ascii_case(LOCATION_COLUMN_PREFIX)
    {
        Some(&header[prefix_len..])
    } else {
        None
    }
}

/// Decode the whole payload into ordered rows.
pub fn decode_rows(data: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = reader.headers()?.clone();

    let mut code_idx = None;
    let mut description_idx = None;
    let mut quantity_idx = None;
    let mut location_columns: Vec<(usize, String)> = Vec::new();

    for (idx, raw) in headers.iter().enumerate() {
        let name = raw.trim();
        if name.eq_ignore_ascii_case("code") {
            code_idx = Some(idx);
        } else if name.eq_ignore_ascii_case("description") {
            description_idx = Some(idx);
        } else if name.eq_ignore_ascii_case("quantity") {
            quantity_idx = Some(idx);
        } else if let Some(location) = strip_location_prefix(name) {
            let location = location.trim();
            if !location.is_empty() {
                location_columns.push((idx, location.to_string()));
            }
        }
    }

    let code_idx = code_idx.ok_or(SheetError::MissingCodeColumn)?;

    let cell = |record: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
    };

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        rows.push(SheetRow {
            line: (index + 1) as u64,
            code: record.get(code_idx).unwrap_or("").to_string(),
            description: cell(&record, description_idx),
            quantity: cell(&record, quantity_idx),
            locations: location_columns
                .iter()
                .map(|(idx, name)| {
                    (name.clone(), record.get(*idx).unwrap_or("").to_string())
                })
                .collect(),
        });
    }

    Ok(rows)
}
