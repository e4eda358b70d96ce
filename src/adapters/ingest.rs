//! Input loaders
//!
//! Turn files on disk into the shapes the normalizer understands: a
//! [`Table`] for CSV and JSON records, plain text, or a list of pages.

use crate::anonymization::normalizer::Table;
use crate::domain::{PiiGuardError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Page separator in paged text files
pub const FORM_FEED: char = '\x0C';

/// Load a CSV file with a header row
pub fn load_csv(path: &Path) -> Result<Table> {
    let file = open(path)?;
    read_csv(file).map_err(|e| with_path(e, path))
}

/// Parse CSV from any reader
///
/// The first record is the header. Short rows are padded with empty cells;
/// a row with more fields than the header is an ingest error.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()
        .map_err(|e| PiiGuardError::Ingest(format!("CSV header error: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        return Err(PiiGuardError::Ingest("CSV input has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| PiiGuardError::Ingest(format!("CSV parse error: {e}")))?;
        if record.len() > columns.len() {
            return Err(PiiGuardError::Ingest(format!(
                "CSV row {row_idx} has {} fields but the header has {}",
                record.len(),
                columns.len()
            )));
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(Table::new(columns, rows))
}

/// Load a JSON file holding an array of flat objects
pub fn load_json(path: &Path) -> Result<Table> {
    let content = read_to_string(path)?;
    parse_json_records(&content).map_err(|e| with_path(e, path))
}

/// Parse an array of objects into a table
///
/// Columns appear in first-seen order across records (keys within one
/// record in `serde_json` map order). Strings are taken
/// as-is, `null` becomes an empty cell, and any other value (numbers, bools,
/// nested arrays or objects) is rendered as compact JSON.
pub fn parse_json_records(content: &str) -> Result<Table> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| PiiGuardError::Ingest(format!("JSON parse error: {e}")))?;

    let Value::Array(records) = value else {
        return Err(PiiGuardError::Ingest(
            "JSON input must be an array of objects".to_string(),
        ));
    };

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut objects = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let Value::Object(map) = record else {
            return Err(PiiGuardError::Ingest(format!(
                "JSON record {idx} is not an object"
            )));
        };
        for key in map.keys() {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(key.clone());
            }
        }
        objects.push(map);
    }

    let rows = objects
        .into_iter()
        .map(|map| {
            let mut row = vec![String::new(); columns.len()];
            for (key, value) in map {
                if let Some(&col) = index.get(&key) {
                    row[col] = cell_text(value);
                }
            }
            row
        })
        .collect();

    Ok(Table::new(columns, rows))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Load a plain text document
pub fn load_text(path: &Path) -> Result<String> {
    read_to_string(path)
}

/// Load a paged text document, pages separated by form feed
pub fn load_pages(path: &Path) -> Result<Vec<String>> {
    Ok(split_pages(&read_to_string(path)?))
}

/// Split text into pages on form feed
///
/// A trailing separator does not start an extra page.
pub fn split_pages(text: &str) -> Vec<String> {
    let text = text.strip_suffix(FORM_FEED).unwrap_or(text);
    text.split(FORM_FEED).map(str::to_string).collect()
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path)
        .map_err(|e| PiiGuardError::Ingest(format!("Failed to open {}: {e}", path.display())))
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PiiGuardError::Ingest(format!("Failed to read {}: {e}", path.display())))
}

fn with_path(error: PiiGuardError, path: &Path) -> PiiGuardError {
    match error {
        PiiGuardError::Ingest(msg) => PiiGuardError::Ingest(format!("{}: {msg}", path.display())),
        other => other,
    }
}
