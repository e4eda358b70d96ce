//! Export artifacts built from anonymized results
//!
//! Everything here reads offsets and matched text straight from
//! [`AnonymizedResult`]; nothing is re-detected or re-derived.

use crate::anonymization::models::{AnonymizedResult, Origin};
use crate::anonymization::normalizer::Table;
use crate::domain::{PiiGuardError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Output format for a findings table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// One row of the findings table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingRow {
    pub entity_type: String,
    pub matched_text: String,
    pub score: f32,
    pub origin: String,
    /// 1-based page, for paged documents
    pub page: Option<usize>,
    pub start: usize,
    pub end: usize,
    pub source: String,
}

/// Flat table of every finding in a run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FindingsTable {
    rows: Vec<FindingRow>,
}

impl FindingsTable {
    /// Build the table from results, preserving result and finding order
    pub fn from_results(results: &[AnonymizedResult]) -> Self {
        let rows = results
            .iter()
            .flat_map(|result| {
                result.findings.iter().map(move |record| FindingRow {
                    entity_type: record.finding.entity_type().to_string(),
                    matched_text: record.matched_text.clone(),
                    score: record.finding.score(),
                    origin: result.origin.to_string(),
                    page: result.origin.page_for_offset(record.finding.start()),
                    start: record.finding.start(),
                    end: record.finding.end(),
                    source: record.finding.source().to_string(),
                })
            })
            .collect();

        Self { rows }
    }

    /// Table rows
    pub fn rows(&self) -> &[FindingRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.rows.is_empty() {
            csv_writer
                .write_record([
                    "entity_type",
                    "matched_text",
                    "score",
                    "origin",
                    "page",
                    "start",
                    "end",
                    "source",
                ])
                .map_err(export_error)?;
        }
        for row in &self.rows {
            csv_writer.serialize(row).map_err(export_error)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Render the table as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the table to `path`
    pub fn write_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| {
            PiiGuardError::Export(format!("Failed to create {}: {e}", path.display()))
        })?;

        match format {
            ExportFormat::Csv => self.write_csv(file),
            ExportFormat::Json => {
                let mut file = file;
                writeln!(file, "{}", self.to_json()?)?;
                Ok(())
            }
        }
    }
}

/// Copy of `table` with every scanned cell replaced by its redacted text
///
/// Results are matched to cells by row and column index. Cells without a
/// matching result (blank cells) are copied unchanged.
pub fn redact_table(table: &Table, results: &[AnonymizedResult]) -> Table {
    let redacted: HashMap<(usize, usize), &str> = results
        .iter()
        .filter_map(|result| match &result.origin {
            Origin::Cell { row, col, .. } => Some(((*row, *col), result.text.as_str())),
            Origin::Document { .. } => None,
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            row.iter()
                .enumerate()
                .map(|(col_idx, value)| {
                    redacted
                        .get(&(row_idx, col_idx))
                        .map(|text| text.to_string())
                        .unwrap_or_else(|| value.clone())
                })
                .collect()
        })
        .collect();

    Table::new(table.columns.clone(), rows)
}

/// Write a table as CSV with a header row
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    csv_writer
        .write_record(&table.columns)
        .map_err(export_error)?;
    for row in &table.rows {
        csv_writer.write_record(row).map_err(export_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn export_error(err: csv::Error) -> PiiGuardError {
    PiiGuardError::Export(format!("CSV write error: {err}"))
}
