//! Scan command implementation
//!
//! This module implements the `scan` command: load a file, detect and
//! redact PII, then write the redacted copy, a findings table and a report.

use super::{
    build_engine, exit_code_for, load_configuration, register_rules, EXIT_CONFIG, EXIT_FATAL,
    EXIT_FINDINGS, EXIT_OK, EXIT_PARTIAL,
};
use crate::adapters::ingest;
use crate::anonymization::export::write_table_csv;
use crate::anonymization::{
    redact_table, AnonymizedResult, ExportFormat, FindingsTable, NormalizedSegment,
    SegmentNormalizer, Table,
};
use crate::domain::{PiiGuardError, Result};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

/// Input file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// CSV with a header row
    Csv,
    /// JSON array of flat objects
    Json,
    /// Plain text, one document
    Text,
    /// Text with pages separated by form feed
    Pages,
}

impl InputFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Findings table format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl From<ReportFormat> for ExportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Csv => ExportFormat::Csv,
            ReportFormat::Json => ExportFormat::Json,
        }
    }
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// File to scan
    pub input: String,

    /// Input format (guessed from the extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<InputFormat>,

    /// Write the redacted copy to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the findings table to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Findings table format
    #[arg(long, value_enum, default_value = "csv")]
    pub report_format: ReportFormat,

    /// Extra whitelist rule, ENTITY=value1,value2 (repeatable)
    #[arg(long, value_name = "ENTITY=VALUES")]
    pub whitelist: Vec<String>,

    /// Extra regex rule, ENTITY=pattern (repeatable)
    #[arg(long, value_name = "ENTITY=PATTERN")]
    pub regex: Vec<String>,

    /// Detect and report without changing text
    #[arg(long)]
    pub dry_run: bool,

    /// Print the scan summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 when any PII is found
    #[arg(long)]
    pub fail_on_findings: bool,
}

/// Loaded input, kept so the redacted copy can mirror its shape
enum Loaded {
    Table(Table),
    Document(Option<NormalizedSegment>),
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, "Starting scan command");

        let mut config = match load_configuration(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.anonymization.dry_run = true;
        }

        let engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create anonymization engine");
                eprintln!("Failed to initialize scan: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let mut session = engine.session();
        if let Err(e) = register_rules(&mut session, &config.rules, &self.whitelist, &self.regex) {
            tracing::error!(error = %e, "Rule registration failed");
            eprintln!("Invalid rule: {e}");
            engine.shutdown().await?;
            return Ok(EXIT_CONFIG);
        }

        let path = Path::new(&self.input);
        let format = self.format.unwrap_or_else(|| InputFormat::from_path(path));
        let loaded = match load_input(path, format) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load input");
                eprintln!("Failed to load input: {e}");
                engine.shutdown().await?;
                return Ok(EXIT_FATAL);
            }
        };

        let normalizer = SegmentNormalizer;
        let segments = match &loaded {
            Loaded::Table(table) => normalizer.normalize_table(table),
            Loaded::Document(segment) => segment.iter().cloned().collect(),
        };

        let scan = session.process_with_report(segments).await;
        engine.shutdown().await?;
        let (results, report) = scan?;

        if let Some(ref output) = self.output {
            write_redacted(output, &loaded, &results, format)?;
            println!("✅ Redacted output written to {}", output.display());
        }

        if let Some(ref report_path) = self.report {
            FindingsTable::from_results(&results)
                .write_to_file(report_path, self.report_format.into())?;
            println!("✅ Findings table written to {}", report_path.display());
        }

        if self.json {
            println!("{}", report.format_json()?);
        } else {
            println!("{}", report.format_console());
        }

        let exit_code = if report.has_failures() {
            EXIT_PARTIAL
        } else if self.fail_on_findings && report.total_findings > 0 {
            EXIT_FINDINGS
        } else {
            EXIT_OK
        };

        Ok(exit_code)
    }
}

fn load_input(path: &Path, format: InputFormat) -> Result<Loaded> {
    let label = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input");
    let normalizer = SegmentNormalizer;

    Ok(match format {
        InputFormat::Csv => Loaded::Table(ingest::load_csv(path)?),
        InputFormat::Json => Loaded::Table(ingest::load_json(path)?),
        InputFormat::Text => {
            Loaded::Document(normalizer.normalize_document(label, &ingest::load_text(path)?))
        }
        InputFormat::Pages => {
            Loaded::Document(normalizer.normalize_pages(label, &ingest::load_pages(path)?))
        }
    })
}

/// Write the redacted copy in the shape of the input
///
/// Paged documents are written as one text with pages joined by the
/// normalizer's separator.
fn write_redacted(
    output: &Path,
    loaded: &Loaded,
    results: &[AnonymizedResult],
    format: InputFormat,
) -> Result<()> {
    let export_error =
        |e: std::io::Error| PiiGuardError::Export(format!("Failed to write {}: {e}", output.display()));

    match loaded {
        Loaded::Table(table) => {
            let redacted = redact_table(table, results);
            if format == InputFormat::Json {
                let json = serde_json::to_string_pretty(&table_records(&redacted))?;
                std::fs::write(output, json).map_err(export_error)
            } else {
                let file = std::fs::File::create(output).map_err(export_error)?;
                write_table_csv(&redacted, file)
            }
        }
        Loaded::Document(segment) => {
            let text = results
                .first()
                .map(|result| result.text.as_str())
                .or_else(|| segment.as_ref().map(|s| s.text.as_str()))
                .unwrap_or_default();
            std::fs::write(output, text).map_err(export_error)
        }
    }
}

fn table_records(table: &Table) -> Vec<serde_json::Map<String, serde_json::Value>> {
    table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(col, value)| (table.column_name(col), serde_json::Value::String(value.clone())))
                .collect()
        })
        .collect()
}
