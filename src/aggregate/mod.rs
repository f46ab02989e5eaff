//! Aggregation and export
//!
//! Pure transformations over store rows: CSV and JSON serialization of a
//! study export, and summary statistics from raw counts. Nothing here
//! touches storage.

pub mod csv;
pub mod json;
mod stats;

pub use stats::{StatusBreakdown, StudyStats};

use std::fmt;
use std::str::FromStr;

use crate::store::ExportRow;

/// Export serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Attachment file name for a study export
    pub fn file_name(&self, study_id: &str) -> String {
        format!("study_{}_export.{}", sanitize_file_stem(study_id), self.as_str())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unsupported export format '{}', expected json or csv", other)),
        }
    }
}

fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Incremental encoder for a batched export.
///
/// `begin`, any number of `encode_batch` calls, then `finish`; the
/// concatenated output is a complete document in the chosen format.
#[derive(Debug)]
pub struct ExportEncoder {
    format: ExportFormat,
    json: json::JsonArrayWriter,
    rows: usize,
}

impl ExportEncoder {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            json: json::JsonArrayWriter::new(),
            rows: 0,
        }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    pub fn begin(&self) -> String {
        match self.format {
            ExportFormat::Json => self.json.open(),
            ExportFormat::Csv => csv::render_header(),
        }
    }

    pub fn encode_batch(&mut self, rows: &[ExportRow]) -> String {
        let mut out = String::new();
        match self.format {
            ExportFormat::Json => self.json.push_rows(rows, &mut out),
            ExportFormat::Csv => csv::render_rows(rows, &mut out),
        }
        self.rows += rows.len();
        out
    }

    pub fn finish(&self) -> String {
        match self.format {
            ExportFormat::Json => self.json.close(),
            ExportFormat::Csv => String::new(),
        }
    }

    /// Rows encoded so far
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Renders a complete export in one pass.
pub fn render_export(format: ExportFormat, rows: &[ExportRow]) -> String {
    let mut encoder = ExportEncoder::new(format);
    let mut out = encoder.begin();
    out.push_str(&encoder.encode_batch(rows));
    out.push_str(&encoder.finish());
    out
}
