// ⚠️ Error Types - input-format failures that abort a run
//
// Data-quality conditions (empty roster names, empty annotations, noise
// tokens) are NOT errors: they are skipped inside the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion and processing
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// File could not be opened or read
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spreadsheet container is corrupt or unreadable
    #[error("Failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// CSV sheet is malformed
    #[error("Failed to parse CSV sheet {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Neither a spreadsheet file nor a directory of CSV sheets
    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Required column '{column}' not found in sheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write CSV report: {0}")]
    ReportCsv(#[from] csv::Error),

    #[error("Failed to write JSON report: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Failed to write xlsx report: {0}")]
    ReportXlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl IngestError {
    /// Whether the input itself is bad (corrupt file, wrong layout) rather
    /// than the environment (I/O, configuration, report writing)
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            IngestError::Workbook { .. }
                | IngestError::Csv { .. }
                | IngestError::MissingSheet { .. }
                | IngestError::MissingColumn { .. }
                | IngestError::UnsupportedFormat(_)
        )
    }
}
