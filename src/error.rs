//! Error types for the edgequake-rowkit library.
//!
//! Two tiers of error reflect the two ways a run can go wrong:
//!
//! * [`RowKitError`] (**fatal**): the run cannot proceed at all (input
//!   missing, CSV source unreachable, row range out of bounds). Returned as
//!   `Err(RowKitError)` from the top-level `extract_*` / `render_*` functions.
//!
//! * [`RowError`] and [`RecordError`] (**non-fatal**): a single PDF row or a
//!   single embedded HAR body failed, every other unit is fine. Stored in
//!   [`crate::output::RowResult`] and [`crate::output::FileReport`] so callers
//!   can inspect partial success.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-rowkit library.
#[derive(Debug, Error)]
pub enum RowKitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// No Drive file id could be found in a sharing URL.
    #[error("Could not extract a file id from '{url}'\nExpected '/d/<id>/' or '?id=<id>'.")]
    DriveIdNotFound { url: String },

    /// The top-level document is not valid JSON.
    #[error("Invalid JSON in '{path}': {detail}")]
    InvalidJson { path: PathBuf, detail: String },

    // ── Dataset errors ────────────────────────────────────────────────────
    /// The CSV source could not be parsed.
    #[error("Failed to parse CSV from '{source_name}': {detail}")]
    CsvParse { source_name: String, detail: String },

    /// The CSV source has no header row.
    #[error("CSV from '{source_name}' has no header row")]
    EmptyDataset { source_name: String },

    /// Requested row range does not fit the dataset.
    #[error("Row range {start}-{end} is invalid. CSV has {total} rows (1-{total})")]
    InvalidRowRange { start: usize, end: usize, total: usize },

    /// Column selection produced no columns to render.
    #[error("No columns selected (dataset has {column_count} columns)")]
    NoColumnsSelected { column_count: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV writer rejected a record.
    #[error("Failed to write CSV '{path}': {detail}")]
    CsvWrite { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single rendered row.
///
/// The run continues with the next row; PDFs already written are kept.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RowError {
    /// Layout or PDF assembly failed.
    #[error("Row {row}: rendering failed: {detail}")]
    RenderFailed { row: usize, detail: String },

    /// The PDF was built but could not be saved.
    #[error("Row {row}: could not write '{path}': {detail}")]
    WriteFailed {
        row: usize,
        path: String,
        detail: String,
    },
}

impl RowError {
    /// 1-based row number the error belongs to.
    pub fn row(&self) -> usize {
        match self {
            RowError::RenderFailed { row, .. } | RowError::WriteFailed { row, .. } => *row,
        }
    }
}

/// A non-fatal error for one record source inside a document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum RecordError {
    /// A HAR response body could not be decoded or parsed as JSON.
    #[error("Entry {entry}: response body is not valid JSON: {detail}")]
    MalformedBody { entry: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_row_range_display() {
        let e = RowKitError::InvalidRowRange {
            start: 48,
            end: 53,
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("48-53"), "got: {msg}");
        assert!(msg.contains("10 rows"), "got: {msg}");
    }

    #[test]
    fn download_timeout_display() {
        let e = RowKitError::DownloadTimeout {
            url: "https://example.org/data.csv".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("data.csv"));
    }

    #[test]
    fn row_error_carries_row_number() {
        let e = RowError::RenderFailed {
            row: 7,
            detail: "boom".into(),
        };
        assert_eq!(e.row(), 7);
        assert!(e.to_string().starts_with("Row 7"));

        let e = RowError::WriteFailed {
            row: 3,
            path: "pdfs/a.pdf".into(),
            detail: "disk full".into(),
        };
        assert_eq!(e.row(), 3);
        assert!(e.to_string().contains("pdfs/a.pdf"));
    }

    #[test]
    fn record_error_display() {
        let e = RecordError::MalformedBody {
            entry: 4,
            detail: "expected value".into(),
        };
        assert!(e.to_string().contains("Entry 4"));
    }
}
