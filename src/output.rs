//! Result types returned by extraction and rendering runs.
//!
//! Both directions report per-unit outcomes (one [`FileReport`] per input
//! file, one [`RowResult`] per row) so a caller can see partial success
//! instead of losing the run to one bad unit.

use crate::error::{RecordError, RowError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Extraction ───────────────────────────────────────────────────────────

/// Outcome of converting one input file to CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// The file that was read.
    pub input: PathBuf,

    /// The CSV written, if any rows were found.
    pub output: Option<PathBuf>,

    /// Number of CSV rows written.
    pub rows: usize,

    /// Name of the extraction shape that produced the rows.
    pub shape: String,

    /// Record-level problems that were skipped over.
    pub record_errors: Vec<RecordError>,

    /// File-level failure (unparsable JSON, CSV write error). `None` on success.
    pub error: Option<String>,
}

impl FileReport {
    pub(crate) fn failed(input: PathBuf, error: String) -> Self {
        Self {
            input,
            output: None,
            rows: 0,
            shape: String::new(),
            record_errors: Vec::new(),
            error: Some(error),
        }
    }

    /// `true` when a CSV was written.
    pub fn is_written(&self) -> bool {
        self.output.is_some()
    }
}

/// Outcome of a whole extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// One entry per input file, in processing order.
    pub files: Vec<FileReport>,
}

impl ExtractionReport {
    /// CSV files that were written.
    pub fn written(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_written())
    }

    /// Files that failed outright.
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.error.is_some())
    }

    /// Total CSV rows written across all files.
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Outcome of rendering one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    /// 1-based row number in the dataset.
    pub row_num: usize,

    /// File the row was (or would have been) written to.
    pub path: PathBuf,

    /// Pages in the row's PDF (0 on failure).
    pub pages: usize,

    /// Fields drawn on the page(s).
    pub fields: usize,

    /// Failure, if the row could not be rendered.
    pub error: Option<RowError>,
}

/// Aggregate counters for a render run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Rows in the loaded dataset.
    pub dataset_rows: usize,
    /// Columns in the loaded dataset.
    pub dataset_columns: usize,
    /// 0-based indices of the rendered columns.
    pub selected_columns: Vec<usize>,
    /// Rows attempted.
    pub attempted_rows: usize,
    /// Rows that produced a PDF.
    pub rendered_rows: usize,
    /// Rows that failed.
    pub failed_rows: usize,
    /// Whether a signature image was stamped.
    pub signature_used: bool,
    /// Wall-clock time of the run.
    pub total_duration_ms: u64,
}

/// Outcome of a whole render run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutput {
    /// One entry per attempted row, in row order.
    pub rows: Vec<RowResult>,
    /// The summary file, when it could be written.
    pub summary_path: Option<PathBuf>,
    /// Aggregate counters.
    pub stats: RenderStats,
}

impl RenderOutput {
    /// Paths of the PDFs that were written.
    pub fn generated_files(&self) -> Vec<&PathBuf> {
        self.rows
            .iter()
            .filter(|r| r.error.is_none())
            .map(|r| &r.path)
            .collect()
    }
}
