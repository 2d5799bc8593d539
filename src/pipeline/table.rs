//! In-memory tabular dataset loaded from CSV text.
//!
//! Columns are addressed by position only; header names are carried for
//! labelling but never used to select data.

use crate::error::RowKitError;
use tracing::debug;

/// A parsed CSV: header row plus data rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Build a dataset directly from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse CSV text. The first record is the header row.
    ///
    /// Ragged rows are accepted; short rows read as empty cells. A leading
    /// UTF-8 byte-order mark is ignored.
    pub fn from_csv_str(text: &str, source_name: &str) -> Result<Self, RowKitError> {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| RowKitError::CsvParse {
                source_name: source_name.to_string(),
                detail: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(RowKitError::EmptyDataset {
                source_name: source_name.to_string(),
            });
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| RowKitError::CsvParse {
                source_name: source_name.to_string(),
                detail: format!("record {}: {}", idx + 1, e),
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            "Parsed {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            source_name
        );
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header label of column `col` (0-based).
    pub fn header(&self, col: usize) -> &str {
        self.headers.get(col).map(String::as_str).unwrap_or("")
    }

    /// Cell at (`row`, `col`), both 0-based. Absent cells are `""`.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Non-empty (after trimming) value of a cell.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        let v = self.cell(row, col).trim();
        (!v.is_empty()).then_some(v)
    }
}
