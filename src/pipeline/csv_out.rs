//! CSV writer for flattened records.
//!
//! The header is the sorted union of every record's keys; records missing a
//! key get an empty cell. The file is written next to its destination and
//! renamed into place, so a failed run never leaves a truncated CSV behind.

use crate::error::RowKitError;
use crate::pipeline::flatten::{cell_text, Record};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Sorted union of keys across all records.
pub fn header(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Render records as CSV text (header row first).
pub fn to_csv_string(records: &[Record]) -> Result<String, RowKitError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_into(&mut writer, records).map_err(|e| RowKitError::CsvWrite {
        path: "<memory>".into(),
        detail: e.to_string(),
    })?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RowKitError::Internal(format!("CSV buffer flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| RowKitError::Internal(e.to_string()))
}

/// Write records to `path`. Returns the number of data rows written.
///
/// No-op (with a warning) if there is nothing to write.
pub fn write_records(records: &[Record], path: &Path) -> Result<usize, RowKitError> {
    let fields = header(records);
    if records.is_empty() || fields.is_empty() {
        warn!("No data to save for {}", path.display());
        return Ok(0);
    }

    let tmp_path = path.with_extension("csv.tmp");
    let result = csv::Writer::from_path(&tmp_path)
        .and_then(|mut writer| {
            write_into(&mut writer, records)?;
            writer.flush()?;
            Ok(())
        })
        .map_err(|e| RowKitError::CsvWrite {
            path: path.to_path_buf(),
            detail: e.to_string(),
        });

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    std::fs::rename(&tmp_path, path).map_err(|e| RowKitError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Saved {} rows to {}", records.len(), path.display());
    Ok(records.len())
}

fn write_into<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    records: &[Record],
) -> Result<(), csv::Error> {
    let fields = header(records);
    writer.write_record(&fields)?;
    for record in records {
        writer.write_record(
            fields
                .iter()
                .map(|f| record.get(f).map(cell_text).unwrap_or_default()),
        )?;
    }
    Ok(())
}
