//! Rendering entry points: CSV rows to one PDF per row.
//!
//! Rows are rendered strictly one at a time. A row that fails is recorded in
//! its [`RowResult`] and the run continues; PDFs already written are kept.
//! Only problems that stop the whole run (unreachable source, unparsable CSV,
//! invalid row range, empty column selection, unwritable output directory)
//! are returned as `Err`.

use crate::config::RenderConfig;
use crate::error::{RowError, RowKitError};
use crate::output::{RenderOutput, RenderStats, RowResult};
use crate::pipeline::compose::{clean_text, collect_fields, compose_row};
use crate::pipeline::filename::FilenameAllocator;
use crate::pipeline::input;
use crate::pipeline::layout::PageGeometry;
use crate::pipeline::pdf::{render_pdf, SignatureImage};
use crate::pipeline::table::Dataset;
use std::fmt::Write as _;
use std::ops::Range;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Name of the run summary written next to the PDFs.
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// Render rows of a CSV fetched from a URL or read from a local path.
///
/// # Returns
/// `Ok(RenderOutput)` even if some rows failed (check `output.stats.failed_rows`).
///
/// # Errors
/// Returns `Err(RowKitError)` only for fatal errors:
/// - Source unreachable / not found, or not parsable as CSV
/// - Row range outside the dataset
/// - No columns selected
/// - Output directory cannot be created
pub async fn render_rows(
    source: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, RowKitError> {
    let source = source.as_ref();
    info!("Loading CSV from: {}", source);
    let text = input::load_csv_source(source, config.download_timeout_secs).await?;
    let dataset = Dataset::from_csv_str(&text, source)?;
    info!(
        "Loaded CSV with {} rows and {} columns",
        dataset.len(),
        dataset.column_count()
    );
    render_dataset(&dataset, source, config)
}

/// Synchronous wrapper around [`render_rows`].
///
/// Creates a temporary current-thread tokio runtime internally.
pub fn render_rows_sync(
    source: impl AsRef<str>,
    config: &RenderConfig,
) -> Result<RenderOutput, RowKitError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| RowKitError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(render_rows(source, config))
}

/// Render rows of an already-loaded dataset.
///
/// `source_label` is only used for logging and the summary file.
pub fn render_dataset(
    dataset: &Dataset,
    source_label: &str,
    config: &RenderConfig,
) -> Result<RenderOutput, RowKitError> {
    let total_start = Instant::now();

    // ── Step 1: Select columns and rows ──────────────────────────────────
    let columns = config.columns.to_indices(dataset.column_count());
    if columns.is_empty() {
        return Err(RowKitError::NoColumnsSelected {
            column_count: dataset.column_count(),
        });
    }
    let range = config.rows.resolve(dataset.len())?;
    debug!("Selected columns {:?}, rows {:?}", columns, range);

    // ── Step 2: Prepare output directory and signature ───────────────────
    std::fs::create_dir_all(&config.output_dir).map_err(|e| RowKitError::OutputWriteFailed {
        path: config.output_dir.clone(),
        source: e,
    })?;

    let signature = config
        .signature
        .resolve()
        .and_then(|path| SignatureImage::load(&path));
    if signature.is_some() {
        info!("Stamping signature on every PDF");
    }

    // ── Step 3: Render each row ──────────────────────────────────────────
    let total_rows = range.len();
    info!(
        "Generating PDFs for rows {} to {} ({} rows)",
        range.start + 1,
        range.end,
        total_rows
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(total_rows);
    }

    let filename_column = config.filename_source.column_index(dataset.column_count());
    let mut names = FilenameAllocator::new();
    let mut rows = Vec::with_capacity(total_rows);

    for idx in range.clone() {
        let row_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_row_start(row_num, total_rows);
        }

        let file_name = match filename_column {
            Some(col) => names.from_value(dataset.cell(idx, col), row_num),
            None => names.row_number(config.filename_source.row_prefix(), row_num),
        };
        let path = config.output_dir.join(&file_name);

        let title = config
            .include_title
            .then(|| row_title(dataset, idx, filename_column, config));

        let result = render_row(
            dataset,
            idx,
            &columns,
            title.as_deref(),
            signature.as_ref(),
            &path,
            config,
        );

        let row_result = match result {
            Ok((pages, fields)) => {
                info!("Generated {}", file_name);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_complete(row_num, total_rows, &path);
                }
                RowResult {
                    row_num,
                    path,
                    pages,
                    fields,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Row {} failed: {}", row_num, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_row_error(row_num, total_rows, &e.to_string());
                }
                RowResult {
                    row_num,
                    path,
                    pages: 0,
                    fields: 0,
                    error: Some(e),
                }
            }
        };
        rows.push(row_result);
    }

    // ── Step 4: Summary and stats ────────────────────────────────────────
    let rendered = rows.iter().filter(|r| r.error.is_none()).count();
    let failed = rows.len() - rendered;

    let summary_path = config.output_dir.join(SUMMARY_FILE_NAME);
    let summary_path = match std::fs::write(&summary_path, summary_text(source_label, &range, &rows)) {
        Ok(()) => {
            info!("Summary saved to: {}", summary_path.display());
            Some(summary_path)
        }
        Err(e) => {
            warn!("Could not write {}: {}", summary_path.display(), e);
            None
        }
    };

    let stats = RenderStats {
        dataset_rows: dataset.len(),
        dataset_columns: dataset.column_count(),
        selected_columns: columns,
        attempted_rows: rows.len(),
        rendered_rows: rendered,
        failed_rows: failed,
        signature_used: signature.is_some(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Successfully generated {} PDFs in '{}' ({} failed, {}ms)",
        rendered,
        config.output_dir.display(),
        failed,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(total_rows, rendered);
    }

    Ok(RenderOutput {
        rows,
        summary_path,
        stats,
    })
}

/// Lay out, assemble and write one row. Returns `(pages, fields)`.
fn render_row(
    dataset: &Dataset,
    idx: usize,
    columns: &[usize],
    title: Option<&str>,
    signature: Option<&SignatureImage>,
    path: &Path,
    config: &RenderConfig,
) -> Result<(usize, usize), RowError> {
    let row = idx + 1;
    let fields = collect_fields(dataset, idx, columns, config);
    let pages = compose_row(&fields, title, config, signature.is_some());

    let doc_title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = render_pdf(
        &pages,
        &PageGeometry::a4(config.orientation),
        signature,
        &doc_title,
    )
    .map_err(|detail| RowError::RenderFailed { row, detail })?;

    write_atomic(path, &bytes).map_err(|e| RowError::WriteFailed {
        row,
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    Ok((pages.len(), fields.len()))
}

/// Title drawn at the top of a row: the designated column's value, or
/// `Record #N` when that cell is empty or the column is absent.
fn row_title(
    dataset: &Dataset,
    idx: usize,
    filename_column: Option<usize>,
    config: &RenderConfig,
) -> String {
    filename_column
        .and_then(|col| dataset.value(idx, col))
        .map(|v| clean_text(v, config.text_repair))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("Record #{}", idx + 1))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp_path);
    })
}

/// Text of `summary.txt`.
pub fn summary_text(source_label: &str, range: &Range<usize>, rows: &[RowResult]) -> String {
    let mut out = String::new();
    let generated: Vec<&RowResult> = rows.iter().filter(|r| r.error.is_none()).collect();

    let _ = writeln!(out, "PDF Generation Summary");
    let _ = writeln!(out, "{}", "=".repeat(40));
    let _ = writeln!(out, "CSV Source: {}", source_label);
    let _ = writeln!(out, "Rows processed: {} to {}", range.start + 1, range.end);
    let _ = writeln!(out, "Total PDFs: {}", generated.len());
    let _ = writeln!(out, "\nGenerated files:");
    for row in &generated {
        let _ = writeln!(out, "  - {}", file_name_of(&row.path));
    }

    let failed: Vec<&RowResult> = rows.iter().filter(|r| r.error.is_some()).collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "\nFailed rows:");
        for row in failed {
            if let Some(ref e) = row.error {
                let _ = writeln!(out, "  - {}", e);
            }
        }
    }
    out
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ColumnSelection, FilenameSource, MissingValuePolicy, RowRange, SignatureSource,
    };
    use std::path::PathBuf;

    fn dataset(rows: usize, cols: usize) -> Dataset {
        let headers = (1..=cols).map(|c| format!("col{c}")).collect();
        let data = (1..=rows)
            .map(|r| (1..=cols).map(|c| format!("r{r}c{c}")).collect())
            .collect();
        Dataset::new(headers, data)
    }

    fn config(dir: &Path) -> crate::config::RenderConfigBuilder {
        RenderConfig::builder()
            .output_dir(dir)
            .signature(SignatureSource::None)
    }

    #[test]
    fn test_render_dataset_writes_pdfs_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path())
            .rows(RowRange::new(2, Some(3)))
            .columns(ColumnSelection::Window { first: 1, last: 3 })
            .filename_source(FilenameSource::RowNumber {
                prefix: "row".into(),
            })
            .build()
            .unwrap();

        let out = render_dataset(&dataset(5, 4), "mem.csv", &cfg).unwrap();
        assert_eq!(out.stats.rendered_rows, 2);
        assert_eq!(out.stats.selected_columns, vec![0, 1, 2]);
        assert!(dir.path().join("row_002.pdf").exists());
        assert!(dir.path().join("row_003.pdf").exists());
        assert!(!dir.path().join("row_002.pdf.tmp").exists());

        let summary = std::fs::read_to_string(out.summary_path.unwrap()).unwrap();
        assert!(summary.starts_with("PDF Generation Summary\n"));
        assert!(summary.contains("CSV Source: mem.csv\n"));
        assert!(summary.contains("Rows processed: 2 to 3\n"));
        assert!(summary.contains("Total PDFs: 2\n"));
        assert!(summary.contains("  - row_002.pdf\n"));
        assert!(!summary.contains("Failed rows"));
    }

    #[test]
    fn test_invalid_row_range_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path())
            .rows(RowRange::new(48, Some(53)))
            .build()
            .unwrap();
        let err = render_dataset(&dataset(10, 3), "mem.csv", &cfg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row range 48-53 is invalid. CSV has 10 rows (1-10)"
        );
    }

    #[test]
    fn test_row_title_fallback() {
        let ds = Dataset::new(
            vec!["a".into(), "name".into()],
            vec![vec!["1".into(), "Ann".into()], vec!["2".into(), " ".into()]],
        );
        let cfg = RenderConfig::default();
        assert_eq!(row_title(&ds, 0, Some(1), &cfg), "Ann");
        assert_eq!(row_title(&ds, 1, Some(1), &cfg), "Record #2");
        assert_eq!(row_title(&ds, 0, None, &cfg), "Record #1");
    }

    #[test]
    fn test_summary_lists_failures() {
        let rows = vec![
            RowResult {
                row_num: 1,
                path: PathBuf::from("pdfs/a.pdf"),
                pages: 1,
                fields: 3,
                error: None,
            },
            RowResult {
                row_num: 2,
                path: PathBuf::from("pdfs/b.pdf"),
                pages: 0,
                fields: 0,
                error: Some(RowError::RenderFailed {
                    row: 2,
                    detail: "boom".into(),
                }),
            },
        ];
        let text = summary_text("https://x/y.csv", &(0..2), &rows);
        assert!(text.contains("Rows processed: 1 to 2\n"));
        assert!(text.contains("Total PDFs: 1\n"));
        assert!(text.contains("\nFailed rows:\n  - Row 2: rendering failed: boom\n"));
    }

    #[test]
    fn test_placeholder_policy_counts_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec!["x".into(), "".into()]],
        );
        let cfg = config(dir.path())
            .columns(ColumnSelection::All)
            .missing(MissingValuePolicy::Placeholder("N/A".into()))
            .build()
            .unwrap();
        let out = render_dataset(&ds, "mem", &cfg).unwrap();
        assert_eq!(out.rows[0].fields, 2);

        let skip = config(dir.path()).columns(ColumnSelection::All).build().unwrap();
        let out = render_dataset(&ds, "mem", &skip).unwrap();
        assert_eq!(out.rows[0].fields, 1);
    }
}
