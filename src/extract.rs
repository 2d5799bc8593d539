//! Extraction entry points: JSON / HAR / TXT files to CSV.
//!
//! Every input file is converted independently. A file that cannot be parsed
//! or written is recorded in its [`FileReport`] and the run moves on; only
//! problems that stop the whole run (missing input, unwritable output
//! directory, failed download) are returned as `Err`.

use crate::config::ExtractConfig;
use crate::error::RowKitError;
use crate::output::{ExtractionReport, FileReport};
use crate::pipeline::{csv_out, input, records};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File extensions scanned in directory mode, in processing order.
pub const INPUT_EXTENSIONS: [&str; 3] = ["har", "json", "txt"];

/// Where a Google Drive input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveSource {
    /// A bare file id.
    Id(String),
    /// A sharing URL containing the id.
    Url(String),
}

impl DriveSource {
    /// The Drive file id.
    pub fn file_id(&self) -> Result<String, RowKitError> {
        match self {
            DriveSource::Id(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            DriveSource::Id(id) => Err(RowKitError::DriveIdNotFound { url: id.clone() }),
            DriveSource::Url(url) => {
                input::drive_file_id(url).ok_or_else(|| RowKitError::DriveIdNotFound {
                    url: url.clone(),
                })
            }
        }
    }
}

/// Convert a file, or every supported file in a directory, to CSV.
///
/// In directory mode `config.output_name` is ignored: each CSV is named
/// after its input file.
pub fn extract_path(
    input_path: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ExtractionReport, RowKitError> {
    let input_path = input_path.as_ref();
    if !input_path.exists() {
        return Err(RowKitError::InputNotFound {
            path: input_path.to_path_buf(),
        });
    }
    ensure_output_dir(&config.output_dir)?;

    let mut report = ExtractionReport::default();
    if input_path.is_dir() {
        let config = if config.output_name.is_some() {
            warn!("--output-name is ignored when converting a directory");
            Cow::Owned(ExtractConfig {
                output_name: None,
                ..config.clone()
            })
        } else {
            Cow::Borrowed(config)
        };
        let files = list_inputs(input_path)?;
        if files.is_empty() {
            warn!("No .har, .json or .txt files in {}", input_path.display());
        }
        for file in files {
            report.files.push(convert_file(&file, &config));
        }
    } else {
        report.files.push(convert_file(input_path, config));
    }

    info!(
        "Extraction complete: {} CSV file(s), {} row(s), {} failed",
        report.written().count(),
        report.total_rows(),
        report.failed().count()
    );
    Ok(report)
}

/// Download a Google Drive file and convert it.
///
/// The download lives in a temporary directory removed when this returns.
/// Without an explicit output name the CSV is called `downloaded_file.csv`.
pub async fn extract_from_drive(
    source: &DriveSource,
    config: &ExtractConfig,
) -> Result<ExtractionReport, RowKitError> {
    let file_id = source.file_id()?;
    let resolved = input::download_drive_file(&file_id, config.download_timeout_secs).await?;
    ensure_output_dir(&config.output_dir)?;

    let report = ExtractionReport {
        files: vec![convert_file(resolved.path(), config)],
    };
    // `resolved` (and its temp dir) is dropped here.
    Ok(report)
}

/// Convert one file. Never fails: problems are recorded in the report.
pub fn convert_file(input_path: &Path, config: &ExtractConfig) -> FileReport {
    info!("Processing: {}", input_path.display());

    let doc = match input::read_document(input_path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Skipping {}: {}", input_path.display(), e);
            return FileReport::failed(input_path.to_path_buf(), e.to_string());
        }
    };

    let extraction = records::extract_records(&doc, config);
    for err in &extraction.errors {
        warn!("{}: {}", input_path.display(), err);
    }

    let mut report = FileReport {
        input: input_path.to_path_buf(),
        output: None,
        rows: 0,
        shape: extraction.shape.to_string(),
        record_errors: extraction.errors,
        error: None,
    };

    if extraction.records.is_empty() {
        info!("No entries found in {}", input_path.display());
        return report;
    }

    let output_path = output_path_for(input_path, config);
    match csv_out::write_records(&extraction.records, &output_path) {
        Ok(0) => {}
        Ok(rows) => {
            report.rows = rows;
            report.output = Some(output_path);
        }
        Err(e) => {
            warn!("Error saving CSV for {}: {}", input_path.display(), e);
            report.error = Some(e.to_string());
        }
    }
    report
}

/// Supported files directly inside `dir`: `.har`, then `.json`, then `.txt`,
/// each group sorted by name.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>, RowKitError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RowKitError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => RowKitError::InputNotFound {
            path: dir.to_path_buf(),
        },
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| extension_rank(path).is_some())
        .collect();
    files.sort_by(|a, b| {
        extension_rank(a)
            .cmp(&extension_rank(b))
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });
    Ok(files)
}

fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    INPUT_EXTENSIONS.iter().position(|e| *e == ext)
}

fn output_path_for(input_path: &Path, config: &ExtractConfig) -> PathBuf {
    let stem = match &config.output_name {
        Some(name) => name.clone(),
        None => input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string()),
    };
    config.output_dir.join(format!("{stem}.csv"))
}

fn ensure_output_dir(dir: &Path) -> Result<(), RowKitError> {
    std::fs::create_dir_all(dir).map_err(|e| RowKitError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_source_file_id() {
        assert_eq!(DriveSource::Id(" abc ".into()).file_id().unwrap(), "abc");
        assert_eq!(
            DriveSource::Url("https://drive.google.com/file/d/XyZ_1/view".into())
                .file_id()
                .unwrap(),
            "XyZ_1"
        );
        assert!(matches!(
            DriveSource::Url("https://drive.google.com/".into()).file_id(),
            Err(RowKitError::DriveIdNotFound { .. })
        ));
        assert!(DriveSource::Id("  ".into()).file_id().is_err());
    }

    #[test]
    fn test_list_inputs_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.txt", "z.har", "a.json", "notes.md", "A.HAR"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names: Vec<String> = list_inputs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.HAR", "z.har", "a.json", "b.json", "a.txt"]);
    }

    #[test]
    fn test_output_path_for() {
        let config = ExtractConfig::default();
        assert_eq!(
            output_path_for(Path::new("/in/capture.har"), &config),
            Path::new("output").join("capture.csv")
        );
        let named = ExtractConfig::builder().output_name("people").build().unwrap();
        assert_eq!(
            output_path_for(Path::new("/in/capture.har"), &named),
            Path::new("output").join("people.csv")
        );
    }

    #[test]
    fn test_convert_file_reports_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let config = ExtractConfig::builder()
            .output_dir(dir.path().join("out"))
            .build()
            .unwrap();
        let report = convert_file(&bad, &config);
        assert!(report.error.is_some());
        assert!(!report.is_written());
    }
}
