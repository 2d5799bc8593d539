//! # edgequake-rowkit
//!
//! Move tabular data between JSON captures, CSV and per-row PDF documents.
//!
//! ## Two pipelines
//!
//! ```text
//! JSON / HAR / TXT ──▶ records ──▶ flatten ──▶ CSV          (json2csv)
//!
//! CSV (URL or path) ──▶ dataset ──▶ row slice ──▶ layout ──▶ one PDF per row
//!                                                     └──▶ summary.txt  (csv2pdf)
//! ```
//!
//! * **Extraction** ([`extract_path`], [`extract_from_drive`]) finds rows in a
//!   document (HAR entries, a nested payload list, HAR response bodies, or
//!   plain JSON), flattens nested objects into `parent_child` columns and
//!   writes a CSV whose header is the sorted union of all keys.
//! * **Rendering** ([`render_rows`], [`render_dataset`]) takes a positional
//!   slice of columns and writes each selected row as `label: value` pairs on
//!   A4 pages, optionally with a title, running header, page footer and a
//!   signature image.
//!
//! The two pipelines never interact within one run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_rowkit::{render_rows, RenderConfig, RowRange};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RenderConfig::builder()
//!         .output_dir("pdfs")
//!         .rows(RowRange::new(1, Some(3)))
//!         .build()?;
//!     let output = render_rows("https://example.com/export.csv", &config).await?;
//!     eprintln!("{} PDFs written", output.stats.rendered_rows);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `json2csv` and `csv2pdf` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-rowkit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ColumnSelection, ExtractConfig, ExtractConfigBuilder, ExtractionStrategy, FilenameSource,
    MissingValuePolicy, PageOrientation, RenderConfig, RenderConfigBuilder, RowRange,
    SignatureSource, DEFAULT_PAYLOAD_KEY,
};
pub use error::{RecordError, RowError, RowKitError};
pub use extract::{convert_file, extract_from_drive, extract_path, list_inputs, DriveSource};
pub use output::{ExtractionReport, FileReport, RenderOutput, RenderStats, RowResult};
pub use pipeline::filename::sanitize_filename;
pub use pipeline::flatten::{flatten, Record};
pub use pipeline::table::Dataset;
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use render::{render_dataset, render_rows, render_rows_sync};
