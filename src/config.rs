//! Configuration types for extraction and rendering runs.
//!
//! Each direction is controlled by one struct: [`ExtractConfig`] for
//! JSON/HAR → CSV and [`RenderConfig`] for CSV → PDF. The two PDF layouts
//! in use differ only in values of these structs, so they are expressed as
//! presets ([`RenderConfig::default`], [`RenderConfig::full_export`]) rather
//! than as separate code paths.

use crate::error::RowKitError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Wrapper key searched for by the nested-payload strategy.
pub const DEFAULT_PAYLOAD_KEY: &str = "electorDetails";

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for a JSON/HAR → CSV run.
///
/// # Example
/// ```rust
/// use edgequake_rowkit::{ExtractConfig, ExtractionStrategy};
///
/// let config = ExtractConfig::builder()
///     .output_dir("csv_out")
///     .strategy(ExtractionStrategy::HarBodies)
///     .payload_key("items")
///     .build()
///     .unwrap();
/// assert_eq!(config.separator, "_");
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory receiving the CSV files. Created if absent. Default: `output`.
    pub output_dir: PathBuf,

    /// Output file stem used for single-file inputs. Default: the input's stem.
    ///
    /// Ignored in directory mode, where every input keeps its own stem.
    pub output_name: Option<String>,

    /// Which document shape to extract records from. Default: [`ExtractionStrategy::Auto`].
    pub strategy: ExtractionStrategy,

    /// Wrapper key of the nested detail list. Default: [`DEFAULT_PAYLOAD_KEY`].
    pub payload_key: String,

    /// Separator joining parent and child keys while flattening. Default: `_`.
    pub separator: String,

    /// Download timeout for remote inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            output_name: None,
            strategy: ExtractionStrategy::default(),
            payload_key: DEFAULT_PAYLOAD_KEY.to_string(),
            separator: "_".to_string(),
            download_timeout_secs: 120,
        }
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_name = Some(name.into());
        self
    }

    pub fn strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn payload_key(mut self, key: impl Into<String>) -> Self {
        self.config.payload_key = key.into();
        self
    }

    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.config.separator = sep.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, RowKitError> {
        let c = &self.config;
        if c.separator.is_empty() {
            return Err(RowKitError::InvalidConfig(
                "Key separator must not be empty".into(),
            ));
        }
        if c.payload_key.trim().is_empty() {
            return Err(RowKitError::InvalidConfig(
                "Payload key must not be empty".into(),
            ));
        }
        if let Some(ref name) = c.output_name {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(RowKitError::InvalidConfig(format!(
                    "Output name must be a plain file stem, got '{name}'"
                )));
            }
        }
        Ok(self.config)
    }
}

/// How records are located inside a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    /// HAR shape → one row per exchange; else nested payload if present; else generic. (default)
    #[default]
    Auto,
    /// List → one row per item, object → one flattened row.
    Generic,
    /// One row per `log.entries` exchange.
    Har,
    /// Flatten each item of the nested detail list; generic if absent.
    Payload,
    /// Search HAR response bodies for the nested detail list; generic if absent.
    HarBodies,
}

impl ExtractionStrategy {
    /// Short name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::Auto => "auto",
            ExtractionStrategy::Generic => "generic",
            ExtractionStrategy::Har => "har",
            ExtractionStrategy::Payload => "payload",
            ExtractionStrategy::HarBodies => "har-bodies",
        }
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Configuration for a CSV → PDF run.
///
/// `Default` reproduces the column-window export: columns 49–54, file names
/// from column 52, empty cells skipped, landscape pages, optional signature
/// stamp and text repair. [`RenderConfig::full_export`] reproduces the
/// every-column export with `N/A` placeholders and `row_NNN.pdf` names.
///
/// # Example
/// ```rust
/// use edgequake_rowkit::{ColumnSelection, RenderConfig, RowRange};
///
/// let config = RenderConfig::builder()
///     .output_dir("pdfs")
///     .rows(RowRange::new(1, Some(3)))
///     .columns(ColumnSelection::Window { first: 2, last: 4 })
///     .build()
///     .unwrap();
/// assert!(config.text_repair);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Directory receiving the PDFs and `summary.txt`. Default: `pdfs`.
    pub output_dir: PathBuf,

    /// Rows to render (1-based, inclusive). Default: all rows.
    pub rows: RowRange,

    /// Positional column slice. Default: columns 49–54.
    pub columns: ColumnSelection,

    /// How each PDF is named. Default: column 52.
    pub filename_source: FilenameSource,

    /// What to do with empty cells. Default: skip them.
    pub missing: MissingValuePolicy,

    /// Draw a centered title at the top of each row's first page. Default: false.
    pub include_title: bool,

    /// Text repeated at the top of every page (e.g. `Row Data Export`). Default: none.
    pub running_header: Option<String>,

    /// Print `Page N` at the bottom of every page. Default: false.
    pub page_footer: bool,

    /// Signature image to stamp below the fields. Default: [`SignatureSource::Auto`].
    pub signature: SignatureSource,

    /// Run the lossy text-repair pass on labels and values. Default: true.
    pub text_repair: bool,

    /// Page orientation (A4). Default: landscape.
    pub orientation: PageOrientation,

    /// Body font size in points. Default: 10.
    pub font_size: f64,

    /// Body line height in millimetres. Default: 6.
    pub line_height_mm: f64,

    /// Width of the bold label column in millimetres. Default: 65.
    pub label_width_mm: f64,

    /// Download timeout for URL sources in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for per-row events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("pdfs"),
            rows: RowRange::default(),
            columns: ColumnSelection::default(),
            filename_source: FilenameSource::default(),
            missing: MissingValuePolicy::default(),
            include_title: false,
            running_header: None,
            page_footer: false,
            signature: SignatureSource::default(),
            text_repair: true,
            orientation: PageOrientation::Landscape,
            font_size: 10.0,
            line_height_mm: 6.0,
            label_width_mm: 65.0,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("output_dir", &self.output_dir)
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("filename_source", &self.filename_source)
            .field("missing", &self.missing)
            .field("include_title", &self.include_title)
            .field("running_header", &self.running_header)
            .field("page_footer", &self.page_footer)
            .field("signature", &self.signature)
            .field("text_repair", &self.text_repair)
            .field("orientation", &self.orientation)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn RenderProgressCallback>"),
            )
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder starting from [`RenderConfig::default`].
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Every-column export of rows 48 to 53: `N/A` for empty cells,
    /// `row_NNN.pdf` names, portrait pages with a `Record #N` title,
    /// running header and page footer.
    pub fn full_export() -> Self {
        Self {
            rows: RowRange::new(48, Some(53)),
            columns: ColumnSelection::All,
            filename_source: FilenameSource::RowNumber {
                prefix: "row".to_string(),
            },
            missing: MissingValuePolicy::Placeholder("N/A".to_string()),
            include_title: true,
            running_header: Some("Row Data Export".to_string()),
            page_footer: true,
            signature: SignatureSource::None,
            text_repair: false,
            orientation: PageOrientation::Portrait,
            font_size: 11.0,
            line_height_mm: 8.0,
            label_width_mm: 50.0,
            ..Self::default()
        }
    }

    /// Builder starting from [`RenderConfig::full_export`].
    pub fn full_export_builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::full_export(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn rows(mut self, rows: RowRange) -> Self {
        self.config.rows = rows;
        self
    }

    pub fn columns(mut self, columns: ColumnSelection) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn filename_source(mut self, source: FilenameSource) -> Self {
        self.config.filename_source = source;
        self
    }

    pub fn missing(mut self, policy: MissingValuePolicy) -> Self {
        self.config.missing = policy;
        self
    }

    pub fn include_title(mut self, v: bool) -> Self {
        self.config.include_title = v;
        self
    }

    pub fn running_header(mut self, text: impl Into<String>) -> Self {
        self.config.running_header = Some(text.into());
        self
    }

    pub fn page_footer(mut self, v: bool) -> Self {
        self.config.page_footer = v;
        self
    }

    pub fn signature(mut self, source: SignatureSource) -> Self {
        self.config.signature = source;
        self
    }

    pub fn text_repair(mut self, v: bool) -> Self {
        self.config.text_repair = v;
        self
    }

    pub fn orientation(mut self, orientation: PageOrientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn font_size(mut self, pt: f64) -> Self {
        self.config.font_size = pt.clamp(4.0, 72.0);
        self
    }

    pub fn line_height_mm(mut self, mm: f64) -> Self {
        self.config.line_height_mm = mm.clamp(2.0, 50.0);
        self
    }

    pub fn label_width_mm(mut self, mm: f64) -> Self {
        self.config.label_width_mm = mm.max(10.0);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, RowKitError> {
        let c = &self.config;
        if c.rows.start == 0 {
            return Err(RowKitError::InvalidConfig(
                "Rows are 1-indexed, minimum start row is 1".into(),
            ));
        }
        if let Some(end) = c.rows.end {
            if end < c.rows.start {
                return Err(RowKitError::InvalidConfig(format!(
                    "Invalid row range '{}-{}': start must be <= end",
                    c.rows.start, end
                )));
            }
        }
        if let ColumnSelection::Window { first, last } = c.columns {
            if first == 0 || last < first {
                return Err(RowKitError::InvalidConfig(format!(
                    "Invalid column window '{first}-{last}': columns are 1-indexed and first <= last"
                )));
            }
        }
        if let FilenameSource::Column { position: 0 } = c.filename_source {
            return Err(RowKitError::InvalidConfig(
                "Filename column is 1-indexed, minimum is 1".into(),
            ));
        }
        let usable = c.orientation.page_width_mm() - 2.0 * crate::pipeline::layout::PAGE_MARGIN_MM;
        if c.label_width_mm >= usable - 20.0 {
            return Err(RowKitError::InvalidConfig(format!(
                "Label column of {}mm leaves no room for values",
                c.label_width_mm
            )));
        }
        Ok(self.config)
    }
}

// ── Enums and small value types ──────────────────────────────────────────

/// Rows to render, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    /// First row (1-based).
    pub start: usize,
    /// Last row (1-based, inclusive). `None` means the last row of the dataset.
    pub end: Option<usize>,
}

impl Default for RowRange {
    fn default() -> Self {
        Self { start: 1, end: None }
    }
}

impl RowRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Resolve against a dataset of `total` rows into a 0-based half-open range.
    pub fn resolve(&self, total: usize) -> Result<std::ops::Range<usize>, RowKitError> {
        let end = self.end.unwrap_or(total);
        if self.start == 0 || self.start > end || end > total {
            return Err(RowKitError::InvalidRowRange {
                start: self.start,
                end,
                total,
            });
        }
        Ok(self.start - 1..end)
    }
}

/// Positional column slice, chosen without looking at header names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelection {
    /// Every column in order.
    All,
    /// Columns `first..=last` (1-based). If the dataset is narrower than
    /// `last`, the last `last - first + 1` columns are used instead.
    Window { first: usize, last: usize },
}

impl Default for ColumnSelection {
    fn default() -> Self {
        ColumnSelection::Window { first: 49, last: 54 }
    }
}

impl ColumnSelection {
    /// Expand the selection into 0-based column indices.
    pub fn to_indices(&self, column_count: usize) -> Vec<usize> {
        match *self {
            ColumnSelection::All => (0..column_count).collect(),
            ColumnSelection::Window { first, last } => {
                if first == 0 || last < first {
                    return Vec::new();
                }
                if column_count >= last {
                    (first - 1..last).collect()
                } else {
                    let width = last - first + 1;
                    (column_count.saturating_sub(width)..column_count).collect()
                }
            }
        }
    }
}

/// Where the PDF file name for each row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilenameSource {
    /// `{prefix}_{row:03}.pdf`.
    RowNumber { prefix: String },
    /// Sanitized value of the column at `position` (1-based). Datasets
    /// narrower than `position` fall back to `record_{row:03}.pdf`.
    Column { position: usize },
}

impl Default for FilenameSource {
    fn default() -> Self {
        FilenameSource::Column { position: 52 }
    }
}

impl FilenameSource {
    /// 0-based index of the designated column, if the dataset has it.
    pub fn column_index(&self, column_count: usize) -> Option<usize> {
        match *self {
            FilenameSource::Column { position } if position >= 1 && position <= column_count => {
                Some(position - 1)
            }
            _ => None,
        }
    }

    /// Prefix used when names come from the row number.
    pub fn row_prefix(&self) -> &str {
        match self {
            FilenameSource::RowNumber { prefix } => prefix,
            FilenameSource::Column { .. } => "record",
        }
    }
}

/// Treatment of cells that are empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingValuePolicy {
    /// Leave the field out of the page. (default)
    #[default]
    Skip,
    /// Render the field with this text as its value.
    Placeholder(String),
}

/// Where the signature image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureSource {
    /// No signature.
    None,
    /// `sign.jpg`, then `sign.jpeg`, in the working directory. (default)
    #[default]
    Auto,
    /// A specific image file.
    Path(PathBuf),
}

impl SignatureSource {
    /// File names tried by [`SignatureSource::Auto`].
    pub const AUTO_CANDIDATES: [&'static str; 2] = ["sign.jpg", "sign.jpeg"];

    /// The first existing candidate path, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            SignatureSource::None => None,
            SignatureSource::Path(p) => p.exists().then(|| p.clone()),
            SignatureSource::Auto => Self::AUTO_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists()),
        }
    }
}

/// A4 page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageOrientation {
    Portrait,
    #[default]
    Landscape,
}

impl PageOrientation {
    /// Page width in millimetres.
    pub fn page_width_mm(&self) -> f64 {
        match self {
            PageOrientation::Portrait => 210.0,
            PageOrientation::Landscape => 297.0,
        }
    }

    /// Page height in millimetres.
    pub fn page_height_mm(&self) -> f64 {
        match self {
            PageOrientation::Portrait => 297.0,
            PageOrientation::Landscape => 210.0,
        }
    }
}
