//! CLI binary: render CSV rows as one PDF each.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_rowkit::{
    render_rows, ColumnSelection, FilenameSource, MissingValuePolicy, PageOrientation,
    ProgressCallback, RenderConfig, RenderProgressCallback, RowKitError, RowRange,
    SignatureSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per row.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Wall-clock start of the row currently being rendered.
    row_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_render_start` reports the row count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading CSV…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            row_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} rows  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.row_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, total_rows: usize) {
        self.activate_bar(total_rows);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating {total_rows} PDFs…"))
        ));
    }

    fn on_row_start(&self, row_num: usize, _total_rows: usize) {
        if let Ok(mut started) = self.row_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("row {row_num}"));
    }

    fn on_row_complete(&self, row_num: usize, _total_rows: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.println(format!(
            "  {} Row {:>4}  {}  {}",
            green("✓"),
            row_num,
            name,
            dim(&format!("{:.2}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_row_error(&self, row_num: usize, _total_rows: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Row {:>4}  {}  {}",
            red("✗"),
            row_num,
            red(&msg),
            dim(&format!("{:.2}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, total_rows: usize, success_count: usize) {
        let failed = total_rows.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} PDFs generated successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} PDFs generated  ({} failed)",
                if failed == total_rows {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_rows,
                red(&self.errors.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rows 1-3 of a published sheet, columns 49-54, names from column 52
  csv2pdf --csv-url "https://docs.google.com/spreadsheets/d/<id>/export?format=csv" \
          --start-row 1 --end-row 3

  # Every column of a local file, N/A for blanks, row_001.pdf names
  csv2pdf --csv-url data.csv --preset full --output-dir out

  # Custom window and naming
  csv2pdf --csv-url data.csv --columns 2-8 --filename-column 3 --title

  # Explicit signature image (default: ./sign.jpg or ./sign.jpeg if present)
  csv2pdf --csv-url data.csv --signature stamp.png

PRESETS:
  window  all rows, columns 49-54, skip empty cells, names from column 52,
          landscape, signature auto-detected, text repair on (default)
  full    rows 48-53, every column, N/A for empty cells, row_NNN.pdf names,
          portrait, "Record #N" title, page header and footer, no signature

OUTPUT:
  One PDF per row plus summary.txt in the output directory.

ENVIRONMENT VARIABLES:
  RUST_LOG    Override the log filter (e.g. RUST_LOG=edgequake_rowkit=debug)
"#;

/// Render each CSV row as its own PDF document.
#[derive(Parser, Debug)]
#[command(
    name = "csv2pdf",
    version,
    about = "Render each CSV row as its own PDF document",
    long_about = "Load a CSV from a URL or local path and write one PDF per selected row, \
showing a positional slice of columns as bold label / value pairs on A4 pages.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// CSV source: HTTP/HTTPS URL or local file path.
    #[arg(long, env = "CSV2PDF_CSV_URL")]
    csv_url: String,

    /// Directory receiving the PDFs and summary.txt.
    #[arg(long, env = "CSV2PDF_OUTPUT_DIR", default_value = "pdfs")]
    output_dir: PathBuf,

    /// First row to render (1-based, inclusive). Default: preset's range.
    #[arg(long, env = "CSV2PDF_START_ROW")]
    start_row: Option<usize>,

    /// Last row to render (1-based, inclusive). Default: preset's range.
    #[arg(long, env = "CSV2PDF_END_ROW")]
    end_row: Option<usize>,

    /// Layout preset: window or full.
    #[arg(long, env = "CSV2PDF_PRESET", value_enum, default_value = "window")]
    preset: PresetArg,

    /// Column selection: all, or a 1-based window such as 49-54.
    #[arg(long, env = "CSV2PDF_COLUMNS")]
    columns: Option<String>,

    /// Column (1-based) whose value names each PDF, or `none` for row numbers.
    #[arg(long, env = "CSV2PDF_FILENAME_COLUMN")]
    filename_column: Option<String>,

    /// Draw a title at the top of each PDF.
    #[arg(long, env = "CSV2PDF_TITLE")]
    title: bool,

    /// Empty cells: skip the field or print N/A.
    #[arg(long, env = "CSV2PDF_MISSING", value_enum)]
    missing: Option<MissingArg>,

    /// Signature image stamped below the fields.
    #[arg(long, env = "CSV2PDF_SIGNATURE", conflicts_with = "no_signature")]
    signature: Option<PathBuf>,

    /// Never stamp a signature.
    #[arg(long, env = "CSV2PDF_NO_SIGNATURE")]
    no_signature: bool,

    /// Keep text as-is instead of repairing encoding damage.
    #[arg(long, env = "CSV2PDF_NO_TEXT_REPAIR")]
    no_text_repair: bool,

    /// Portrait pages instead of landscape.
    #[arg(long, env = "CSV2PDF_PORTRAIT")]
    portrait: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CSV2PDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "CSV2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CSV2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CSV2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PresetArg {
    Window,
    Full,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MissingArg {
    Skip,
    Na,
}

impl From<MissingArg> for MissingValuePolicy {
    fn from(v: MissingArg) -> Self {
        match v {
            MissingArg::Skip => MissingValuePolicy::Skip,
            MissingArg::Na => MissingValuePolicy::Placeholder("N/A".to_string()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn RenderProgressCallback>);

    let config = build_config(&cli, progress_cb)?;

    // ── Run rendering ────────────────────────────────────────────────────
    // A fatal run error is reported, not turned into an exit status.
    let output = match render_rows(&cli.csv_url, &config).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref cb) = cli_progress {
                cb.bar.finish_and_clear();
            }
            report_fatal("PDF generation failed", &e);
            return Ok(());
        }
    };

    if !cli.quiet && !show_progress {
        eprintln!(
            "Generated {}/{} PDFs in {}ms",
            output.stats.rendered_rows, output.stats.attempted_rows, output.stats.total_duration_ms
        );
        for row in output.rows.iter().filter(|r| r.error.is_some()) {
            if let Some(ref e) = row.error {
                eprintln!("  {}", red(&e.to_string()));
            }
        }
    }
    if !cli.quiet {
        eprintln!(
            "   {}  →  {}",
            dim(&format!("{} columns selected", output.stats.selected_columns.len())),
            bold(&config.output_dir.display().to_string()),
        );
        if let Some(ref summary) = output.summary_path {
            eprintln!("   {}", dim(&format!("summary: {}", summary.display())));
        }
    }

    Ok(())
}

fn report_fatal(what: &str, err: &RowKitError) {
    eprintln!("{} {}: {}", red("✘"), bold(what), err);
}

/// Map CLI args to `RenderConfig`. Explicit flags override the preset.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RenderConfig> {
    let mut builder = match cli.preset {
        PresetArg::Window => RenderConfig::builder(),
        PresetArg::Full => RenderConfig::full_export_builder(),
    };

    builder = builder
        .output_dir(&cli.output_dir)
        .download_timeout_secs(cli.download_timeout);

    // Either bound replaces the preset's range; the other defaults to 1 / last row.
    if cli.start_row.is_some() || cli.end_row.is_some() {
        builder = builder.rows(RowRange::new(cli.start_row.unwrap_or(1), cli.end_row));
    }

    if let Some(ref columns) = cli.columns {
        builder = builder.columns(parse_columns(columns)?);
    }
    if let Some(ref source) = cli.filename_column {
        builder = builder.filename_source(parse_filename_column(source)?);
    }
    if cli.title {
        builder = builder.include_title(true);
    }
    if let Some(ref missing) = cli.missing {
        builder = builder.missing(missing.clone().into());
    }
    if let Some(ref path) = cli.signature {
        builder = builder.signature(SignatureSource::Path(path.clone()));
    }
    if cli.no_signature {
        builder = builder.signature(SignatureSource::None);
    }
    if cli.no_text_repair {
        builder = builder.text_repair(false);
    }
    if cli.portrait {
        builder = builder.orientation(PageOrientation::Portrait);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--columns`: `all` or `A-B` (1-based, inclusive).
fn parse_columns(s: &str) -> Result<ColumnSelection> {
    let s = s.trim().to_lowercase();
    if s == "all" {
        return Ok(ColumnSelection::All);
    }

    let (first, last) = s
        .split_once('-')
        .with_context(|| format!("Invalid column window '{s}': expected 'all' or 'A-B'"))?;
    let first: usize = first
        .trim()
        .parse()
        .context("Invalid first column in window")?;
    let last: usize = last.trim().parse().context("Invalid last column in window")?;

    if first < 1 {
        anyhow::bail!("Columns are 1-indexed, minimum is 1 (got {})", first);
    }
    if first > last {
        anyhow::bail!(
            "Invalid column window '{}-{}': first must be <= last",
            first,
            last
        );
    }
    Ok(ColumnSelection::Window { first, last })
}

/// Parse `--filename-column`: a 1-based position or `none`.
fn parse_filename_column(s: &str) -> Result<FilenameSource> {
    let s = s.trim().to_lowercase();
    if s == "none" {
        return Ok(FilenameSource::RowNumber {
            prefix: "row".to_string(),
        });
    }
    let position: usize = s
        .parse()
        .with_context(|| format!("Invalid filename column '{s}': expected a number or 'none'"))?;
    if position < 1 {
        anyhow::bail!("Columns are 1-indexed, minimum is 1 (got {})", position);
    }
    Ok(FilenameSource::Column { position })
}
