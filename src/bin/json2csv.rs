//! CLI binary: flatten JSON / HAR / TXT captures into CSV.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractConfig` and prints a per-file summary.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use edgequake_rowkit::{
    extract_from_drive, extract_path, DriveSource, ExtractConfig, ExtractionReport,
    ExtractionStrategy, RowKitError, DEFAULT_PAYLOAD_KEY,
};
use std::io;
use std::path::PathBuf;
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one HAR capture (writes output/capture.csv)
  json2csv -i capture.har

  # Convert every .har/.json/.txt file in a directory
  json2csv -i captures/ -o csv_out

  # Pick the output file name
  json2csv -i export.json --output-name voters

  # Download from Google Drive (file must be shared with "Anyone with the link")
  json2csv --gdrive-url "https://drive.google.com/file/d/<id>/view"

  # Search HAR response bodies for a nested list under a custom key
  json2csv -i capture.har --strategy har-bodies --payload-key items

STRATEGIES:
  auto        HAR → one row per exchange; else nested payload list; else generic
  generic     list → one row per item; object → one flattened row
  har         one row per log.entries exchange
  payload     one row per item of the nested payload list
  har-bodies  decode HAR response bodies and collect their payload lists

ENVIRONMENT VARIABLES:
  RUST_LOG    Override the log filter (e.g. RUST_LOG=edgequake_rowkit=debug)
"#;

/// Flatten JSON / HAR captures into CSV files.
#[derive(Parser, Debug)]
#[command(
    name = "json2csv",
    version,
    about = "Flatten JSON / HAR captures into CSV files",
    long_about = "Convert JSON, HAR and JSON-bearing text files into CSV. Nested objects are \
flattened into parent_child columns, arrays are written as JSON text, and the header is the \
sorted union of keys across all rows.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("source").required(true).args(["input", "gdrive_id", "gdrive_url"]))
)]
struct Cli {
    /// Input file (.har, .json, .txt) or a directory of them.
    #[arg(short, long, env = "JSON2CSV_INPUT")]
    input: Option<PathBuf>,

    /// Directory receiving the CSV files.
    #[arg(short, long, env = "JSON2CSV_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Output file stem for single-file inputs (ignored for directories).
    #[arg(long, env = "JSON2CSV_OUTPUT_NAME")]
    output_name: Option<String>,

    /// Google Drive file id to download and convert.
    #[arg(long, env = "JSON2CSV_GDRIVE_ID")]
    gdrive_id: Option<String>,

    /// Google Drive sharing URL to download and convert.
    #[arg(long, env = "JSON2CSV_GDRIVE_URL")]
    gdrive_url: Option<String>,

    /// How rows are located in each document.
    #[arg(long, env = "JSON2CSV_STRATEGY", value_enum, default_value = "auto")]
    strategy: StrategyArg,

    /// Wrapper key of the nested payload list.
    #[arg(long, env = "JSON2CSV_PAYLOAD_KEY", default_value = DEFAULT_PAYLOAD_KEY)]
    payload_key: String,

    /// Separator joining parent and child keys.
    #[arg(long, env = "JSON2CSV_SEPARATOR", default_value = "_")]
    separator: String,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "JSON2CSV_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JSON2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "JSON2CSV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StrategyArg {
    Auto,
    Generic,
    Har,
    Payload,
    HarBodies,
}

impl From<StrategyArg> for ExtractionStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Auto => ExtractionStrategy::Auto,
            StrategyArg::Generic => ExtractionStrategy::Generic,
            StrategyArg::Har => ExtractionStrategy::Har,
            StrategyArg::Payload => ExtractionStrategy::Payload,
            StrategyArg::HarBodies => ExtractionStrategy::HarBodies,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let config = build_config(&cli)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let drive = match (&cli.gdrive_id, &cli.gdrive_url) {
        (Some(id), _) => Some(DriveSource::Id(id.clone())),
        (None, Some(url)) => Some(DriveSource::Url(url.clone())),
        (None, None) => None,
    };

    let result = match (drive, &cli.input) {
        (Some(source), _) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;
            runtime.block_on(extract_from_drive(&source, &config))
        }
        (None, Some(input)) => extract_path(input, &config),
        (None, None) => anyhow::bail!("Provide --input, --gdrive-id or --gdrive-url"),
    };

    // A fatal run error is reported, not turned into an exit status.
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            report_fatal(&e);
            return Ok(());
        }
    };

    if !cli.quiet {
        print_summary(&report);
    }
    Ok(())
}

fn report_fatal(err: &RowKitError) {
    eprintln!("{} {}: {}", red("✘"), bold("Extraction failed"), err);
}

/// Map CLI args to `ExtractConfig`.
fn build_config(cli: &Cli) -> Result<ExtractConfig> {
    let mut builder = ExtractConfig::builder()
        .output_dir(&cli.output)
        .strategy(cli.strategy.clone().into())
        .payload_key(&cli.payload_key)
        .separator(&cli.separator)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref name) = cli.output_name {
        builder = builder.output_name(name);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &ExtractionReport) {
    for file in &report.files {
        let input = file.input.display().to_string();
        match (&file.output, &file.error) {
            (Some(out), _) => eprintln!(
                "  {} {}  →  {}  {}",
                green("✓"),
                input,
                bold(&out.display().to_string()),
                dim(&format!("{} rows, {}", file.rows, file.shape)),
            ),
            (None, Some(err)) => eprintln!("  {} {}  {}", red("✗"), input, red(err)),
            (None, None) => eprintln!("  {} {}  {}", dim("·"), input, dim("no entries found")),
        }
        if !file.record_errors.is_empty() {
            eprintln!(
                "    {}",
                dim(&format!("{} malformed entries skipped", file.record_errors.len()))
            );
        }
    }

    let written = report.written().count();
    let failed = report.failed().count();
    eprintln!(
        "{} {} CSV file(s), {} row(s){}",
        if failed == 0 { green("✔") } else { red("⚠") },
        bold(&written.to_string()),
        report.total_rows(),
        if failed > 0 {
            format!("  ({} failed)", red(&failed.to_string()))
        } else {
            String::new()
        },
    );
}
