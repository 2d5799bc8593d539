//! Exit status of the binaries.
//!
//! A fatal run error is printed but the process still exits 0; only bad
//! arguments are rejected with a non-zero status.

#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn run(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn csv2pdf_missing_source_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("absent.csv");
    let out = dir.path().join("pdfs");

    let output = run(
        env!("CARGO_BIN_EXE_csv2pdf"),
        &[
            "--csv-url",
            source.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--no-progress",
            "-q",
        ],
    );

    assert!(output.status.success(), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PDF generation failed"), "{stderr}");
    assert!(stderr.contains("Input not found"), "{stderr}");
}

#[test]
fn csv2pdf_out_of_range_rows_exit_zero() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("data.csv");
    std::fs::write(&source, "A,B\n1,2\n").unwrap();
    let out = dir.path().join("pdfs");

    // The full preset asks for rows 48-53 of a one-row sheet.
    let output = run(
        env!("CARGO_BIN_EXE_csv2pdf"),
        &[
            "--csv-url",
            source.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--preset",
            "full",
            "--no-progress",
            "-q",
        ],
    );

    assert!(output.status.success(), "{output:?}");
    assert!(!out.join("row_001.pdf").exists());
}

#[test]
fn csv2pdf_invalid_column_window_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        env!("CARGO_BIN_EXE_csv2pdf"),
        &[
            "--csv-url",
            "data.csv",
            "--output-dir",
            dir.path().to_str().unwrap(),
            "--columns",
            "9-2",
            "--no-progress",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn json2csv_missing_input_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.json");

    let output = run(
        env!("CARGO_BIN_EXE_json2csv"),
        &[
            "-i",
            input.to_str().unwrap(),
            "-o",
            dir.path().join("csv").to_str().unwrap(),
            "-q",
        ],
    );

    assert!(output.status.success(), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Extraction failed"), "{stderr}");
    assert!(stderr.contains("Input not found"), "{stderr}");
}
