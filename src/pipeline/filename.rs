//! Output file naming: sanitization and per-run de-duplication.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Longest sanitized stem, in characters.
pub const MAX_STEM_CHARS: usize = 45;

/// Stem used when a value sanitizes to nothing.
pub const PLACEHOLDER_STEM: &str = "unnamed";

static RE_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*;,\x00-\x1F\x7F]"#).unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());

fn is_edge_separator(c: char) -> bool {
    c == '_' || c == '.' || c.is_whitespace()
}

/// Turn an arbitrary cell value into a filesystem-safe file stem.
///
/// Characters illegal on common filesystems (plus `;` and `,`) become `_`,
/// whitespace runs become `_`, repeated underscores collapse, the result is
/// cut to [`MAX_STEM_CHARS`] and stripped of leading/trailing `_`, `.` and
/// whitespace. Empty results become [`PLACEHOLDER_STEM`]. Idempotent.
pub fn sanitize_filename(value: &str) -> String {
    let s = RE_UNSAFE.replace_all(value.trim(), "_");
    let s = RE_WHITESPACE.replace_all(&s, "_");
    let s = RE_UNDERSCORES.replace_all(&s, "_");
    let cut: String = s.chars().take(MAX_STEM_CHARS).collect();
    let stripped = cut.trim_matches(is_edge_separator);
    if stripped.is_empty() {
        PLACEHOLDER_STEM.to_string()
    } else {
        stripped.to_string()
    }
}

/// Hands out `.pdf` file names, never the same one twice in a run.
///
/// Names that differ only in case count as the same name, so they cannot
/// overwrite each other on case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    /// Lowercased names already handed out.
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{prefix}_{row:03}.pdf`.
    pub fn row_number(&mut self, prefix: &str, row_num: usize) -> String {
        self.claim(format!("{prefix}_{row_num:03}"), row_num)
    }

    /// Sanitized `value` as the stem; `{stem}_{row:03}` if already emitted.
    pub fn from_value(&mut self, value: &str, row_num: usize) -> String {
        self.claim(sanitize_filename(value), row_num)
    }

    fn is_used(&self, candidate: &str) -> bool {
        self.used.contains(&candidate.to_lowercase())
    }

    fn claim(&mut self, stem: String, row_num: usize) -> String {
        let mut candidate = format!("{stem}.pdf");
        if self.is_used(&candidate) {
            candidate = format!("{stem}_{row_num:03}.pdf");
            let mut n = 2;
            while self.is_used(&candidate) {
                candidate = format!("{stem}_{row_num:03}_{n}.pdf");
                n += 1;
            }
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}
