//! Text repair: deterministic cleanup of cell values before they are drawn.
//!
//! Spreadsheet exports frequently carry UTF-8 text that was decoded once as
//! Windows-1252 somewhere upstream (`JosÃ©` for `José`), curly quotes and
//! dashes pasted from word processors, and characters the standard PDF fonts
//! cannot show at all.
//!
//! ## Rule Order
//!
//! Double-encoding reversal must run first: it needs the raw mojibake bytes,
//! and the later passes would rewrite some of them (`â€™` contains a curly
//! quote). Unencodable characters are dropped last so that punctuation with
//! an ASCII equivalent is kept.
//!
//! The repair is lossy and one-way. Already-correct text that happens to look
//! like mojibake can be altered.

use crate::pipeline::fonts::winansi_byte;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all repair rules in order.
///
/// 1. Reverse UTF-8 → Windows-1252 double encoding
/// 2. Replace typographic punctuation with ASCII
/// 3. Drop characters with no WinAnsi code
pub fn repair_text(input: &str) -> String {
    let s = fix_double_encoding(input);
    let s = replace_smart_punctuation(&s);
    drop_unencodable(&s)
}

// ── Rule 1: Reverse double encoding ──────────────────────────────────────────

/// A UTF-8 lead byte (0xC2–0xF4) seen as cp1252 followed by a continuation
/// byte (0x80–0xBF) seen as cp1252.
static RE_MOJIBAKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[\u{00C2}-\u{00F4}][\u{0080}-\u{00BF}\u{20AC}\u{201A}\u{0192}\u{201E}\u{2026}\u{2020}\u{2021}\u{02C6}\u{2030}\u{0160}\u{2039}\u{0152}\u{017D}\u{2018}\u{2019}\u{201C}\u{201D}\u{2022}\u{2013}\u{2014}\u{02DC}\u{2122}\u{0161}\u{203A}\u{0153}\u{017E}\u{0178}]")
        .unwrap()
});

/// Windows-1252 byte for `c`. ASCII and the C1 range (the five bytes
/// cp1252 leaves undefined decode to them) map to themselves.
fn cp1252_byte(c: char) -> Option<u8> {
    if c.is_ascii() || ('\u{0080}'..='\u{009F}').contains(&c) {
        Some(c as u32 as u8)
    } else {
        winansi_byte(c)
    }
}

fn fix_double_encoding(input: &str) -> String {
    if !RE_MOJIBAKE.is_match(input) {
        return input.to_string();
    }
    let bytes: Option<Vec<u8>> = input.chars().map(cp1252_byte).collect();
    match bytes.map(String::from_utf8) {
        Some(Ok(decoded)) => decoded,
        _ => input.to_string(),
    }
}

// ── Rule 2: Smart punctuation to ASCII ───────────────────────────────────────

fn replace_smart_punctuation(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('*'),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

// ── Rule 3: Drop characters the font cannot encode ───────────────────────────

fn drop_unencodable(input: &str) -> String {
    input
        .chars()
        .filter(|&c| winansi_byte(c).is_some())
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_double_encoding() {
        assert_eq!(fix_double_encoding("JosÃ©"), "José");
        assert_eq!(fix_double_encoding("donâ€™t"), "don\u{2019}t");
        assert_eq!(fix_double_encoding("Ã¼ber"), "über");
    }

    #[test]
    fn test_correct_text_untouched() {
        assert_eq!(fix_double_encoding("José Müller"), "José Müller");
        assert_eq!(fix_double_encoding("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_unreversible_mojibake_kept() {
        // The arrow has no cp1252 byte, so the whole value is left alone.
        assert_eq!(fix_double_encoding("Ã© →"), "Ã© →");
    }

    #[test]
    fn test_smart_punctuation() {
        assert_eq!(
            replace_smart_punctuation("\u{201C}Hi\u{201D} \u{2013} it\u{2019}s\u{2026}"),
            "\"Hi\" - it's..."
        );
        assert_eq!(replace_smart_punctuation("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_drop_unencodable() {
        assert_eq!(drop_unencodable("ok 日本 ✓ é"), "ok   é");
        assert_eq!(drop_unencodable("zero\u{200B}width"), "zerowidth");
    }

    #[test]
    fn test_repair_full_pipeline() {
        assert_eq!(repair_text("donâ€™t stop"), "don't stop");
        assert_eq!(repair_text("Caf\u{00E9} \u{2014} 5\u{20AC}"), "Café - 5€");
        assert_eq!(repair_text("emoji 🙂 gone"), "emoji  gone");
    }
}
