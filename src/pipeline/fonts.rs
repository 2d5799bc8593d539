//! Standard Type1 Helvetica faces: resource names, WinAnsi encoding and
//! glyph advance widths (units of 1/1000 em, from the Adobe core AFMs).

/// Millimetres per PDF point.
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// One of the three Helvetica faces used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Italic];

    /// PostScript name of the standard 14 font.
    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Font::Bold => &BOLD_WIDTHS,
            // Oblique shares the upright metrics.
            Font::Regular | Font::Italic => &REGULAR_WIDTHS,
        }
    }

    fn fallback_width(self) -> u16 {
        match self {
            Font::Bold => 611,
            Font::Regular | Font::Italic => 556,
        }
    }

    /// Advance width of `c` in 1/1000 em.
    pub fn char_width(self, c: char) -> u16 {
        let c = fold_latin1(c).unwrap_or(c);
        let code = c as u32;
        if (32..=126).contains(&code) {
            self.ascii_widths()[(code - 32) as usize]
        } else {
            self.fallback_width()
        }
    }
}

#[rustfmt::skip]
static REGULAR_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Accented Latin-1 letters measure like their base letter.
fn fold_latin1(c: char) -> Option<char> {
    Some(match c {
        '\u{A0}' => ' ',
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    })
}

/// WinAnsiEncoding code for `c`, if the encoding has one.
pub fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode text for a WinAnsi font; unmappable characters become `?`.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| winansi_byte(c).unwrap_or(b'?')).collect()
}

/// Rendered width of `text` in millimetres.
pub fn string_width_mm(text: &str, font: Font, size_pt: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(font.char_width(c))).sum();
    f64::from(units) * size_pt / 1000.0 * MM_PER_PT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            Font::ALL.iter().map(|f| f.resource_name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(Font::Bold.base_font(), "Helvetica-Bold");
    }

    #[test]
    fn test_known_widths() {
        assert_eq!(Font::Regular.char_width(' '), 278);
        assert_eq!(Font::Regular.char_width('W'), 944);
        assert_eq!(Font::Regular.char_width('i'), 222);
        assert_eq!(Font::Bold.char_width('i'), 278);
        assert_eq!(Font::Regular.char_width('~'), 584);
        assert_eq!(Font::Regular.char_width('é'), Font::Regular.char_width('e'));
        assert_eq!(Font::Regular.char_width('€'), 556);
    }

    #[test]
    fn test_string_width_mm() {
        // 10 digits at 556 units, 10pt: 55.6pt.
        let w = string_width_mm("0123456789", Font::Regular, 10.0);
        assert!((w - 55.6 * MM_PER_PT).abs() < 1e-9);
        assert_eq!(string_width_mm("", Font::Bold, 12.0), 0.0);
        assert!(string_width_mm("Label", Font::Bold, 10.0) > string_width_mm("Label", Font::Regular, 10.0));
    }

    #[test]
    fn test_winansi_encoding() {
        assert_eq!(winansi_byte('A'), Some(0x41));
        assert_eq!(winansi_byte('é'), Some(0xE9));
        assert_eq!(winansi_byte('€'), Some(0x80));
        assert_eq!(winansi_byte('—'), Some(0x97));
        assert_eq!(winansi_byte('\n'), None);
        assert_eq!(winansi_byte('日'), None);
        assert_eq!(encode_winansi("a’b→c"), vec![b'a', 0x92, b'b', b'?', b'c']);
    }
}
