//! Flow layout on A4 pages.
//!
//! A small cursor-based layout model: coordinates are millimetres from the
//! top-left corner of the page, text is placed in cells of a given width and
//! height, and a cell that would cross the bottom break line starts a new
//! page. The result is a list of [`PageContent`] draw operations that
//! [`crate::pipeline::pdf`] turns into content streams.

use crate::config::PageOrientation;
use crate::pipeline::fonts::{string_width_mm, Font, MM_PER_PT};

/// Left, right and top page margin.
pub const PAGE_MARGIN_MM: f64 = 15.0;

/// Distance from the bottom edge at which a new page is started.
pub const PAGE_BREAK_MARGIN_MM: f64 = 15.0;

/// Horizontal padding inside a cell.
pub const CELL_PADDING_MM: f64 = 1.0;

const HEADER_SIZE_PT: f64 = 12.0;
const FOOTER_SIZE_PT: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
    pub break_margin_mm: f64,
}

impl PageGeometry {
    pub fn a4(orientation: PageOrientation) -> Self {
        Self {
            width_mm: orientation.page_width_mm(),
            height_mm: orientation.page_height_mm(),
            margin_mm: PAGE_MARGIN_MM,
            break_margin_mm: PAGE_BREAK_MARGIN_MM,
        }
    }

    /// Width between the left and right margins.
    pub fn usable_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    fn break_y(&self) -> f64 {
        self.height_mm - self.break_margin_mm
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// A single positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x_mm: f64,
        baseline_mm: f64,
        font: Font,
        size_pt: f64,
        text: String,
    },
    /// The row's signature image; there is at most one image per document.
    Image {
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub ops: Vec<DrawOp>,
}

impl PageContent {
    /// All text strings on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// Text repeated on every page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDecorations {
    /// Centered bold line at the top of each page.
    pub header: Option<String>,
    /// `Page N` centered at the bottom of each page.
    pub footer: bool,
}

/// Cursor-based page builder.
#[derive(Debug)]
pub struct Layout {
    geometry: PageGeometry,
    decorations: PageDecorations,
    pages: Vec<PageContent>,
    x: f64,
    y: f64,
    font: Font,
    size_pt: f64,
    decorating: bool,
}

impl Layout {
    pub fn new(geometry: PageGeometry, decorations: PageDecorations) -> Self {
        Self {
            x: geometry.margin_mm,
            y: geometry.margin_mm,
            geometry,
            decorations,
            pages: Vec::new(),
            font: Font::Regular,
            size_pt: 10.0,
            decorating: false,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn set_font(&mut self, font: Font, size_pt: f64) {
        self.font = font;
        self.size_pt = size_pt;
    }

    /// Width of `text` in the current font.
    pub fn text_width(&self, text: &str) -> f64 {
        string_width_mm(text, self.font, self.size_pt)
    }

    /// Close the current page (drawing its footer) and open a new one.
    pub fn add_page(&mut self) {
        self.draw_footer();
        self.pages.push(PageContent::default());
        self.x = self.geometry.margin_mm;
        self.y = self.geometry.margin_mm;
        self.draw_header();
    }

    /// Move to the left margin, `h` millimetres down.
    pub fn ln(&mut self, h: f64) {
        self.x = self.geometry.margin_mm;
        self.y += h;
    }

    /// Start a new page unless `h` more millimetres fit above the break line.
    pub fn ensure_space(&mut self, h: f64) {
        if self.pages.is_empty() || self.y + h > self.geometry.break_y() {
            self.add_page();
        }
    }

    /// Draw one line of text in a `w` x `h` cell at the cursor.
    ///
    /// `w == 0` extends the cell to the right margin. With `ln` the cursor
    /// moves to the start of the next line, otherwise to the cell's right edge.
    pub fn cell(&mut self, w: f64, h: f64, text: &str, ln: bool, align: Align) {
        if self.pages.is_empty() {
            self.add_page();
        } else if !self.decorating && self.y + h > self.geometry.break_y() {
            let x = self.x;
            self.add_page();
            self.x = x;
        }

        let w = if w == 0.0 {
            self.geometry.width_mm - self.geometry.margin_mm - self.x
        } else {
            w
        };

        if !text.is_empty() {
            let dx = match align {
                Align::Left => CELL_PADDING_MM,
                Align::Center => (w - self.text_width(text)) / 2.0,
            };
            let baseline = self.y + 0.5 * h + 0.3 * self.size_pt * MM_PER_PT;
            let op = DrawOp::Text {
                x_mm: self.x + dx,
                baseline_mm: baseline,
                font: self.font,
                size_pt: self.size_pt,
                text: text.to_string(),
            };
            if let Some(page) = self.pages.last_mut() {
                page.ops.push(op);
            }
        }

        if ln {
            self.ln(h);
        } else {
            self.x += w;
        }
    }

    /// Word-wrap `text` into lines of width `w`, each in its own `h` cell.
    ///
    /// Every line starts at the current x; afterwards the cursor is at the
    /// left margin below the last line.
    pub fn multi_cell(&mut self, w: f64, h: f64, text: &str, align: Align) {
        let x0 = self.x;
        let w = if w == 0.0 {
            self.geometry.width_mm - self.geometry.margin_mm - x0
        } else {
            w
        };
        let lines = wrap_text(text, w - 2.0 * CELL_PADDING_MM, self.font, self.size_pt);
        for line in &lines {
            self.x = x0;
            self.cell(w, h, line, false, align);
            self.y += h;
        }
        self.x = self.geometry.margin_mm;
    }

    /// Place an image with its top-left corner at (`x`, `y`) on the current page.
    pub fn image(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if self.pages.is_empty() {
            self.add_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(DrawOp::Image {
                x_mm: x,
                y_mm: y,
                width_mm: width,
                height_mm: height,
            });
        }
    }

    /// Finish the last page and return all pages.
    pub fn finish(mut self) -> Vec<PageContent> {
        if self.pages.is_empty() {
            self.add_page();
        }
        self.draw_footer();
        self.pages
    }

    fn draw_header(&mut self) {
        let Some(header) = self.decorations.header.clone() else {
            return;
        };
        let saved = (self.font, self.size_pt);
        self.decorating = true;
        self.set_font(Font::Bold, HEADER_SIZE_PT);
        self.cell(0.0, 10.0, &header, true, Align::Center);
        self.ln(10.0);
        self.decorating = false;
        self.set_font(saved.0, saved.1);
    }

    fn draw_footer(&mut self) {
        if !self.decorations.footer || self.pages.is_empty() {
            return;
        }
        let saved = (self.font, self.size_pt, self.x, self.y);
        self.decorating = true;
        self.x = self.geometry.margin_mm;
        self.y = self.geometry.height_mm - PAGE_BREAK_MARGIN_MM;
        self.set_font(Font::Italic, FOOTER_SIZE_PT);
        let label = format!("Page {}", self.pages.len());
        self.cell(0.0, 10.0, &label, false, Align::Center);
        self.decorating = false;
        self.set_font(saved.0, saved.1);
        self.x = saved.2;
        self.y = saved.3;
    }
}

/// Break `text` into lines no wider than `max_width_mm`.
///
/// Lines break at spaces; a single word wider than the limit is split
/// between characters. Explicit newlines are kept. Always returns at least
/// one line.
pub fn wrap_text(text: &str, max_width_mm: f64, font: Font, size_pt: f64) -> Vec<String> {
    let space = string_width_mm(" ", font, size_pt);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_w = string_width_mm(word, font, size_pt);
            if current.is_empty() && word_w <= max_width_mm {
                current.push_str(word);
                current_w = word_w;
                continue;
            }
            if !current.is_empty() && current_w + space + word_w <= max_width_mm {
                current.push(' ');
                current.push_str(word);
                current_w += space + word_w;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0.0;
            }
            if word_w <= max_width_mm {
                current.push_str(word);
                current_w = word_w;
                continue;
            }
            for c in word.chars() {
                let c_w = string_width_mm(c.encode_utf8(&mut [0; 4]), font, size_pt);
                if !current.is_empty() && current_w + c_w > max_width_mm {
                    lines.push(std::mem::take(&mut current));
                    current_w = 0.0;
                }
                current.push(c);
                current_w += c_w;
            }
        }
        lines.push(current);
    }
    lines
}
