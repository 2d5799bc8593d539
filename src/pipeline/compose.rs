//! Lays out one dataset row as label/value pairs.

use crate::config::{MissingValuePolicy, RenderConfig};
use crate::pipeline::fonts::Font;
use crate::pipeline::layout::{Align, Layout, PageContent, PageDecorations, PageGeometry, CELL_PADDING_MM};
use crate::pipeline::table::Dataset;
use crate::pipeline::text_repair::repair_text;

const TITLE_SIZE_PT: f64 = 14.0;
const TITLE_HEIGHT_MM: f64 = 10.0;
const TITLE_GAP_MM: f64 = 5.0;

/// Gap between the label column and wrapped values.
const VALUE_GAP_MM: f64 = 2.0;
const FIELD_GAP_MM: f64 = 2.0;
const CONTENT_END_GAP_MM: f64 = 5.0;

pub const SIGNATURE_WIDTH_MM: f64 = 80.0;
pub const SIGNATURE_HEIGHT_MM: f64 = 40.0;
const SIGNATURE_OFFSET_MM: f64 = 5.0;
const SIGNATURE_ADVANCE_MM: f64 = 45.0;

/// A label and the text drawn for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

/// Collapse whitespace runs to single spaces and optionally repair the text.
pub fn clean_text(raw: &str, repair: bool) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if repair {
        repair_text(&collapsed).trim().to_string()
    } else {
        collapsed
    }
}

/// The fields drawn for dataset row `row` (0-based), in column order.
///
/// Empty cells are skipped or replaced according to the missing-value policy.
pub fn collect_fields(
    dataset: &Dataset,
    row: usize,
    columns: &[usize],
    config: &RenderConfig,
) -> Vec<Field> {
    columns
        .iter()
        .filter_map(|&col| {
            let value = dataset
                .value(row, col)
                .map(|v| clean_text(v, config.text_repair))
                .filter(|v| !v.is_empty());
            let value = match (value, &config.missing) {
                (Some(v), _) => v,
                (None, MissingValuePolicy::Skip) => return None,
                (None, MissingValuePolicy::Placeholder(p)) => p.clone(),
            };
            Some(Field {
                label: clean_text(dataset.header(col), config.text_repair),
                value,
            })
        })
        .collect()
}

/// Lay out a row: optional title, the fields, then the optional signature.
///
/// Returns the pages ready for [`crate::pipeline::pdf::render_pdf`].
pub fn compose_row(
    fields: &[Field],
    title: Option<&str>,
    config: &RenderConfig,
    with_signature: bool,
) -> Vec<PageContent> {
    let geometry = PageGeometry::a4(config.orientation);
    let mut layout = Layout::new(
        geometry,
        PageDecorations {
            header: config.running_header.clone(),
            footer: config.page_footer,
        },
    );
    layout.add_page();

    if let Some(title) = title {
        layout.set_font(Font::Bold, TITLE_SIZE_PT);
        layout.cell(0.0, TITLE_HEIGHT_MM, title, true, Align::Center);
        layout.ln(TITLE_GAP_MM);
    }

    let margin = geometry.margin_mm;
    let size = config.font_size;
    let h = config.line_height_mm;
    let label_w = config.label_width_mm;
    let value_x = margin + label_w + VALUE_GAP_MM;
    let value_w = geometry.usable_width_mm() - label_w - VALUE_GAP_MM;

    for field in fields {
        let label = format!("{}:", field.label);
        layout.set_font(Font::Bold, size);
        layout.set_x(margin);

        if layout.text_width(&label) > label_w - 2.0 * CELL_PADDING_MM {
            // Label overflows its column: give it the full line.
            layout.multi_cell(0.0, h, &label, Align::Left);
            layout.set_font(Font::Regular, size);
            layout.set_x(value_x);
            layout.multi_cell(value_w, h, &field.value, Align::Left);
        } else {
            layout.cell(label_w, h, &label, false, Align::Left);
            layout.set_font(Font::Regular, size);
            if layout.text_width(&field.value) > value_w {
                layout.ln(h);
                layout.set_x(value_x);
                layout.multi_cell(value_w, h, &field.value, Align::Left);
            } else {
                layout.cell(0.0, h, &field.value, true, Align::Left);
            }
        }
        layout.ln(FIELD_GAP_MM);
    }

    layout.ln(CONTENT_END_GAP_MM);

    if with_signature {
        layout.ensure_space(SIGNATURE_OFFSET_MM + SIGNATURE_HEIGHT_MM);
        let x = geometry.width_mm - SIGNATURE_WIDTH_MM - margin;
        let y = layout.y() + SIGNATURE_OFFSET_MM;
        layout.image(x, y, SIGNATURE_WIDTH_MM, SIGNATURE_HEIGHT_MM);
        layout.ln(SIGNATURE_ADVANCE_MM);
    }

    layout.finish()
}
