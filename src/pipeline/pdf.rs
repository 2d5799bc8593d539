//! PDF assembly with `lopdf`.
//!
//! Pages share one resource dictionary holding the three Helvetica faces
//! (WinAnsiEncoding) and, when present, the signature image as `/Im0`.

use crate::pipeline::fonts::{encode_winansi, Font, MM_PER_PT};
use crate::pipeline::layout::{DrawOp, PageContent, PageGeometry};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use std::path::Path;
use tracing::debug;

const IMAGE_NAME: &str = "Im0";
const JPEG_QUALITY: u8 = 90;

/// A signature image re-encoded as baseline JPEG for a DCTDecode XObject.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    jpeg: Vec<u8>,
    width_px: u32,
    height_px: u32,
}

impl SignatureImage {
    /// Decode any supported image file. Returns `None` (logged at debug
    /// level) when the file cannot be read or decoded.
    pub fn load(path: &Path) -> Option<Self> {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                debug!("Signature {} not usable: {}", path.display(), e);
                return None;
            }
        };
        let rgb = img.to_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        let mut jpeg = Vec::new();
        if let Err(e) = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
            rgb.as_raw(),
            width_px,
            height_px,
            ExtendedColorType::Rgb8,
        ) {
            debug!("Signature {} could not be re-encoded: {}", path.display(), e);
            return None;
        }
        debug!("Loaded signature {} ({}x{})", path.display(), width_px, height_px);
        Some(Self {
            jpeg,
            width_px,
            height_px,
        })
    }

    /// DCTDecode image XObject. The JPEG data is already compressed, so the
    /// stream is excluded from [`Document::compress`].
    fn to_stream(&self) -> Stream {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(self.width_px),
                "Height" => i64::from(self.height_px),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            self.jpeg.clone(),
        )
        .with_compression(false)
    }
}

fn pt(mm: f64) -> Object {
    Object::Real((mm / MM_PER_PT) as f32)
}

fn page_operations(page: &PageContent, page_height_mm: f64) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x_mm,
                baseline_mm,
                font,
                size_pt,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), Object::Real(*size_pt as f32)],
                ));
                ops.push(Operation::new(
                    "Td",
                    vec![pt(*x_mm), pt(page_height_mm - baseline_mm)],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_winansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Image {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        pt(*width_mm),
                        0.into(),
                        0.into(),
                        pt(*height_mm),
                        pt(*x_mm),
                        pt(page_height_mm - y_mm - height_mm),
                    ],
                ));
                ops.push(Operation::new("Do", vec![IMAGE_NAME.into()]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

/// Assemble `pages` into a compressed PDF 1.5 document and serialize it.
///
/// Image operations are dropped when no `signature` is supplied.
pub fn render_pdf(
    pages: &[PageContent],
    geometry: &PageGeometry,
    signature: Option<&SignatureImage>,
    title: &str,
) -> Result<Vec<u8>, String> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }

    let mut resources = dictionary! { "Font" => fonts };
    if let Some(sig) = signature {
        let image_id = doc.add_object(sig.to_stream());
        resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = page_operations(page, geometry.height_mm);
        if signature.is_none() {
            operations.retain(|op| !matches!(op.operator.as_str(), "q" | "cm" | "Do" | "Q"));
        }
        let content = Content { operations }
            .encode()
            .map_err(|e| format!("content stream encoding failed: {e}"))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), pt(geometry.width_mm), pt(geometry.height_mm)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_winansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal(concat!("edgequake-rowkit ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| format!("PDF serialization failed: {e}"))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageOrientation;
    use crate::pipeline::layout::{Align, Layout, PageDecorations};

    fn sample_pages(with_image: bool) -> (Vec<PageContent>, PageGeometry) {
        let geometry = PageGeometry::a4(PageOrientation::Landscape);
        let mut layout = Layout::new(geometry, PageDecorations::default());
        layout.add_page();
        layout.set_font(Font::Bold, 10.0);
        layout.cell(65.0, 6.0, "Name:", false, Align::Left);
        layout.set_font(Font::Regular, 10.0);
        layout.cell(0.0, 6.0, "Ann Lee", true, Align::Left);
        layout.add_page();
        layout.cell(0.0, 6.0, "Second page", true, Align::Left);
        if with_image {
            layout.image(200.0, 50.0, 80.0, 40.0);
        }
        (layout.finish(), geometry)
    }

    fn page_text(doc: &Document, page: u32) -> String {
        let pages = doc.get_pages();
        let content = doc.get_page_content(pages[&page]).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    #[test]
    fn test_render_pdf_round_trips_through_lopdf() {
        let (pages, geometry) = sample_pages(false);
        let bytes = render_pdf(&pages, &geometry, None, "Ann Lee").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let first = page_text(&doc, 1);
        assert!(first.contains("(Name:)"), "{first}");
        assert!(first.contains("(Ann Lee)"));
        assert!(first.contains("/F2"));
        assert!(page_text(&doc, 2).contains("(Second page)"));
    }

    #[test]
    fn test_image_ops_dropped_without_signature() {
        let (pages, geometry) = sample_pages(true);
        let bytes = render_pdf(&pages, &geometry, None, "t").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(!page_text(&doc, 2).contains("Do"));
    }

    #[test]
    fn test_signature_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sign.png");
        image::RgbImage::from_pixel(16, 8, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        let sig = SignatureImage::load(&path).expect("png decodes");
        assert_eq!((sig.width_px, sig.height_px), (16, 8));
        assert!(sig.jpeg.starts_with(&[0xFF, 0xD8]));

        let (pages, geometry) = sample_pages(true);
        let bytes = render_pdf(&pages, &geometry, Some(&sig), "t").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(page_text(&doc, 2).contains("/Im0 Do"));
    }

    #[test]
    fn test_bad_signature_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sign.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(SignatureImage::load(&path).is_none());
        assert!(SignatureImage::load(&dir.path().join("missing.jpg")).is_none());
    }
}
