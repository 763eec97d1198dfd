//! PDF emission for laid-out pages.

use super::font::DocumentFont;
use super::layout::{DrawOp, Page, TextStyle, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::{Result, ScribeError};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use std::path::Path;
use tracing::debug;

const LAYER_NAME: &str = "Transcript";

/// Fonts registered with one PDF document.
struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl FontSet {
    /// The custom font has a single face, so labels reuse it.
    fn register(doc: &PdfDocumentReference, font: &DocumentFont) -> Result<Self> {
        match font {
            DocumentFont::Custom { name, data, .. } => {
                let face = doc
                    .add_external_font(data.as_slice())
                    .map_err(|e| ScribeError::Font(format!("Cannot embed {}: {}", name, e)))?;
                Ok(Self {
                    regular: face.clone(),
                    bold: face,
                })
            }
            DocumentFont::Builtin => {
                let regular = doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ScribeError::Render(e.to_string()))?;
                let bold = doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ScribeError::Render(e.to_string()))?;
                Ok(Self { regular, bold })
            }
        }
    }

    fn for_style(&self, style: TextStyle) -> &IndirectFontRef {
        if style.is_bold() {
            &self.bold
        } else {
            &self.regular
        }
    }
}

fn grey(level: f32) -> Color {
    Color::Rgb(Rgb::new(level, level, level, None))
}

/// PDF y axis grows upwards from the bottom edge.
fn from_top(y: f32) -> Mm {
    Mm(PAGE_HEIGHT_MM - y)
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &FontSet) {
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                baseline,
                style,
                text,
            } => {
                if text.is_empty() {
                    continue;
                }
                let shade = if *style == TextStyle::Header { 30.0 / 255.0 } else { 0.0 };
                layer.set_fill_color(grey(shade));
                layer.use_text(
                    text.as_str(),
                    style.size_pt(),
                    Mm(*x),
                    from_top(*baseline),
                    fonts.for_style(*style),
                );
            }
            DrawOp::Rule { x1, x2, y } => {
                layer.set_outline_color(grey(100.0 / 255.0));
                layer.set_outline_thickness(0.6);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1), from_top(*y)), false),
                        (Point::new(Mm(*x2), from_top(*y)), false),
                    ],
                    is_closed: false,
                });
            }
        }
    }
}

/// Serialize pages into PDF bytes.
///
/// Font registration happens before any page is drawn, so a font error
/// surfaces before content is committed.
pub fn pdf_bytes(pages: &[Page], title: &str, font: &DocumentFont) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
    let fonts = FontSet::register(&doc, font)?;

    for (idx, page) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, page, &fonts);
    }

    debug!("Serializing {} page(s)", pages.len().max(1));
    doc.save_to_bytes()
        .map_err(|e| ScribeError::Render(format!("Cannot serialize PDF: {}", e)))
}

/// Write pages to `path` as a PDF file.
pub fn write_pdf(pages: &[Page], title: &str, font: &DocumentFont, path: &Path) -> Result<()> {
    let bytes = pdf_bytes(pages, title, font)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
