//! Transcript document rendering.
//!
//! Layout is computed up front as a list of pages of draw operations, then
//! written to PDF in one pass.

mod font;
mod layout;
mod pdf;

pub use font::{DocumentFont, FontResolver};
pub use layout::{
    layout_document, wrap_text, DocumentContent, DrawOp, Page, TextStyle, ORIGINAL_LABEL,
    TRANSLATED_LABEL,
};
pub use pdf::{pdf_bytes, write_pdf};

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const FALLBACK_FILE_STEM: &str = "transcript";
/// Leaves room for the extension under the usual 255-byte name limit.
const MAX_STEM_BYTES: usize = 200;

/// Result of rendering one document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub path: PathBuf,
    pub pages: usize,
    /// Whether the Unicode font ended up in the file.
    pub custom_font_loaded: bool,
}

/// File name for a document titled `title`.
///
/// Path separators are replaced so the file always lands directly in the
/// output directory. Long titles are cut on a character boundary.
pub fn output_file_name(title: &str) -> String {
    let stem = title.trim();
    let stem = if stem.is_empty() { FALLBACK_FILE_STEM } else { stem };
    let stem = truncate_bytes(stem, MAX_STEM_BYTES).trim_end();
    format!("{}.pdf", stem).replace(['/', '\\'], "-")
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a char.
fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let end = text
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &text[..end]
}

/// Lay out and write the document into `output_dir`.
///
/// If the Unicode font cannot be embedded the whole document is laid out
/// again with the built-in font.
#[instrument(skip(content, font), fields(title = %content.title, segments = content.segments.len()))]
pub fn render_document(
    content: &DocumentContent<'_>,
    font: &DocumentFont,
    output_dir: &Path,
) -> Result<RenderedDocument> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(output_file_name(content.title));

    let pages = layout_document(content, font);
    let (pages, custom_font_loaded) = match write_pdf(&pages, content.title, font, &path) {
        Ok(()) => (pages.len(), font.is_custom()),
        Err(e) if font.is_custom() => {
            warn!("Error embedding custom font: {}. Using default font (Helvetica).", e);
            let builtin = DocumentFont::Builtin;
            let pages = layout_document(content, &builtin);
            write_pdf(&pages, content.title, &builtin, &path)?;
            (pages.len(), false)
        }
        Err(e) => return Err(e),
    };

    info!("PDF saved to {} ({} page(s))", path.display(), pages);
    Ok(RenderedDocument {
        path,
        pages,
        custom_font_loaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptSegment;
    use crate::translation::TranslatedSegment;

    const SYSTEM_DEJAVU: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 2.0, "Hello"),
            TranscriptSegment::new(2.0, 5.0, "world"),
            TranscriptSegment::new(5.0, 6.0, ""),
        ]
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("Talk"), "Talk.pdf");
        assert_eq!(output_file_name("A/B"), "A-B.pdf");
        assert_eq!(output_file_name("C:\\dir\\x"), "C:-dir-x.pdf");
        assert_eq!(output_file_name("   "), "transcript.pdf");
    }

    #[test]
    fn test_long_multibyte_title_is_shortened() {
        let title = "日本語のタイトル".repeat(12);
        assert!(title.len() > 255);

        let name = output_file_name(&title);
        assert!(name.len() <= MAX_STEM_BYTES + ".pdf".len());
        assert!(name.ends_with(".pdf"));
        assert!(title.starts_with(name.trim_end_matches(".pdf")));

        let dir = tempfile::tempdir().unwrap();
        let segs = segments();
        let content = DocumentContent {
            title: &title,
            segments: &segs,
            translated: None,
            translation_enabled: false,
        };
        let doc = render_document(&content, &DocumentFont::Builtin, dir.path()).unwrap();
        assert!(doc.path.exists());
        assert_eq!(doc.path.file_name().and_then(|n| n.to_str()), Some(name.as_str()));
    }

    #[test]
    fn test_truncate_bytes_respects_char_boundaries() {
        assert_eq!(truncate_bytes("abc", 10), "abc");
        assert_eq!(truncate_bytes("日本語", 7), "日本");
        assert_eq!(truncate_bytes("日本語", 2), "");
    }

    #[test]
    fn test_unicode_font_document_renders() {
        let Ok(data) = std::fs::read(SYSTEM_DEJAVU) else {
            return;
        };
        let font = DocumentFont::custom("DejaVuSans", data).unwrap();
        let segs: Vec<_> = (0..40)
            .map(|i| {
                TranscriptSegment::new(i as f64 * 3.0, i as f64 * 3.0 + 3.0, "Привет, мир. 你好，世界。")
            })
            .collect();
        let content = DocumentContent {
            title: "Ünïcode-タイトル",
            segments: &segs,
            translated: None,
            translation_enabled: false,
        };

        let dir = tempfile::tempdir().unwrap();
        let doc = render_document(&content, &font, dir.path()).unwrap();
        assert!(doc.custom_font_loaded);
        assert!(doc.pages >= 1);
        assert_eq!(doc.path, dir.path().join("Ünïcode-タイトル.pdf"));

        let bytes = std::fs::read(&doc.path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let texts: Vec<_> = layout_document(&content, &font)
            .iter()
            .flat_map(|p| p.texts().map(String::from).collect::<Vec<_>>())
            .collect();
        assert!(texts.iter().any(|t| t.contains("Привет")));
    }

    #[test]
    fn test_title_with_separator_stays_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let segs = segments();
        let content = DocumentContent {
            title: "A/B",
            segments: &segs,
            translated: None,
            translation_enabled: false,
        };

        let doc = render_document(&content, &DocumentFont::Builtin, dir.path()).unwrap();
        assert_eq!(doc.path, dir.path().join("A-B.pdf"));
        assert!(doc.path.exists());
        assert!(!dir.path().join("A").exists());
        assert!(!doc.custom_font_loaded);
    }

    #[test]
    fn test_disabled_translation_has_no_translated_blocks() {
        let segs = segments();
        let translated = vec![TranslatedSegment {
            start_seconds: 0.0,
            end_seconds: 2.0,
            text: "Bonjour".to_string(),
            fell_back: false,
        }];
        let content = DocumentContent {
            title: "T",
            segments: &segs,
            translated: Some(&translated),
            translation_enabled: false,
        };

        let pages = layout_document(&content, &DocumentFont::Builtin);
        let texts: Vec<_> = pages.iter().flat_map(|p| p.texts()).collect();
        assert!(!texts.contains(&TRANSLATED_LABEL));
        assert!(!texts.contains(&"Bonjour"));
        assert_eq!(texts.iter().filter(|t| **t == ORIGINAL_LABEL).count(), 3);
    }

    #[test]
    fn test_bilingual_document_renders() {
        let dir = tempfile::tempdir().unwrap();
        let segs = segments();
        let translated = vec![
            TranslatedSegment {
                start_seconds: 0.0,
                end_seconds: 2.0,
                text: "Bonjour".to_string(),
                fell_back: false,
            },
            TranslatedSegment {
                start_seconds: 2.0,
                end_seconds: 5.0,
                text: "monde".to_string(),
                fell_back: false,
            },
            TranslatedSegment {
                start_seconds: 5.0,
                end_seconds: 6.0,
                text: String::new(),
                fell_back: true,
            },
        ];
        let content = DocumentContent {
            title: "Talk",
            segments: &segs,
            translated: Some(&translated),
            translation_enabled: true,
        };

        let doc = render_document(&content, &DocumentFont::Builtin, dir.path()).unwrap();
        assert_eq!(doc.pages, 1);
        let bytes = std::fs::read(&doc.path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let pages = layout_document(&content, &DocumentFont::Builtin);
        let texts: Vec<_> = pages.iter().flat_map(|p| p.texts()).collect();
        assert!(texts.contains(&"[00:00-00:02]"));
        assert!(texts.contains(&"[00:02-00:05]"));
        assert!(texts.contains(&"[00:05-00:06]"));
        assert_eq!(texts.iter().filter(|t| **t == TRANSLATED_LABEL).count(), 2);
    }

    #[test]
    fn test_unembeddable_custom_font_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let segs = segments();
        let content = DocumentContent {
            title: "Fallback",
            segments: &segs,
            translated: None,
            translation_enabled: false,
        };
        // Bypasses validation to simulate a face the PDF writer rejects
        let font = DocumentFont::Custom {
            name: "Broken".to_string(),
            data: b"not a font".to_vec(),
            widths: Default::default(),
        };

        let doc = render_document(&content, &font, dir.path()).unwrap();
        assert!(!doc.custom_font_loaded);
        assert!(doc.path.exists());
    }
}
