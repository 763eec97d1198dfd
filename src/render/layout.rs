//! Page layout for transcript documents.
//!
//! Layout is pure: it turns segments into pages of positioned drawing
//! operations. All coordinates are millimetres measured from the top-left
//! corner of an A4 page.

use super::font::DocumentFont;
use crate::transcription::TranscriptSegment;
use crate::translation::TranslatedSegment;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_LEFT_MM: f32 = 10.0;
pub const MARGIN_RIGHT_MM: f32 = 10.0;
pub const MARGIN_TOP_MM: f32 = 10.0;
/// Content may not extend into the bottom margin.
pub const MARGIN_BOTTOM_MM: f32 = 15.0;

const HEADER_LINE_MM: f32 = 10.0;
const HEADER_GAP_MM: f32 = 2.0;
const RULE_GAP_MM: f32 = 8.0;
const BODY_LINE_MM: f32 = 8.0;
const TRANSLATION_GAP_MM: f32 = 2.0;
const SEGMENT_GAP_MM: f32 = 6.0;

pub const ORIGINAL_LABEL: &str = "Original:";
pub const TRANSLATED_LABEL: &str = "Translated:";

/// How a piece of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Running page header (title).
    Header,
    /// Timestamps and block labels.
    Label,
    /// Transcript text.
    Body,
}

impl TextStyle {
    pub fn size_pt(&self) -> f32 {
        match self {
            TextStyle::Header => 16.0,
            TextStyle::Label | TextStyle::Body => 11.0,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, TextStyle::Label)
    }
}

/// A positioned drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline, from the top of the page.
        baseline: f32,
        style: TextStyle,
        text: String,
    },
    /// Horizontal rule.
    Rule { x1: f32, x2: f32, y: f32 },
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text runs on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rule { .. } => None,
        })
    }

    /// Text runs with the given style.
    pub fn texts_with_style(&self, wanted: TextStyle) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(move |op| match op {
            DrawOp::Text { text, style, .. } if *style == wanted => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Width available to text between the side margins.
pub fn content_width() -> f32 {
    PAGE_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM
}

/// Inputs for laying out one document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContent<'a> {
    pub title: &'a str,
    pub segments: &'a [TranscriptSegment],
    pub translated: Option<&'a [TranslatedSegment]>,
    pub translation_enabled: bool,
}

impl<'a> DocumentContent<'a> {
    /// Translated text to show for segment `idx`, if any.
    fn translation_for(&self, idx: usize) -> Option<&'a str> {
        if !self.translation_enabled {
            return None;
        }
        self.translated?
            .get(idx)
            .map(|t| t.text.as_str())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Lay out the whole document.
pub fn layout_document(content: &DocumentContent<'_>, font: &DocumentFont) -> Vec<Page> {
    let mut writer = PageWriter::new(content.title, font);

    for (idx, segment) in content.segments.iter().enumerate() {
        writer.line(&segment.timestamp_label(), TextStyle::Label);

        writer.line(ORIGINAL_LABEL, TextStyle::Label);
        writer.paragraph(&segment.text);

        if let Some(translated) = content.translation_for(idx) {
            writer.gap(TRANSLATION_GAP_MM);
            writer.line(TRANSLATED_LABEL, TextStyle::Label);
            writer.paragraph(translated);
        }

        writer.gap(SEGMENT_GAP_MM);
    }

    writer.finish()
}

/// Cursor over a growing list of pages.
struct PageWriter<'a> {
    font: &'a DocumentFont,
    title: String,
    pages: Vec<Page>,
    y: f32,
    /// Lines placed below the header on the current page.
    body_lines: usize,
}

impl<'a> PageWriter<'a> {
    fn new(title: &str, font: &'a DocumentFont) -> Self {
        let mut writer = Self {
            font,
            title: font.prepare_text(title).replace('\n', " "),
            pages: Vec::new(),
            y: MARGIN_TOP_MM,
            body_lines: 0,
        };
        writer.new_page();
        writer
    }

    fn bottom_limit() -> f32 {
        PAGE_HEIGHT_MM - MARGIN_BOTTOM_MM
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Start a page and draw the running header on it.
    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN_TOP_MM;
        self.body_lines = 0;

        let style = TextStyle::Header;
        let font = self.font;
        let lines = wrap_text(&self.title, content_width(), |s| {
            font.text_width(s, style.size_pt())
        });
        for line in lines {
            let width = font.text_width(&line, style.size_pt());
            let x = MARGIN_LEFT_MM + ((content_width() - width) / 2.0).max(0.0);
            self.push_text(x, HEADER_LINE_MM, style, line);
        }

        self.y += HEADER_GAP_MM;
        let y = self.y;
        self.current().ops.push(DrawOp::Rule {
            x1: MARGIN_LEFT_MM,
            x2: PAGE_WIDTH_MM - MARGIN_RIGHT_MM,
            y,
        });
        self.y += RULE_GAP_MM;
    }

    fn push_text(&mut self, x: f32, height: f32, style: TextStyle, text: String) {
        // Vertically centre the glyphs in the line box
        let size_mm = style.size_pt() * 25.4 / 72.0;
        let baseline = self.y + height / 2.0 + size_mm * 0.35;
        self.current().ops.push(DrawOp::Text {
            x,
            baseline,
            style,
            text,
        });
        self.y += height;
    }

    /// Place one line at the left margin, breaking the page first if it would
    /// cross the bottom margin.
    fn line(&mut self, text: &str, style: TextStyle) {
        // A fresh page always takes at least one line
        if self.y + BODY_LINE_MM > Self::bottom_limit() && self.body_lines > 0 {
            self.new_page();
        }
        self.push_text(MARGIN_LEFT_MM, BODY_LINE_MM, style, text.to_string());
        self.body_lines += 1;
    }

    /// Wrapped body text. Empty text still occupies one line.
    fn paragraph(&mut self, text: &str) {
        let prepared = self.font.prepare_text(text);
        let size = TextStyle::Body.size_pt();
        let font = self.font;
        let lines = wrap_text(&prepared, content_width(), |s| font.text_width(s, size));
        for line in lines {
            self.line(&line, TextStyle::Body);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

/// Greedy word wrap on measured widths.
///
/// Explicit newlines start a new line, words wider than `max_width` are split
/// between characters, and nothing is ever dropped. Always returns at least
/// one line.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if measure(word) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if measure(&current) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment::new(start, end, text)
    }

    fn tr(start: f64, end: f64, text: &str, fell_back: bool) -> TranslatedSegment {
        TranslatedSegment {
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
            fell_back,
        }
    }

    fn all_texts(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn char_count(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_wrap_short_text() {
        assert_eq!(wrap_text("hello world", 20.0, char_count), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_reflows_words() {
        let lines = wrap_text("the quick brown fox jumps", 10.0, char_count);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_text("abcdefghij xy", 4.0, char_count);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
        assert_eq!(lines.concat(), "abcdefghijxy");
    }

    #[test]
    fn test_wrap_keeps_newlines_and_empty_text() {
        assert_eq!(wrap_text("a\nb", 10.0, char_count), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10.0, char_count), vec![""]);
    }

    #[test]
    fn test_wrap_with_font_metrics_fits_width() {
        let font = DocumentFont::Builtin;
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let lines = wrap_text(&text, content_width(), |s| font.text_width(s, 11.0));

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(font.text_width(line, 11.0) <= content_width());
        }
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split_whitespace()).collect();
        assert_eq!(rejoined.len(), 200);
    }

    #[test]
    fn test_layout_without_translation() {
        let segments = vec![seg(0.0, 2.0, "Hello"), seg(2.0, 5.0, "world")];
        let translated = vec![tr(0.0, 2.0, "Bonjour", false), tr(2.0, 5.0, "monde", false)];
        let content = DocumentContent {
            title: "Demo",
            segments: &segments,
            translated: Some(&translated),
            translation_enabled: false,
        };

        let pages = layout_document(&content, &DocumentFont::Builtin);
        let texts = all_texts(&pages);

        assert_eq!(pages.len(), 1);
        assert!(!texts.iter().any(|t| t == TRANSLATED_LABEL));
        assert!(!texts.iter().any(|t| t == "Bonjour"));
        assert_eq!(
            texts,
            vec!["Demo", "[00:00-00:02]", "Original:", "Hello", "[00:02-00:05]", "Original:", "world"]
        );
    }

    #[test]
    fn test_layout_with_translation_orders_blocks() {
        let segments = vec![seg(0.0, 2.0, "Hello"), seg(2.0, 5.0, "world"), seg(5.0, 6.0, "")];
        let translated = vec![
            tr(0.0, 2.0, "Bonjour", false),
            tr(2.0, 5.0, "monde", false),
            tr(5.0, 6.0, "", true),
        ];
        let content = DocumentContent {
            title: "Demo",
            segments: &segments,
            translated: Some(&translated),
            translation_enabled: true,
        };

        let texts = all_texts(&layout_document(&content, &DocumentFont::Builtin));
        assert_eq!(
            texts,
            vec![
                "Demo",
                "[00:00-00:02]", "Original:", "Hello", "Translated:", "Bonjour",
                "[00:02-00:05]", "Original:", "world", "Translated:", "monde",
                "[00:05-00:06]", "Original:", "",
            ]
        );
    }

    #[test]
    fn test_layout_missing_translation_index_is_omitted() {
        let segments = vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b")];
        let translated = vec![tr(0.0, 1.0, "A", false)];
        let content = DocumentContent {
            title: "t",
            segments: &segments,
            translated: Some(&translated),
            translation_enabled: true,
        };

        let texts = all_texts(&layout_document(&content, &DocumentFont::Builtin));
        assert_eq!(texts.iter().filter(|t| *t == TRANSLATED_LABEL).count(), 1);
    }

    #[test]
    fn test_header_on_every_page() {
        let segments: Vec<_> = (0..60)
            .map(|i| seg(i as f64 * 3.0, i as f64 * 3.0 + 3.0, "Some spoken words"))
            .collect();
        let content = DocumentContent {
            title: "Long Talk",
            segments: &segments,
            translated: None,
            translation_enabled: false,
        };

        let pages = layout_document(&content, &DocumentFont::Builtin);
        assert!(pages.len() > 1);

        for page in &pages {
            assert_eq!(page.texts().next(), Some("Long Talk"));
            assert!(matches!(page.ops[1], DrawOp::Rule { x1, x2, .. } if x1 == 10.0 && x2 == 200.0));
            for op in &page.ops {
                if let DrawOp::Text { baseline, .. } = op {
                    assert!(*baseline < PAGE_HEIGHT_MM - MARGIN_BOTTOM_MM);
                }
            }
        }

        let timestamps: usize = pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with('[')).count())
            .sum();
        assert_eq!(timestamps, 60);
    }

    #[test]
    fn test_empty_document_has_header_page() {
        let content = DocumentContent {
            title: "Nothing said",
            segments: &[],
            translated: None,
            translation_enabled: false,
        };
        let pages = layout_document(&content, &DocumentFont::Builtin);
        assert_eq!(pages.len(), 1);
        assert_eq!(all_texts(&pages), vec!["Nothing said"]);
    }

    #[test]
    fn test_builtin_font_replaces_non_latin_text() {
        let segments = vec![seg(0.0, 1.0, "日本語 ok")];
        let content = DocumentContent {
            title: "タイトル",
            segments: &segments,
            translated: None,
            translation_enabled: false,
        };
        let texts = all_texts(&layout_document(&content, &DocumentFont::Builtin));
        assert_eq!(texts[0], "????");
        assert!(texts.contains(&"??? ok".to_string()));
    }

    #[test]
    fn test_title_is_centred() {
        let content = DocumentContent {
            title: "Hi",
            segments: &[],
            translated: None,
            translation_enabled: false,
        };
        let pages = layout_document(&content, &DocumentFont::Builtin);
        let DrawOp::Text { x, style, .. } = &pages[0].ops[0] else {
            panic!("expected header text");
        };
        assert_eq!(*style, TextStyle::Header);
        let width = DocumentFont::Builtin.text_width("Hi", 16.0);
        assert!((x + width / 2.0 - PAGE_WIDTH_MM / 2.0).abs() < 0.01);
    }
}
