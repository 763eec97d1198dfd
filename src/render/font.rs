//! Font selection for rendered documents.
//!
//! A Unicode TrueType font is preferred. It is read from a fixed location and
//! downloaded there on first use. When that fails the document falls back to
//! the built-in Helvetica for its whole length.

use crate::error::{Result, ScribeError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const POINT_TO_MM: f32 = 25.4 / 72.0;
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// Horizontal advances of a TrueType face, read once when the font loads.
#[derive(Debug, Clone, Default)]
pub struct GlyphWidths {
    units_per_em: u16,
    advances: HashMap<char, u16>,
}

impl GlyphWidths {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let mut advances = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code| {
                    let Some(c) = char::from_u32(code) else {
                        return;
                    };
                    if let Some(advance) = subtable
                        .glyph_index(code)
                        .and_then(|glyph| face.glyph_hor_advance(glyph))
                    {
                        advances.entry(c).or_insert(advance);
                    }
                });
            }
        }
        Self {
            units_per_em: face.units_per_em(),
            advances,
        }
    }

    /// Width in ems; characters without a glyph count as half an em.
    fn measure(&self, text: &str) -> f32 {
        if self.units_per_em == 0 {
            return builtin_width(text);
        }
        let units_per_em = f32::from(self.units_per_em);
        let fallback = units_per_em / 2.0;
        text.chars()
            .map(|c| self.advances.get(&c).copied().map(f32::from).unwrap_or(fallback))
            .sum::<f32>()
            / units_per_em
    }
}

/// The font every block of one document is drawn with.
#[derive(Clone)]
pub enum DocumentFont {
    /// Unicode TrueType font loaded from disk.
    Custom {
        name: String,
        data: Vec<u8>,
        widths: Arc<GlyphWidths>,
    },
    /// Built-in Latin-only Helvetica.
    Builtin,
}

impl std::fmt::Debug for DocumentFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFont::Custom { name, data, widths } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("bytes", &data.len())
                .field("glyphs", &widths.advances.len())
                .finish(),
            DocumentFont::Builtin => f.write_str("Builtin"),
        }
    }
}

impl DocumentFont {
    /// Wrap TrueType bytes, rejecting anything that does not parse.
    pub fn custom(name: &str, data: Vec<u8>) -> Result<Self> {
        let widths = {
            let face = parse_face(&data)?;
            GlyphWidths::from_face(&face)
        };
        Ok(DocumentFont::Custom {
            name: name.to_string(),
            data,
            widths: Arc::new(widths),
        })
    }

    /// Whether the Unicode font is in use.
    pub fn is_custom(&self) -> bool {
        matches!(self, DocumentFont::Custom { .. })
    }

    /// Display name of the regular face.
    pub fn name(&self) -> &str {
        match self {
            DocumentFont::Custom { name, .. } => name,
            DocumentFont::Builtin => "Helvetica",
        }
    }

    /// Map text onto what this font can draw.
    ///
    /// The built-in font only covers Latin-1; everything else becomes `?`.
    /// Tabs become spaces and other control characters are dropped.
    pub fn prepare_text(&self, text: &str) -> String {
        text.chars()
            .filter_map(|c| match c {
                '\t' => Some(' '),
                '\n' => Some('\n'),
                c if c.is_control() => None,
                c if self.is_custom() => Some(c),
                c if (' '..='~').contains(&c) || ('\u{a0}'..='\u{ff}').contains(&c) => Some(c),
                _ => Some('?'),
            })
            .collect()
    }

    /// Width of `text` in millimetres at `size_pt`.
    pub fn text_width(&self, text: &str, size_pt: f32) -> f32 {
        let em_units = match self {
            DocumentFont::Custom { widths, .. } => widths.measure(text),
            DocumentFont::Builtin => builtin_width(text),
        };
        em_units * size_pt * POINT_TO_MM
    }
}

/// Width in ems using the Helvetica metrics.
fn builtin_width(text: &str) -> f32 {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                HELVETICA_WIDTHS[(code - 32) as usize]
            } else {
                HELVETICA_DEFAULT_WIDTH
            }
        })
        .map(f32::from)
        .sum::<f32>()
        / 1000.0
}

fn parse_face(data: &[u8]) -> Result<ttf_parser::Face<'_>> {
    ttf_parser::Face::parse(data, 0)
        .map_err(|e| ScribeError::Font(format!("Not a usable TrueType font: {}", e)))
}

/// Resolves the document font once per document.
pub struct FontResolver {
    font_path: PathBuf,
    font_url: Option<String>,
    client: reqwest::Client,
}

impl FontResolver {
    pub fn new(font_path: PathBuf, font_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            font_path,
            font_url,
            client,
        })
    }

    pub fn font_path(&self) -> &Path {
        &self.font_path
    }

    /// Load the Unicode font, downloading it if needed, or fall back to the
    /// built-in font. Never fails.
    #[instrument(skip(self), fields(path = %self.font_path.display()))]
    pub async fn resolve(&self) -> DocumentFont {
        match self.load().await {
            Ok(font) => {
                info!("Custom Unicode font loaded ({})", font.name());
                font
            }
            Err(e) => {
                warn!("Error loading custom font: {}. Using default font (Helvetica).", e);
                DocumentFont::Builtin
            }
        }
    }

    async fn load(&self) -> Result<DocumentFont> {
        let data = if self.font_path.exists() {
            debug!("Reading cached font");
            tokio::fs::read(&self.font_path).await?
        } else {
            self.download().await?
        };

        let name = self
            .font_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unicode");
        DocumentFont::custom(name, data)
    }

    /// Fetch the font and cache it at `font_path`.
    async fn download(&self) -> Result<Vec<u8>> {
        let url = self.font_url.as_deref().ok_or_else(|| {
            ScribeError::Font(format!(
                "{} not found and no download URL is configured",
                self.font_path.display()
            ))
        })?;

        info!("{} not found, downloading from {}", self.font_path.display(), url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec();

        // Only cache something that will load next time
        parse_face(&bytes)?;

        if let Some(parent) = self.font_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.font_path, &bytes).await?;
        info!("Font downloaded successfully");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM_DEJAVU: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    #[test]
    fn test_builtin_prepare_text_replaces_non_latin() {
        let font = DocumentFont::Builtin;
        assert_eq!(font.prepare_text("café"), "café");
        assert_eq!(font.prepare_text("こんにちは"), "?????");
        assert_eq!(font.prepare_text("a\tb\u{7}c"), "a bc");
    }

    #[test]
    fn test_builtin_width() {
        let font = DocumentFont::Builtin;
        // "Hi" = 722 + 222 units
        let expected = 0.944 * 11.0 * POINT_TO_MM;
        assert!((font.text_width("Hi", 11.0) - expected).abs() < 1e-4);
        assert_eq!(font.text_width("", 11.0), 0.0);
        assert!(font.text_width("WWW", 11.0) > font.text_width("iii", 11.0));
    }

    #[test]
    fn test_custom_rejects_garbage() {
        let err = DocumentFont::custom("Broken", b"<html>404</html>".to_vec()).unwrap_err();
        assert!(matches!(err, ScribeError::Font(_)));
    }

    #[tokio::test]
    async fn test_missing_font_without_url_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FontResolver::new(dir.path().join("fonts/DejaVuSans.ttf"), None).unwrap();

        let font = resolver.resolve().await;
        assert!(!font.is_custom());
        assert_eq!(font.name(), "Helvetica");
    }

    #[tokio::test]
    async fn test_unfetchable_font_falls_back_without_caching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fonts/DejaVuSans.ttf");
        let resolver =
            FontResolver::new(path.clone(), Some("http://127.0.0.1:9/DejaVuSans.ttf".to_string())).unwrap();

        let font = resolver.resolve().await;
        assert!(!font.is_custom());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_cached_font_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DejaVuSans.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();

        let resolver = FontResolver::new(path, None).unwrap();
        assert!(!resolver.resolve().await.is_custom());
    }

    #[tokio::test]
    async fn test_cached_font_is_loaded() {
        if !Path::new(SYSTEM_DEJAVU).exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DejaVuSans.ttf");
        std::fs::copy(SYSTEM_DEJAVU, &path).unwrap();

        let resolver = FontResolver::new(path, None).unwrap();
        let font = resolver.resolve().await;
        assert!(font.is_custom());
        assert_eq!(font.name(), "DejaVuSans");
        assert_eq!(font.prepare_text("こんにちは"), "こんにちは");
        assert!(font.text_width("Hello", 11.0) > 0.0);
    }

    #[test]
    fn test_cached_widths_match_face_advances() {
        let Ok(data) = std::fs::read(SYSTEM_DEJAVU) else {
            return;
        };
        let face = ttf_parser::Face::parse(&data, 0).unwrap();
        let units = f32::from(face.units_per_em());
        let direct: f32 = "Привет"
            .chars()
            .map(|c| f32::from(face.glyph_hor_advance(face.glyph_index(c).unwrap()).unwrap()))
            .sum::<f32>()
            / units;

        let font = DocumentFont::custom("DejaVuSans", data.clone()).unwrap();
        let expected = direct * 11.0 * POINT_TO_MM;
        assert!((font.text_width("Привет", 11.0) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_empty_widths_use_builtin_metrics() {
        let widths = GlyphWidths::default();
        assert_eq!(widths.measure("Hi"), builtin_width("Hi"));
    }
}
