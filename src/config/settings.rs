//! Configuration settings for Tubescribe.

use crate::transcription::ModelTier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the Unicode font is fetched from when it is not cached yet.
pub const DEFAULT_FONT_URL: &str =
    "https://github.com/dejavu-fonts/dejavu-fonts/raw/master/ttf/DejaVuSans.ttf";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub translation: TranslationSettings,
    pub render: RenderSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (font cache).
    pub data_dir: String,
    /// Directory for temporary files (downloaded audio).
    pub temp_dir: String,
    /// Directory where finished documents are written.
    pub output_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.tubescribe".to_string(),
            temp_dir: "/tmp/tubescribe".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

/// Transcription provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// Local `whisper` command line tool (default).
    #[default]
    Local,
    /// Hosted OpenAI Whisper API.
    OpenAI,
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "whisper" => Ok(TranscriptionProvider::Local),
            "openai" | "api" => Ok(TranscriptionProvider::OpenAI),
            _ => Err(format!("Unknown transcription provider: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionProvider::Local => write!(f, "local"),
            TranscriptionProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcription provider (local, openai).
    pub provider: TranscriptionProvider,
    /// Whisper model tier for the local provider (tiny, base, small, medium, large).
    pub model: String,
    /// Name or path of the local whisper executable.
    pub whisper_binary: String,
    /// Model used by the OpenAI provider.
    pub openai_model: String,
    /// Force a source language instead of auto-detection.
    pub language: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::Local,
            model: ModelTier::default().to_string(),
            whisper_binary: "whisper".to_string(),
            openai_model: "whisper-1".to_string(),
            language: None,
        }
    }
}

/// Translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// Maximum concurrent translation calls (1 = sequential).
    pub max_concurrent: usize,
    /// Target code that means "keep the original text" and skips translation.
    pub keep_original_language: String,
    /// Per-request timeout for the translation backend.
    pub timeout_seconds: u64,
    /// Translation endpoint.
    pub endpoint: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            keep_original_language: "en".to_string(),
            timeout_seconds: 30,
            endpoint: crate::translation::DEFAULT_GOOGLE_ENDPOINT.to_string(),
        }
    }
}

/// Document rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Unicode font location, relative paths resolve under `general.data_dir`.
    pub font_path: String,
    /// Download URL for the font. Empty disables downloading.
    pub font_url: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            font_path: "fonts/DejaVuSans.ttf".to_string(),
            font_url: DEFAULT_FONT_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ScribeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubescribe")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Location of the cached Unicode font.
    pub fn font_path(&self) -> PathBuf {
        let path = Self::expand_path(&self.render.font_path);
        if path.is_absolute() {
            path
        } else {
            self.data_dir().join(path)
        }
    }

    /// Font download URL, if downloading is enabled.
    pub fn font_url(&self) -> Option<String> {
        let url = self.render.font_url.trim();
        (!url.is_empty()).then(|| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.transcription.provider, TranscriptionProvider::Local);
        assert_eq!(settings.transcription.model, "base");
        assert_eq!(settings.translation.keep_original_language, "en");
        assert_eq!(settings.font_url().as_deref(), Some(DEFAULT_FONT_URL));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [transcription]
            provider = "openai"

            [render]
            font_url = ""
            "#,
        )
        .unwrap();

        assert_eq!(settings.transcription.provider, TranscriptionProvider::OpenAI);
        assert_eq!(settings.transcription.whisper_binary, "whisper");
        assert_eq!(settings.translation.max_concurrent, 4);
        assert!(settings.font_url().is_none());
    }

    #[test]
    fn test_relative_font_path_lives_in_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/var/lib/tubescribe".to_string();
        assert_eq!(
            settings.font_path(),
            PathBuf::from("/var/lib/tubescribe/fonts/DejaVuSans.ttf")
        );

        settings.render.font_path = "/opt/fonts/Noto.ttf".to_string();
        assert_eq!(settings.font_path(), PathBuf::from("/opt/fonts/Noto.ttf"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.translation.max_concurrent = 1;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.translation.max_concurrent, 1);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("whisper".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::Local);
        assert_eq!("OpenAI".parse::<TranscriptionProvider>().unwrap(), TranscriptionProvider::OpenAI);
        assert!("fusion".parse::<TranscriptionProvider>().is_err());
    }
}
