//! Error types for Tubescribe.

use thiserror::Error;

/// Library-level error type for Tubescribe operations.
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Media not found: {0}")]
    VideoNotFound(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Tubescribe operations.
pub type Result<T> = std::result::Result<T, ScribeError>;
