//! Transcription module for Tubescribe.
//!
//! Speech-to-text is an external collaborator behind the [`Transcriber`] trait.
//!
//! # Providers
//!
//! - **Local** (default): the `whisper` command line tool, using a model tier.
//! - **OpenAI**: the hosted Whisper API. The model tier does not apply.

mod local;
mod models;
mod whisper;

pub use local::LocalWhisperTranscriber;
pub use models::{format_timestamp_range, Transcript, TranscriptSegment, UNKNOWN_LANGUAGE};
pub use whisper::{is_api_key_configured, WhisperApiTranscriber};

use crate::config::{Settings, TranscriptionProvider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Whisper model size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelTier {
    pub const ALL: [ModelTier; 5] = [
        ModelTier::Tiny,
        ModelTier::Base,
        ModelTier::Small,
        ModelTier::Medium,
        ModelTier::Large,
    ];

    /// Parse a tier, substituting the default for anything unrecognized.
    pub fn parse_or_default(input: &str) -> Self {
        input.parse().unwrap_or_else(|_| {
            let fallback = ModelTier::default();
            warn!("Invalid model name '{}'. Using '{}' model by default.", input.trim(), fallback);
            fallback
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tiny" => Ok(ModelTier::Tiny),
            "base" => Ok(ModelTier::Base),
            "small" => Ok(ModelTier::Small),
            "medium" => Ok(ModelTier::Medium),
            "large" => Ok(ModelTier::Large),
            _ => Err(format!(
                "Unknown model: {}. Use tiny, base, small, medium, or large.",
                s
            )),
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run transcription options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionOptions {
    pub model: ModelTier,
    /// Forced source language; `None` lets the backend detect it.
    pub language: Option<String>,
}

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Transcribe an audio file and return ordered segments plus the detected language.
    async fn transcribe(&self, audio_path: &Path, options: &TranscriptionOptions) -> Result<Transcript>;
}

/// Build the transcriber selected in the settings.
pub fn create_transcriber(settings: &Settings) -> Result<Arc<dyn Transcriber>> {
    let transcriber: Arc<dyn Transcriber> = match settings.transcription.provider {
        TranscriptionProvider::Local => Arc::new(LocalWhisperTranscriber::new(
            &settings.transcription.whisper_binary,
        )),
        TranscriptionProvider::OpenAI => Arc::new(WhisperApiTranscriber::with_model(
            &settings.transcription.openai_model,
        )?),
    };
    Ok(transcriber)
}
