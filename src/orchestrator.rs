//! Pipeline orchestrator for Tubescribe.
//!
//! Runs one media item through acquire, transcribe, optional translate,
//! render and cleanup. Stages run strictly in sequence.

use crate::audio_source::{Acquirer, MediaAcquirer};
use crate::config::Settings;
use crate::error::Result;
use crate::render::{render_document, DocumentContent, FontResolver};
use crate::transcription::{create_transcriber, ModelTier, Transcriber, Transcript, TranscriptionOptions};
use crate::translation::{
    fallback_count, normalize_target, translate_segments, GoogleTranslator, TranslatedSegment, Translator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per-run inputs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Media URL or bare video ID.
    pub locator: String,
    pub model: ModelTier,
    /// Forced source language; `None` auto-detects.
    pub language: Option<String>,
    /// Requested translation target; `None` keeps the original text only.
    pub target_language: Option<String>,
    /// Directory the PDF is written into.
    pub output_dir: PathBuf,
}

impl RunOptions {
    pub fn new(locator: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            locator: locator.into(),
            model: ModelTier::default(),
            language: None,
            target_language: None,
            output_dir,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct PipelineReport {
    pub title: String,
    pub output_path: PathBuf,
    pub transcript: Transcript,
    /// `None` when translation was skipped.
    pub translated: Option<Vec<TranslatedSegment>>,
    /// Segments that kept their original text.
    pub fallbacks: usize,
    pub custom_font_loaded: bool,
    pub pages: usize,
}

/// The main orchestrator for the Tubescribe pipeline.
pub struct Orchestrator {
    settings: Settings,
    acquirer: Arc<dyn Acquirer>,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    font_resolver: FontResolver,
}

impl Orchestrator {
    /// Create an orchestrator with the backends selected in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let acquirer: Arc<dyn Acquirer> = Arc::new(MediaAcquirer::new(temp_dir)?);
        let transcriber = create_transcriber(&settings)?;
        info!("Using {} transcription", transcriber.name());

        let translator: Arc<dyn Translator> = Arc::new(GoogleTranslator::with_endpoint(
            &settings.translation.endpoint,
            Duration::from_secs(settings.translation.timeout_seconds),
        )?);
        let font_resolver = FontResolver::new(settings.font_path(), settings.font_url())?;

        Ok(Self {
            settings,
            acquirer,
            transcriber,
            translator,
            font_resolver,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        acquirer: Arc<dyn Acquirer>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        font_resolver: FontResolver,
    ) -> Self {
        Self {
            settings,
            acquirer,
            transcriber,
            translator,
            font_resolver,
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline for one media item.
    ///
    /// Acquisition and transcription failures abort the run and no document is
    /// written. Translation and font problems only degrade the output.
    #[instrument(skip(self, options), fields(locator = %options.locator))]
    pub async fn run(&self, options: &RunOptions) -> Result<PipelineReport> {
        // Acquire
        info!("Downloading audio...");
        let acquired = self.acquirer.acquire(&options.locator).await?;
        info!("Audio ready: {}", acquired.audio_path.display());

        // Transcribe
        let transcription_options = TranscriptionOptions {
            model: options.model,
            language: options.language.clone(),
        };
        info!("Transcribing with model '{}'...", options.model);
        let transcript = self
            .transcriber
            .transcribe(&acquired.audio_path, &transcription_options)
            .await?;
        info!(
            "Transcription complete: {} segments, language '{}'",
            transcript.segments.len(),
            transcript.language
        );

        // Translate
        let target = normalize_target(
            options.target_language.as_deref(),
            &self.settings.translation.keep_original_language,
        );
        let translated = match &target {
            Some(target) => Some(
                translate_segments(
                    self.translator.as_ref(),
                    &transcript.segments,
                    target,
                    self.settings.translation.max_concurrent,
                )
                .await,
            ),
            None => {
                debug!("Translation skipped");
                None
            }
        };
        let fallbacks = translated.as_deref().map(fallback_count).unwrap_or(0);

        // Render
        info!("Generating PDF...");
        let font = self.font_resolver.resolve().await;
        let content = DocumentContent {
            title: &acquired.title,
            segments: &transcript.segments,
            translated: translated.as_deref(),
            translation_enabled: target.is_some(),
        };
        let rendered = render_document(&content, &font, &options.output_dir);

        // Cleanup runs whether or not the document was written
        remove_audio(&acquired.audio_path);
        let document = rendered?;

        Ok(PipelineReport {
            title: acquired.title,
            output_path: document.path,
            transcript,
            translated,
            fallbacks,
            custom_font_loaded: document.custom_font_loaded,
            pages: document.pages,
        })
    }
}

/// Best-effort removal of the temporary audio file.
fn remove_audio(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("Temporary audio file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Audio file already gone: {}", path.display())
        }
        Err(e) => warn!("Failed to cleanup audio file {}: {}", path.display(), e),
    }
}
