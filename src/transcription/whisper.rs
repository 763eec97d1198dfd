//! OpenAI Whisper API transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment, TranscriptionOptions};
use crate::audio::split_audio;
use crate::error::{Result, ScribeError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Audio longer than this is split before upload (the API caps file size).
const DEFAULT_CHUNK_SECONDS: u32 = 600;

/// Uploads of long chunks can take minutes.
const REQUEST_TIMEOUT_SECS: u64 = 300;

fn api_client() -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?;
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// OpenAI Whisper-based transcriber.
pub struct WhisperApiTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
}

impl WhisperApiTranscriber {
    /// Create a new transcriber for the given hosted model.
    pub fn with_model(model: &str) -> Result<Self> {
        Ok(Self {
            client: api_client()?,
            model: model.to_string(),
            chunk_duration_seconds: DEFAULT_CHUNK_SECONDS,
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(
        &self,
        audio_path: &Path,
        language: Option<&str>,
    ) -> Result<(Vec<TranscriptSegment>, String)> {
        debug!("Uploading audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| ScribeError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| ScribeError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok((segments, response.language))
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    fn name(&self) -> &str {
        "openai-whisper"
    }

    #[instrument(skip(self, options), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path, options: &TranscriptionOptions) -> Result<Transcript> {
        debug!("Model tier '{}' does not apply to {}", options.model, self.model);

        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;
        let language = options.language.as_deref();

        let chunk_count = chunks.len();
        info!("Transcribing {} audio chunk(s) with {}", chunk_count, self.model);

        let pb = ProgressBar::new(chunk_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
                .map_err(|e| ScribeError::Transcription(e.to_string()))?
                .progress_chars("█▓░"),
        );

        // Chunks run one after another; offsets keep the timeline continuous
        let mut all_segments = Vec::new();
        let mut detected = None;
        for (idx, (chunk_path, time_offset)) in chunks.into_iter().enumerate() {
            let (segments, chunk_language) = self
                .transcribe_single(&chunk_path, language)
                .await
                .map_err(|e| {
                    pb.finish_and_clear();
                    ScribeError::Transcription(format!(
                        "Chunk {} at {:.0}s failed: {}",
                        idx, time_offset, e
                    ))
                })?;
            pb.inc(1);

            detected.get_or_insert(chunk_language);
            all_segments.extend(segments.into_iter().map(|mut s| {
                s.start_seconds += time_offset;
                s.end_seconds += time_offset;
                s
            }));
        }
        pb.finish_and_clear();

        let language = options.language.clone().or(detected);
        Ok(Transcript::new(all_segments, language))
    }
}

/// Check if the OpenAI API key is configured.
pub fn is_api_key_configured() -> bool {
    usable_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())
}

fn usable_api_key(value: Option<&str>) -> bool {
    value.is_some_and(|key| !key.trim().is_empty())
}
