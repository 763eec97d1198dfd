//! Per-segment translation.
//!
//! Every segment is translated independently. A failed item keeps its
//! original text so the output always lines up index-for-index with the
//! transcript.

mod google;

pub use google::{GoogleTranslator, DEFAULT_GOOGLE_ENDPOINT};

use crate::error::Result;
use crate::transcription::TranscriptSegment;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Source language value that asks the backend to detect the language.
pub const AUTO_SOURCE: &str = "auto";

/// Trait for translation backends.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` (or [`AUTO_SOURCE`]) into `target`.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// One element of the translated sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSegment {
    /// Copied from the source segment.
    pub start_seconds: f64,
    /// Copied from the source segment.
    pub end_seconds: f64,
    /// Translated text, or the original text when translation failed.
    pub text: String,
    /// Whether `text` is the untranslated original.
    pub fell_back: bool,
}

impl TranslatedSegment {
    fn translated(segment: &TranscriptSegment, text: String) -> Self {
        Self {
            start_seconds: segment.start_seconds,
            end_seconds: segment.end_seconds,
            text,
            fell_back: false,
        }
    }

    fn original(segment: &TranscriptSegment) -> Self {
        Self {
            start_seconds: segment.start_seconds,
            end_seconds: segment.end_seconds,
            text: segment.text.clone(),
            fell_back: true,
        }
    }
}

/// Normalize a requested target language.
///
/// Returns `None` when translation should be skipped: the code is empty or
/// equals `keep_original`.
pub fn normalize_target(target: Option<&str>, keep_original: &str) -> Option<String> {
    let target = target?.trim().to_lowercase();
    if target.is_empty() || target == keep_original.trim().to_lowercase() {
        None
    } else {
        Some(target)
    }
}

/// Translate every segment into `target`.
///
/// Up to `max_concurrent` calls are in flight at once; results are yielded in
/// input order regardless of completion order.
#[instrument(skip(translator, segments), fields(count = segments.len()))]
pub async fn translate_segments(
    translator: &dyn Translator,
    segments: &[TranscriptSegment],
    target: &str,
    max_concurrent: usize,
) -> Vec<TranslatedSegment> {
    info!("Translating {} segments into '{}'", segments.len(), target);

    let pb = ProgressBar::new(segments.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  {spinner:.green} Translating [{bar:30.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }

    let results: Vec<TranslatedSegment> = stream::iter(segments.iter().enumerate())
        .map(|(idx, segment)| {
            let pb = &pb;
            async move {
                let result = match translator.translate(&segment.text, AUTO_SOURCE, target).await {
                    Ok(text) => TranslatedSegment::translated(segment, text),
                    Err(e) => {
                        warn!("Translation error on segment {}: {}", idx, e);
                        TranslatedSegment::original(segment)
                    }
                };
                pb.inc(1);
                result
            }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    pb.finish_and_clear();

    let fallbacks = fallback_count(&results);
    if fallbacks > 0 {
        warn!("{} of {} segments kept their original text", fallbacks, results.len());
    } else {
        debug!("All {} segments translated", results.len());
    }

    results
}

/// Number of segments that fell back to the original text.
pub fn fallback_count(segments: &[TranslatedSegment]) -> usize {
    segments.iter().filter(|s| s.fell_back).count()
}
