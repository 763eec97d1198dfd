//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// Language code reported when the backend does not detect one.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Segments in media order (`start_seconds` non-decreasing, overlap allowed).
    pub segments: Vec<TranscriptSegment>,
    /// Detected (or forced) source language.
    pub language: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>, language: Option<String>) -> Self {
        let duration_seconds = segments
            .iter()
            .map(|s| s.end_seconds)
            .fold(0.0f64, f64::max);

        let language = language
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

        Self {
            segments,
            language,
            duration_seconds,
        }
    }

    /// Format the transcript as a short preview, one line per segment.
    pub fn preview_lines(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|s| format!("{}s - {}", s.start_seconds, s.text))
            .collect()
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content. May be empty for silence markers.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// `[MM:SS-MM:SS]` label for this segment.
    pub fn timestamp_label(&self) -> String {
        format_timestamp_range(self.start_seconds, self.end_seconds)
    }
}

/// Format a time range as `[MM:SS-MM:SS]`.
///
/// Seconds are truncated, never rounded. Minutes are padded to two digits but
/// grow past 99 for long media.
pub fn format_timestamp_range(start_seconds: f64, end_seconds: f64) -> String {
    let (start_min, start_sec) = split_minutes(start_seconds);
    let (end_min, end_sec) = split_minutes(end_seconds);
    format!(
        "[{:02}:{:02}-{:02}:{:02}]",
        start_min, start_sec, end_min, end_sec
    )
}

fn split_minutes(seconds: f64) -> (u64, u64) {
    // `as` saturates: NaN and negatives become 0
    let whole = seconds.floor() as u64;
    (whole / 60, whole % 60)
}
