//! Local transcription through the `whisper` command line tool.

use super::{Transcriber, Transcript, TranscriptSegment, TranscriptionOptions};
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Transcriber that runs the openai-whisper CLI and reads its JSON output.
pub struct LocalWhisperTranscriber {
    binary: String,
}

/// Shape of the `--output_format json` file written by whisper.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperOutputSegment>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperOutputSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

impl LocalWhisperTranscriber {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn output_file(output_dir: &Path, audio_path: &Path) -> PathBuf {
        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        output_dir.join(format!("{}.json", stem))
    }
}

/// Parse whisper's JSON output into a transcript.
fn parse_whisper_output(json: &str) -> Result<Transcript> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| ScribeError::Transcription(format!("Invalid whisper output: {}", e)))?;

    let segments = output
        .segments
        .into_iter()
        .map(|s| TranscriptSegment::new(s.start, s.end.max(s.start), s.text.trim()))
        .collect();

    Ok(Transcript::new(segments, output.language))
}

#[async_trait]
impl Transcriber for LocalWhisperTranscriber {
    fn name(&self) -> &str {
        "whisper-cli"
    }

    #[instrument(skip(self, options), fields(audio_path = %audio_path.display(), model = %options.model))]
    async fn transcribe(&self, audio_path: &Path, options: &TranscriptionOptions) -> Result<Transcript> {
        let output_dir = tempfile::tempdir()?;

        let mut command = Command::new(&self.binary);
        command
            .arg(audio_path)
            .arg("--model").arg(options.model.as_str())
            .arg("--output_format").arg("json")
            .arg("--output_dir").arg(output_dir.path())
            .arg("--verbose").arg("False");

        if let Some(lang) = &options.language {
            command.arg("--language").arg(lang);
        }

        info!("Running {} with model {}", self.binary, options.model);

        let result = command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScribeError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => {
                return Err(ScribeError::Transcription(format!("{} execution failed: {e}", self.binary)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::ToolFailed(format!("{} failed: {stderr}", self.binary)));
        }

        let json_path = Self::output_file(output_dir.path(), audio_path);
        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            ScribeError::Transcription(format!(
                "Missing whisper output {}: {}",
                json_path.display(),
                e
            ))
        })?;

        let mut transcript = parse_whisper_output(&json)?;
        if let Some(lang) = &options.language {
            transcript.language = lang.clone();
        }

        debug!("Transcribed {} segments", transcript.segments.len());
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::UNKNOWN_LANGUAGE;

    #[test]
    fn test_parse_whisper_output() {
        let json = r#"{
            "text": " Hello world. Bye.",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 2.4, "text": " Hello world.", "tokens": [1, 2]},
                {"id": 1, "seek": 0, "start": 2.4, "end": 3.1, "text": " Bye."}
            ],
            "language": "en"
        }"#;

        let transcript = parse_whisper_output(json).unwrap();
        assert_eq!(transcript.language, "en");
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].text, "Hello world.");
        assert_eq!(transcript.segments[1].start_seconds, 2.4);
    }

    #[test]
    fn test_parse_whisper_output_without_language() {
        let transcript = parse_whisper_output(r#"{"segments": []}"#).unwrap();
        assert_eq!(transcript.language, UNKNOWN_LANGUAGE);
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn test_parse_whisper_output_invalid() {
        let err = parse_whisper_output("not json").unwrap_err();
        assert!(matches!(err, ScribeError::Transcription(_)));
    }

    #[test]
    fn test_output_file_name() {
        let path = LocalWhisperTranscriber::output_file(
            Path::new("/tmp/out"),
            Path::new("/tmp/tubescribe/dQw4w9WgXcQ.mp3"),
        );
        assert_eq!(path, PathBuf::from("/tmp/out/dQw4w9WgXcQ.json"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transcriber = LocalWhisperTranscriber::new("tubescribe-no-such-whisper-binary");
        let err = transcriber
            .transcribe(Path::new("audio.mp3"), &TranscriptionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::ToolNotFound(_)));
    }
}
