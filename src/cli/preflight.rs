//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting a run that would otherwise fail midway.

use crate::config::{Settings, TranscriptionProvider};
use crate::error::{Result, ScribeError};
use crate::transcription::is_api_key_configured;
use std::process::Command;

/// Run pre-flight checks for a transcription run.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check_transcribe(settings: &Settings) -> Result<()> {
    check_tool("yt-dlp")?;
    check_tool("ffmpeg")?;
    match settings.transcription.provider {
        TranscriptionProvider::Local => check_tool(&settings.transcription.whisper_binary)?,
        TranscriptionProvider::OpenAI => {
            check_api_key()?;
            check_tool("ffprobe")?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(ScribeError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Flag that prints a version for each tool.
pub(crate) fn version_arg(name: &str) -> &'static str {
    match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

/// Check if an external tool is available.
pub(crate) fn check_tool(name: &str) -> Result<()> {
    // whisper exits non-zero on --version but still runs
    let check_arg = if name.ends_with("whisper") { "--help" } else { version_arg(name) };
    match Command::new(name).arg(check_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(ScribeError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ScribeError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(ScribeError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
