//! YouTube (and other yt-dlp supported sites) source implementation.

use super::MediaMetadata;
use crate::error::{Result, ScribeError};
use regex::Regex;
use tracing::debug;
use url::Url;

/// Resolves locators and fetches metadata through yt-dlp.
pub struct YoutubeSource {
    video_id_regex: Regex,
}

impl YoutubeSource {
    pub fn new() -> Result<Self> {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .map_err(|e| ScribeError::Config(format!("Invalid video id pattern: {}", e)))?;

        Ok(Self { video_id_regex })
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Turn user input into a URL yt-dlp can fetch.
    ///
    /// YouTube links and bare IDs become canonical watch URLs, other http(s)
    /// URLs pass through unchanged.
    pub fn resolve_locator(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ScribeError::InvalidInput("No media URL entered".to_string()));
        }

        if let Some(id) = self.extract_video_id(input) {
            return Ok(format!("https://www.youtube.com/watch?v={}", id));
        }

        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.to_string()),
            _ => Err(ScribeError::InvalidInput(format!(
                "Not a video URL or YouTube ID: {}",
                input
            ))),
        }
    }

    /// Fetch metadata using yt-dlp.
    pub async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                "--no-playlist",
                url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScribeError::ToolNotFound("yt-dlp".to_string())
                } else {
                    ScribeError::AudioDownload(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::VideoNotFound(format!(
                "{} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        let metadata = parse_metadata(&String::from_utf8_lossy(&output.stdout), url)?;
        debug!("Fetched metadata for {}: {}", metadata.id, metadata.title);
        Ok(metadata)
    }
}

/// Parse the `--dump-json` output of yt-dlp.
fn parse_metadata(json_str: &str, url: &str) -> Result<MediaMetadata> {
    let json: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        ScribeError::AudioDownload(format!("Failed to parse yt-dlp output: {}", e))
    })?;

    let id = json["id"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(sanitize_id)
        .unwrap_or_else(|| "downloaded_audio".to_string());

    let title = json["title"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(super::DEFAULT_TITLE)
        .to_string();

    let source_url = json["webpage_url"].as_str().unwrap_or(url).to_string();

    Ok(MediaMetadata {
        id,
        title,
        duration_seconds: json["duration"].as_f64(),
        source_url,
        channel: json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .map(|s| s.to_string()),
    })
}

/// Media IDs become file names, keep them to a safe alphabet.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
