//! Audio download and processing utilities.
//!
//! Audio is fetched with yt-dlp and normalized or sliced with ffmpeg.

use crate::error::{Result, ScribeError};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Extensions yt-dlp commonly leaves behind before conversion.
const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "opus", "m4a", "webm", "ogg"];

/// Run an external tool, mapping a missing binary to `ToolNotFound`.
async fn run_tool(tool: &str, command: &mut Command) -> Result<Output> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::ToolNotFound(tool.to_string())
            } else {
                ScribeError::AudioDownload(format!("{tool} execution failed: {e}"))
            }
        })
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Downloads audio from a URL and saves it as `<media_id>.mp3` in `output_dir`.
///
/// An existing file with that name is reused without downloading again.
#[instrument(skip(output_dir), fields(media_id = %media_id))]
pub async fn download_audio(url: &str, media_id: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let target_path = output_dir.join(format!("{}.mp3", media_id));
    if target_path.exists() {
        info!("Using cached audio file");
        return Ok(target_path);
    }

    info!("Downloading audio from {}", url);
    let template = output_dir.join(format!("{}.%(ext)s", media_id));

    let output = run_tool(
        "yt-dlp",
        Command::new("yt-dlp")
            .args(["--format", "bestaudio/best"])
            .args(["--extract-audio", "--audio-format", "mp3", "--audio-quality", "192K"])
            .arg("--output")
            .arg(&template)
            .args(["--no-playlist", "--quiet", "--no-warnings"])
            .arg(url),
    )
    .await?;

    if !output.status.success() {
        return Err(ScribeError::AudioDownload(format!(
            "yt-dlp failed: {}",
            stderr_of(&output)
        )));
    }

    let downloaded = find_audio_file(output_dir, media_id)?;
    if downloaded != target_path {
        normalize_to_mp3(&downloaded, &target_path).await?;
        if let Err(e) = std::fs::remove_file(&downloaded) {
            debug!("Could not remove intermediate {:?}: {}", downloaded, e);
        }
    }

    Ok(target_path)
}

/// Locates a downloaded audio file by media ID.
fn find_audio_file(dir: &Path, media_id: &str) -> Result<PathBuf> {
    if let Some(found) = AUDIO_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", media_id, ext)))
        .find(|candidate| candidate.exists())
    {
        return Ok(found);
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| ScribeError::AudioDownload(format!("Cannot read directory: {e}")))?;

    entries
        .flatten()
        .find(|entry| entry.file_name().to_string_lossy().starts_with(media_id))
        .map(|entry| entry.path())
        .ok_or_else(|| ScribeError::AudioDownload("Audio file not found after download".into()))
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let output = run_tool(
        "ffmpeg",
        Command::new("ffmpeg")
            .arg("-i")
            .arg(source)
            .args(["-vn", "-codec:a", "libmp3lame", "-qscale:a", "2", "-y", "-loglevel", "error"])
            .arg(dest),
    )
    .await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(ScribeError::AudioDownload(format!(
            "ffmpeg conversion failed: {}",
            stderr_of(&output)
        )))
    }
}

/// Splits a long audio file into pieces of at most `chunk_seconds`.
///
/// Returns `(path, offset_seconds)` pairs in order. Short audio comes back as
/// a single entry pointing at the source file.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = media_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds as f64;
    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut pieces = Vec::new();
    let mut offset = 0.0;
    while offset < total_duration {
        let piece_path = output_dir.join(format!("{}_{:04}.mp3", base_name, pieces.len()));
        let length = chunk_len.min(total_duration - offset);

        extract_piece(source, &piece_path, offset, length).await?;
        debug!("Created piece {} at offset {:.1}s", pieces.len(), offset);

        pieces.push((piece_path, offset));
        offset += chunk_len;
    }

    info!("Created {} audio pieces", pieces.len());
    Ok(pieces)
}

/// Extracts a time range from an audio file, re-encoding if stream copy fails.
async fn extract_piece(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let range = |command: &mut Command| {
        command
            .arg("-ss")
            .arg(format!("{:.3}", start))
            .arg("-i")
            .arg(source)
            .arg("-t")
            .arg(format!("{:.3}", length));
    };

    let mut copy = Command::new("ffmpeg");
    range(&mut copy);
    copy.args(["-c", "copy", "-y", "-loglevel", "warning"]).arg(dest);
    if let Ok(output) = run_tool("ffmpeg", &mut copy).await {
        if output.status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding piece");

    let mut encode = Command::new("ffmpeg");
    range(&mut encode);
    encode
        .args(["-codec:a", "libmp3lame", "-qscale:a", "2", "-y", "-loglevel", "error"])
        .arg(dest);
    let output = run_tool("ffmpeg", &mut encode).await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(ScribeError::AudioDownload(format!(
            "Piece extraction failed: {}",
            stderr_of(&output)
        )))
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
async fn media_duration(path: &Path) -> Result<f64> {
    let output = run_tool(
        "ffprobe",
        Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path),
    )
    .await?;

    if !output.status.success() {
        return Err(ScribeError::AudioDownload("ffprobe returned error".into()));
    }

    parse_duration_json(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration_json(json: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|_| ScribeError::AudioDownload("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ScribeError::AudioDownload("Could not determine audio duration".into()))
}
