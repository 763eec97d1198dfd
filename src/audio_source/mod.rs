//! Media acquisition for Tubescribe.
//!
//! Turns a media locator into a local audio file and a display title. The
//! pipeline talks to this stage through the [`Acquirer`] trait.

mod youtube;

pub use youtube::YoutubeSource;

use crate::audio::download_audio;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Title used when the source does not provide one.
pub const DEFAULT_TITLE: &str = "audio";

/// Metadata about a remote media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Identifier, also used as the temporary audio file stem.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<f64>,
    /// Canonical URL of the media page.
    pub source_url: String,
    /// Channel or author name (if available).
    pub channel: Option<String>,
}

/// Result of the acquisition stage.
#[derive(Debug, Clone)]
pub struct AcquiredAudio {
    /// Local audio file, removed by the cleanup stage.
    pub audio_path: PathBuf,
    /// Display title, used for the document header and file name.
    pub title: String,
}

/// Trait for media acquisition.
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Fetch the audio track behind `locator` into a local file.
    async fn acquire(&self, locator: &str) -> Result<AcquiredAudio>;
}

/// Acquirer backed by yt-dlp and ffmpeg.
pub struct MediaAcquirer {
    source: YoutubeSource,
    temp_dir: PathBuf,
}

impl MediaAcquirer {
    pub fn new(temp_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            source: YoutubeSource::new()?,
            temp_dir,
        })
    }
}

#[async_trait]
impl Acquirer for MediaAcquirer {
    #[instrument(skip(self))]
    async fn acquire(&self, locator: &str) -> Result<AcquiredAudio> {
        let url = self.source.resolve_locator(locator)?;

        info!("Fetching metadata for {}", url);
        let metadata = self.source.fetch_metadata(&url).await?;
        if let Some(duration) = metadata.duration_seconds {
            info!("'{}' runs {:.0}s", metadata.title, duration);
        }

        let audio_path = download_audio(&metadata.source_url, &metadata.id, &self.temp_dir).await?;

        Ok(AcquiredAudio {
            audio_path,
            title: metadata.title,
        })
    }
}
