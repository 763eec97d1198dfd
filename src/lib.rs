//! Tubescribe - timestamped transcript documents from online video
//!
//! Takes a video URL or ID, extracts the audio track, transcribes it with
//! Whisper, optionally translates every segment, and writes a PDF with a
//! `[MM:SS-MM:SS]` label per segment.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `audio_source` - Media lookup and acquisition (yt-dlp)
//! - `audio` - Audio download and processing (yt-dlp, ffmpeg)
//! - `transcription` - Speech-to-text and the segment model
//! - `translation` - Per-segment translation with fallback to the original
//! - `render` - Page layout, font selection and PDF output
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use tubescribe::config::Settings;
//! use tubescribe::orchestrator::{Orchestrator, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let output_dir = settings.output_dir();
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let options = RunOptions {
//!         target_language: Some("fr".to_string()),
//!         ..RunOptions::new("dQw4w9WgXcQ", output_dir)
//!     };
//!     let report = orchestrator.run(&options).await?;
//!     println!("Wrote {}", report.output_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audio_source;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod render;
pub mod transcription;
pub mod translation;

pub use error::{Result, ScribeError};
