//! CLI module for Tubescribe.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubescribe - timestamped transcript documents from online video
///
/// Downloads the audio track of a video, transcribes it with Whisper,
/// optionally translates every segment, and writes a PDF.
#[derive(Parser, Debug)]
#[command(name = "tubescribe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe a video into a PDF transcript
    Transcribe {
        /// Video URL or YouTube video ID
        input: String,

        /// Whisper model tier (tiny, base, small, medium, large)
        #[arg(short, long)]
        model: Option<String>,

        /// Force English as the spoken language
        #[arg(long, conflicts_with = "language")]
        force_english: bool,

        /// Spoken language code; detected automatically when omitted
        #[arg(short, long)]
        language: Option<String>,

        /// Translate every segment into this language code
        #[arg(short, long)]
        target: Option<String>,

        /// Directory for the PDF (defaults to general.output_dir)
        #[arg(short, long)]
        output_dir: Option<String>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcribe() {
        let cli = Cli::parse_from([
            "tubescribe",
            "-vv",
            "transcribe",
            "dQw4w9WgXcQ",
            "--model",
            "small",
            "--target",
            "fr",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Transcribe {
                input,
                model,
                force_english,
                target,
                ..
            } => {
                assert_eq!(input, "dQw4w9WgXcQ");
                assert_eq!(model.as_deref(), Some("small"));
                assert!(!force_english);
                assert_eq!(target.as_deref(), Some("fr"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_force_english_conflicts_with_language() {
        let result = Cli::try_parse_from([
            "tubescribe",
            "transcribe",
            "x",
            "--force-english",
            "--language",
            "de",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::parse_from(["tubescribe", "config", "path"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
