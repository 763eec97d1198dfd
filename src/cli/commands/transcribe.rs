//! Transcribe command implementation.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, PipelineReport, RunOptions};
use crate::transcription::ModelTier;
use anyhow::Result;
use std::path::Path;

const PREVIEW_LINES: usize = 10;

/// Arguments of the transcribe command.
#[derive(Debug, Clone, Default)]
pub struct TranscribeArgs {
    pub input: String,
    pub model: Option<String>,
    pub force_english: bool,
    pub language: Option<String>,
    pub target: Option<String>,
    pub output_dir: Option<String>,
}

impl TranscribeArgs {
    /// Resolve CLI flags against the settings. Flags win.
    fn run_options(&self, settings: &Settings) -> RunOptions {
        let model = ModelTier::parse_or_default(
            self.model
                .as_deref()
                .unwrap_or(&settings.transcription.model),
        );
        let language = if self.force_english {
            Some("en".to_string())
        } else {
            self.language
                .clone()
                .or_else(|| settings.transcription.language.clone())
        };
        let output_dir = self
            .output_dir
            .as_deref()
            .map(Settings::expand_path)
            .unwrap_or_else(|| settings.output_dir());

        RunOptions {
            locator: self.input.clone(),
            model,
            language,
            target_language: self.target.clone(),
            output_dir,
        }
    }
}

/// Run the transcribe command.
pub async fn run_transcribe(args: &TranscribeArgs, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check_transcribe(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tubescribe doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let options = args.run_options(&settings);
    Output::info(&format!("Processing: {}", options.locator));

    let orchestrator = Orchestrator::new(settings)?;
    match orchestrator.run(&options).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to process '{}': {}", options.locator, e));
            Err(e.into())
        }
    }
}

fn print_report(report: &PipelineReport) {
    Output::header("Transcription preview");
    Output::preview(&report.transcript.preview_lines(), PREVIEW_LINES);
    println!();

    Output::kv("Title", &report.title);
    Output::kv("Detected language", &report.transcript.language);
    Output::kv("Segments", &report.transcript.segments.len().to_string());
    Output::kv("Pages", &report.pages.to_string());

    if let Some(translated) = &report.translated {
        if report.fallbacks > 0 {
            Output::warning(&format!(
                "{} of {} segment(s) could not be translated and show the original text",
                report.fallbacks,
                translated.len()
            ));
        }
    }
    if !report.custom_font_loaded {
        Output::warning("Unicode font unavailable; characters outside Latin-1 appear as '?'");
    }

    Output::success(&format!("PDF saved to {}", display_path(&report.output_path)));
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
