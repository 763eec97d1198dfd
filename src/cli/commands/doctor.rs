//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::version_arg;
use crate::cli::Output;
use crate::config::{Settings, TranscriptionProvider};
use crate::transcription::is_api_key_configured;
use console::{style, StyledObject};
use std::process::Command;

/// Outcome of one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    fn icon(self) -> StyledObject<&'static str> {
        match self {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        }
    }
}

/// One line of the doctor report.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    fn new(status: CheckStatus, name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            hint: None,
        }
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    fn print(&self) {
        println!("  {} {} - {}", self.status.icon(), style(&self.name).bold(), self.message);
        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a group of checks under a heading and collect them.
fn section(title: &str, results: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for result in &results {
        result.print();
    }
    println!();
    all.extend(results);
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Tubescribe Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    section(
        "External Tools",
        vec![
            check_tool("yt-dlp", install_hint_ytdlp()),
            check_tool("ffmpeg", install_hint_ffmpeg()),
        ],
        &mut checks,
    );
    section("Transcription", check_transcription(settings), &mut checks);
    section("Rendering", vec![check_font(settings)], &mut checks);
    section(
        "Configuration",
        vec![check_output_dir(settings), check_config_file()],
        &mut checks,
    );

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Tubescribe.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Tubescribe is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version: String = stdout
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect();
            CheckResult::new(CheckStatus::Ok, name, version)
        }
        Ok(_) => CheckResult::new(CheckStatus::Error, name, "installed but not working").hint(hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::new(CheckStatus::Error, name, "not found").hint(hint)
        }
        Err(e) => CheckResult::new(CheckStatus::Error, name, format!("error: {}", e)).hint(hint),
    }
}

/// Check the configured transcription backend.
fn check_transcription(settings: &Settings) -> Vec<CheckResult> {
    let transcription = &settings.transcription;
    match transcription.provider {
        TranscriptionProvider::Local => {
            let binary = &transcription.whisper_binary;
            let result = match Command::new(binary).arg("--help").output() {
                Ok(_) => CheckResult::new(
                    CheckStatus::Ok,
                    binary,
                    format!("local whisper, model '{}'", transcription.model),
                ),
                Err(_) => CheckResult::new(CheckStatus::Error, binary, "not found")
                    .hint("Install with: pip install openai-whisper"),
            };
            vec![result]
        }
        TranscriptionProvider::OpenAI => {
            let key = if is_api_key_configured() {
                CheckResult::new(CheckStatus::Ok, "OPENAI_API_KEY", "configured")
            } else {
                CheckResult::new(CheckStatus::Error, "OPENAI_API_KEY", "not set")
                    .hint("Set with: export OPENAI_API_KEY='sk-...'")
            };
            vec![key, check_tool("ffprobe", install_hint_ffmpeg())]
        }
    }
}

/// Check whether the Unicode font is cached or can be downloaded.
fn check_font(settings: &Settings) -> CheckResult {
    let name = "Unicode font";
    let path = settings.font_path();
    if path.exists() {
        CheckResult::new(CheckStatus::Ok, name, path.display().to_string())
    } else if settings.font_url().is_some() {
        CheckResult::new(
            CheckStatus::Warning,
            name,
            format!("{} (downloaded on first run)", path.display()),
        )
        .hint("Requires network access on first run")
    } else {
        CheckResult::new(CheckStatus::Warning, name, "missing and no download URL configured")
            .hint("Non-Latin text will render as '?' with the built-in font")
    }
}

fn check_output_dir(settings: &Settings) -> CheckResult {
    let dir = settings.output_dir();
    if dir.is_dir() {
        CheckResult::new(CheckStatus::Ok, "Output directory", dir.display().to_string())
    } else {
        CheckResult::new(
            CheckStatus::Warning,
            "Output directory",
            format!("{} (will be created)", dir.display()),
        )
    }
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::new(CheckStatus::Ok, "Config file", config_path.display().to_string())
    } else {
        CheckResult::new(CheckStatus::Warning, "Config file", "using defaults")
            .hint(format!("Create {} to override defaults", config_path.display()))
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_hint() {
        let result = CheckResult::new(CheckStatus::Error, "test", "failed").hint("fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_missing_tool_is_an_error() {
        let result = check_tool("tubescribe-no-such-tool", "install it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message, "not found");
    }

    #[test]
    fn test_font_without_url_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().display().to_string();
        settings.render.font_url = String::new();

        let result = check_font(&settings);
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.message.contains("no download URL"));
    }
}
