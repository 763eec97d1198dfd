//! Tubescribe CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubescribe::cli::commands::{self, TranscribeArgs};
use tubescribe::cli::{Cli, Commands};
use tubescribe::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubescribe={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    match &cli.command {
        Commands::Transcribe {
            input,
            model,
            force_english,
            language,
            target,
            output_dir,
        } => {
            std::fs::create_dir_all(settings.data_dir())?;
            std::fs::create_dir_all(settings.temp_dir())?;

            let args = TranscribeArgs {
                input: input.clone(),
                model: model.clone(),
                force_english: *force_english,
                language: language.clone(),
                target: target.clone(),
                output_dir: output_dir.clone(),
            };
            commands::run_transcribe(&args, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, config_path)?;
        }
    }

    Ok(())
}
