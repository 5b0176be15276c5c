//! Symptom Assist: terminal client for the symptom-analysis backend.
//!
//! Main entry point for the terminal application.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use symptom_assist::adapters::sanitize::SanitizingMakeWriter;
use symptom_assist::adapters::HttpAnalysisBackend;
use symptom_assist::application::AnalysisService;
use symptom_assist::config::{AppConfig, LogMode};
use symptom_assist::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal will corrupt the TUI (alternate screen).
    // Default behavior:
    // - interactive TTY: log to a file
    // - non-interactive: log to stdout
    let interactive = std::io::stdout().is_terminal();
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => interactive,
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!(
        "Starting Symptom Assist (backend={}, timeout={}s)",
        config.backend_url,
        config.request_timeout.as_secs()
    );

    let backend = HttpAnalysisBackend::new(&config).context("Failed to build HTTP client")?;
    let service = AnalysisService::new(Arc::new(backend));

    // Run the TUI application
    let mut app = App::new(service, config.request_timeout);
    app.run()?;

    tracing::info!("Symptom Assist shutdown complete.");
    Ok(())
}
