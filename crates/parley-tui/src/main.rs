//! parley: a terminal chat client.
//!
//! Usage:
//!   parley [OPTIONS]
//!
//! Logs go to a daily file under the data directory, filtered by `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use parley_core::{Backend, Config, Provider};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod clipboard;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Chat with an AI assistant in your terminal", version)]
struct Cli {
    /// Provider to use (perplexity, mock)
    #[arg(short, long)]
    provider: Option<String>,

    /// Model name sent to the provider
    #[arg(short, long)]
    model: Option<String>,

    /// Use canned offline replies instead of a real provider
    #[arg(long)]
    mock: bool,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between revealed characters
    #[arg(long)]
    reveal_interval_ms: Option<u64>,

    /// Write logs to this file instead of the daily log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Save the effective settings (file plus flags) to the config file
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.as_deref())?;

    let mut config = load_config(cli.config.as_deref());
    apply_overrides(&mut config, &cli);
    if cli.save_config {
        save_config(&config, cli.config.as_deref())?;
    }

    let provider = if cli.mock {
        Provider::Mock
    } else {
        config.provider()
    };
    let backend = Backend::from_config(provider, &config)?;
    if provider.needs_api_key() && !backend.has_api_key() {
        tracing::warn!(
            "No API key configured for {}; messages will fail until {} is set",
            provider.display_name(),
            parley_core::config::API_KEY_ENV
        );
    }
    tracing::info!(
        provider = provider.as_str(),
        model = backend.model(),
        "Starting parley"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, App::new(backend), config.reveal_interval()).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!("parley exited with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App, reveal_interval: Duration) -> Result<()> {
    let mut events = EventHandler::new(reveal_interval);
    let mut dirty = true;

    while !app.should_quit {
        if dirty {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
        }

        match events.next().await {
            Some(event) => dirty = handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    loaded.unwrap_or_else(|e| {
        tracing::warn!("Using default config: {}", e);
        Config::new()
    })
}

fn save_config(config: &Config, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    tracing::info!("Saved config");
    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(provider) = &cli.provider {
        match Provider::from_str(provider) {
            Some(p) => config.provider = Some(p.as_str().to_string()),
            None => {
                let known: Vec<&str> = Provider::all().iter().map(|p| p.as_str()).collect();
                tracing::warn!(
                    "Unknown provider '{}' (expected one of {}), keeping configured one",
                    provider,
                    known.join(", ")
                );
            }
        }
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    if let Some(ms) = cli.reveal_interval_ms {
        config.reveal_interval_ms = Some(ms);
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<WorkerGuard> {
    let appender = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
            tracing_appender::rolling::never(dir.unwrap_or_else(|| Path::new(".")), name)
        }
        None => tracing_appender::rolling::daily(log_dir(), "parley.log"),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(guard)
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("parley")
        .join("logs")
}
