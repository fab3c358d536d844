//! Headless client binary.
//!
//! Connects to the relay, takes a seat and lets the autopilot play it until
//! the game ends or Ctrl-C is pressed.
//!
//! ```bash
//! ARCANA_PLAYER_NAME=ana ARCANA_AUTOSTART_PLAYERS=2 cargo run -p arcana-client
//! ```
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arcana_client::{Autopilot, ClientConfig};
use arcana_content::ContentFactory;
use arcana_core::{GameEvent, Phase};
use arcana_runtime::{ClientSession, TcpTransport, TracingRecorder};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    setup_logging(config.session.log_dir.as_deref(), &config.session.player_name)?;

    let factory = match &config.content_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::builtin(),
    };
    let game = factory.load_config().context("loading game config")?;
    let catalog = Arc::new(factory.load_catalog().context("loading card catalog")?);

    let mut autopilot = Autopilot::with_strategy_name(&config.strategy)
        .with_context(|| format!("unknown strategy '{}'", config.strategy))?;
    tracing::info!(
        relay = %config.session.relay_addr,
        name = %config.session.player_name,
        strategy = autopilot.strategy_name(),
        "starting client"
    );

    let transport = TcpTransport::connect(&config.session.relay_addr)?;
    let mut session = ClientSession::new(config.session.clone(), game, catalog, transport)
        .with_recorder(TracingRecorder);

    let mut tick = tokio::time::interval(config.tick);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, leaving table");
                if session.local_player().is_some() {
                    session.leave()?;
                }
                break;
            }
            _ = tick.tick() => {
                let report = session.poll()?;
                for event in &report.events {
                    if let GameEvent::GameOver { winner } = event {
                        tracing::info!(?winner, "game over");
                    }
                }
                if let Phase::GameOver { .. } = session.state().phase {
                    break;
                }
                if let Err(err) = autopilot.step(&mut session) {
                    tracing::warn!(%err, "autopilot step failed");
                }
            }
        }
    }

    let metrics = session.metrics();
    tracing::info!(
        applied = metrics.applied(),
        rejected = metrics.rejected(),
        sent = metrics.sent(),
        checksum_mismatches = metrics.checksum_mismatches(),
        "client shutdown complete"
    );
    Ok(())
}

/// Logs to stderr, and also to `<dir>/<name>.log` when a directory is set.
fn setup_logging(log_dir: Option<&Path>, name: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(());
    };

    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, format!("{name}.log"));
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(guard);

    tracing::info!("Log file: {}/{name}.log", dir.display());
    Ok(())
}
