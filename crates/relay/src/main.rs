//! Relay server binary.
//!
//! ```bash
//! ARCANA_RELAY_BIND=0.0.0.0:7878 cargo run -p arcana-relay
//! ```
use anyhow::Result;
use arcana_relay::{Relay, RelayConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = RelayConfig::from_env();
    tracing::info!(
        bind = %config.bind,
        max_clients = config.max_clients,
        "starting relay"
    );

    Relay::bind(config).await?.run().await?;
    Ok(())
}
