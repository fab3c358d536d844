//! Client binary configuration.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use arcana_runtime::SessionConfig;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub session: SessionConfig,
    /// Directory holding `config.toml` and `cards.ron`. Built-in content when unset.
    pub content_dir: Option<PathBuf>,
    /// Autopilot strategy name.
    pub strategy: String,
    /// Pause between two poll steps.
    pub tick: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            content_dir: None,
            strategy: Self::DEFAULT_STRATEGY.to_string(),
            tick: Duration::from_millis(Self::DEFAULT_TICK_MS),
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_STRATEGY: &'static str = "greedy";
    pub const DEFAULT_TICK_MS: u64 = 20;

    /// Construct configuration from process environment variables.
    ///
    /// Session variables are documented on [`SessionConfig::from_env`]. In
    /// addition:
    /// - `ARCANA_CONTENT_DIR` - Content directory (default: built-in cards)
    /// - `ARCANA_STRATEGY` - `greedy` or `passive` (default: greedy)
    /// - `ARCANA_TICK_MS` - Poll interval in milliseconds (default: 20)
    pub fn from_env() -> Self {
        let mut config = Self {
            session: SessionConfig::from_env(),
            ..Self::default()
        };

        config.content_dir = env::var("ARCANA_CONTENT_DIR").ok().map(PathBuf::from);
        if let Ok(strategy) = env::var("ARCANA_STRATEGY") {
            config.strategy = strategy;
        }
        if let Some(ms) = read_env::<u64>("ARCANA_TICK_MS") {
            config.tick = Duration::from_millis(ms.max(1));
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
