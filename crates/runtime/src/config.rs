//! Client session configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use arcana_core::GameConfig;

/// Configuration for one client session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Relay address as `host:port`.
    pub relay_addr: String,
    pub player_name: String,
    /// Broadcast and compare a state digest after every new round.
    pub checksum: bool,
    /// The designated client starts the game once this many seats are taken.
    pub autostart_players: Option<usize>,
    /// Seed for shuffles and rolls this client draws. Entropy when unset.
    pub seed: Option<u64>,
    /// Directory for the rolling log file, if any.
    pub log_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            relay_addr: Self::DEFAULT_RELAY_ADDR.to_string(),
            player_name: "player".to_string(),
            checksum: true,
            autostart_players: None,
            seed: None,
            log_dir: None,
        }
    }
}

impl SessionConfig {
    pub const DEFAULT_RELAY_ADDR: &'static str = "127.0.0.1:7878";

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            player_name: name.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARCANA_RELAY_ADDR` - Relay to connect to (default: 127.0.0.1:7878)
    /// - `ARCANA_PLAYER_NAME` - Seat name announced on join (default: player)
    /// - `ARCANA_CHECKSUM` - Exchange round digests (default: true)
    /// - `ARCANA_AUTOSTART_PLAYERS` - Seats needed before the host starts
    /// - `ARCANA_SEED` - Fixed seed for local shuffles and rolls
    /// - `ARCANA_LOG_DIR` - Also write logs to a file in this directory
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = env::var("ARCANA_RELAY_ADDR") {
            config.relay_addr = addr;
        }
        if let Ok(name) = env::var("ARCANA_PLAYER_NAME") {
            config.player_name = name;
        }
        if let Some(enabled) = read_env::<bool>("ARCANA_CHECKSUM") {
            config.checksum = enabled;
        }
        config.autostart_players = read_env::<usize>("ARCANA_AUTOSTART_PLAYERS")
            .map(|needed| needed.clamp(GameConfig::MIN_PLAYERS, GameConfig::MAX_PLAYERS));
        config.seed = read_env::<u64>("ARCANA_SEED");
        config.log_dir = env::var("ARCANA_LOG_DIR").ok().map(PathBuf::from);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_relay() {
        let config = SessionConfig::named("ana");
        assert_eq!(config.relay_addr, "127.0.0.1:7878");
        assert_eq!(config.player_name, "ana");
        assert!(config.checksum);
        assert!(config.autostart_players.is_none());
    }
}
