//! Relay configuration.
use std::env;

/// Configuration for the relay process.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Listen address as `host:port`.
    pub bind: String,
    /// Connections beyond this are closed right after accept.
    pub max_clients: usize,
    /// Outbound lines buffered per connection before it is dropped as stalled.
    pub queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: Self::DEFAULT_BIND.to_string(),
            max_clients: Self::DEFAULT_MAX_CLIENTS,
            queue: Self::DEFAULT_QUEUE,
        }
    }
}

impl RelayConfig {
    pub const DEFAULT_BIND: &'static str = "0.0.0.0:7878";
    pub const DEFAULT_MAX_CLIENTS: usize = 8;
    pub const DEFAULT_QUEUE: usize = 256;

    pub fn new(bind: impl Into<String>) -> Self {
        Self {
            bind: bind.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARCANA_RELAY_BIND` - Listen address (default: 0.0.0.0:7878)
    /// - `ARCANA_RELAY_MAX_CLIENTS` - Concurrent connections (default: 8)
    /// - `ARCANA_RELAY_QUEUE` - Per-connection outbound buffer (default: 256)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind) = env::var("ARCANA_RELAY_BIND") {
            config.bind = bind;
        }
        if let Some(max) = read_env::<usize>("ARCANA_RELAY_MAX_CLIENTS") {
            config.max_clients = max.max(1);
        }
        if let Some(queue) = read_env::<usize>("ARCANA_RELAY_QUEUE") {
            config.queue = queue.max(1);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_every_interface() {
        let config = RelayConfig::default();
        assert_eq!(config.bind, "0.0.0.0:7878");
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.queue, 256);
    }
}
