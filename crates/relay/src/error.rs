use std::io;

use arcana_core::{ErrorSeverity, GameError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind relay to {addr}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("relay hub stopped")]
    HubStopped,
}

impl GameError for RelayError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            RelayError::Bind { .. } => "RELAY_BIND",
            RelayError::HubStopped => "RELAY_HUB_STOPPED",
        }
    }
}
