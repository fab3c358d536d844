//! Errors surfaced by the client runtime.
use std::io;

use arcana_core::action::{ControlError, LobbyError, SetupError};
use arcana_core::{AbilityError, ErrorSeverity, GameError, InputError};
use arcana_protocol::ProtocolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to relay at {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to the relay")]
    Write(#[source] io::Error),

    #[error("relay connection closed")]
    Closed,

    #[error("inbox lock poisoned by the reader thread")]
    Poisoned,
}

impl GameError for TransportError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "TRANSPORT_CONNECT",
            TransportError::Write(_) => "TRANSPORT_WRITE",
            TransportError::Closed => "TRANSPORT_CLOSED",
            TransportError::Poisoned => "TRANSPORT_POISONED",
        }
    }
}

/// Why a local request could not be turned into a broadcast.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Lobby(#[from] LobbyError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error("this client has no seat")]
    NotSeated,
}

impl GameError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::Transport(err) => err.severity(),
            SessionError::Protocol(err) => err.severity(),
            SessionError::Input(err) => err.severity(),
            SessionError::Ability(err) => err.severity(),
            SessionError::Lobby(err) => err.severity(),
            SessionError::Setup(err) => err.severity(),
            SessionError::Control(err) => err.severity(),
            SessionError::NotSeated => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::Transport(err) => err.error_code(),
            SessionError::Protocol(err) => err.error_code(),
            SessionError::Input(err) => err.error_code(),
            SessionError::Ability(err) => err.error_code(),
            SessionError::Lobby(err) => err.error_code(),
            SessionError::Setup(err) => err.error_code(),
            SessionError::Control(err) => err.error_code(),
            SessionError::NotSeated => "SESSION_NOT_SEATED",
        }
    }
}
