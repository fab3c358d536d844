//! Error types for the action pipeline.

use crate::action::{
    ActionKey, ActionTransition, AddPlayer, AttackResponse, Control, SenderRule, Shuffle,
    UserInputOverwrite, VoteNextRound,
};
use crate::error::{ErrorSeverity, GameError};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    Sender,
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::Sender => "sender",
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

/// Associates a transition phase with the underlying error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.phase.as_str(), self.error)
    }
}

impl<E: std::fmt::Display + std::fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

/// Errors surfaced while applying a replicated action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("lobby action failed: {0}")]
    Lobby(TransitionPhaseError<<AddPlayer as ActionTransition>::Error>),

    #[error("setup action failed: {0}")]
    Setup(TransitionPhaseError<<Shuffle as ActionTransition>::Error>),

    #[error("round action failed: {0}")]
    Round(TransitionPhaseError<<VoteNextRound as ActionTransition>::Error>),

    #[error("game action failed: {0}")]
    Play(TransitionPhaseError<<UserInputOverwrite as ActionTransition>::Error>),

    #[error("attack response failed: {0}")]
    Attack(TransitionPhaseError<<AttackResponse as ActionTransition>::Error>),

    #[error("control action failed: {0}")]
    Control(TransitionPhaseError<<Control as ActionTransition>::Error>),

    #[error("client {client_id} may not send {key} (allowed: {rule:?})")]
    WrongSender {
        key: ActionKey,
        client_id: u32,
        rule: SenderRule,
    },

    #[error("{0} ignored after the game ended")]
    GameOver(ActionKey),
}

impl ApplyError {
    /// Phase that failed, if the action got past sender checks.
    pub fn phase(&self) -> Option<TransitionPhase> {
        match self {
            ApplyError::Lobby(err) => Some(err.phase),
            ApplyError::Setup(err) => Some(err.phase),
            ApplyError::Round(err) => Some(err.phase),
            ApplyError::Play(err) => Some(err.phase),
            ApplyError::Attack(err) => Some(err.phase),
            ApplyError::Control(err) => Some(err.phase),
            ApplyError::WrongSender { .. } => Some(TransitionPhase::Sender),
            ApplyError::GameOver(_) => None,
        }
    }
}

impl GameError for ApplyError {
    fn severity(&self) -> ErrorSeverity {
        let inner = match self {
            ApplyError::Lobby(err) => err.error.severity(),
            ApplyError::Setup(err) => err.error.severity(),
            ApplyError::Round(err) => err.error.severity(),
            ApplyError::Play(err) => err.error.severity(),
            ApplyError::Attack(err) => err.error.severity(),
            ApplyError::Control(err) => err.error.severity(),
            ApplyError::WrongSender { .. } => ErrorSeverity::Validation,
            ApplyError::GameOver(_) => ErrorSeverity::Recoverable,
        };
        // Anything that fails after mutation started has left the state in
        // an unknown shape.
        match self.phase() {
            Some(TransitionPhase::Apply | TransitionPhase::PostValidate) => ErrorSeverity::Fatal,
            _ => inner,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApplyError::Lobby(_) => "APPLY_LOBBY",
            ApplyError::Setup(_) => "APPLY_SETUP",
            ApplyError::Round(_) => "APPLY_ROUND",
            ApplyError::Play(err) => err.error.error_code(),
            ApplyError::Attack(_) => "APPLY_ATTACK",
            ApplyError::Control(_) => "APPLY_CONTROL",
            ApplyError::WrongSender { .. } => "APPLY_WRONG_SENDER",
            ApplyError::GameOver(_) => "APPLY_GAME_OVER",
        }
    }
}
