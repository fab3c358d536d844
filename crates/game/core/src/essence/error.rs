use crate::error::{ErrorSeverity, GameError};

/// Errors raised while parsing the string form of an [`super::EssenceSelection`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EssenceParseError {
    #[error("expected {expected} slots, found {found}")]
    SlotCount { expected: usize, found: usize },

    #[error("slot {slot} is not an amount in range: '{value}'")]
    InvalidAmount { slot: usize, value: String },

    #[error("unknown essence kind '{0}' in exclusion set")]
    UnknownKind(String),
}

impl GameError for EssenceParseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SlotCount { .. } => "ESSENCE_SLOT_COUNT",
            Self::InvalidAmount { .. } => "ESSENCE_INVALID_AMOUNT",
            Self::UnknownKind(_) => "ESSENCE_UNKNOWN_KIND",
        }
    }
}
