use super::EntityKind;
use crate::error::{ErrorSeverity, GameError};

/// Errors raised while resolving identifier strings.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegistryError {
    #[error("malformed identifier '{0}' (expected <Kind>#<index>#<context>)")]
    Malformed(String),

    #[error("unknown entity kind '{0}'")]
    UnknownKind(String),

    #[error("{kind}#{index} is not registered")]
    NotFound { kind: EntityKind, index: u32 },

    #[error("{kind}#{index} belongs to '{expected}', identifier says '{found}'")]
    ContextMismatch {
        kind: EntityKind,
        index: u32,
        expected: String,
        found: String,
    },

    #[error("expected a {expected} identifier, got {found}")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },
}

impl GameError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Malformed(_) | Self::UnknownKind(_) | Self::KindMismatch { .. } => {
                ErrorSeverity::Validation
            }
            // The sender knew an entity we do not: construction order diverged.
            Self::NotFound { .. } | Self::ContextMismatch { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "REGISTRY_MALFORMED",
            Self::UnknownKind(_) => "REGISTRY_UNKNOWN_KIND",
            Self::NotFound { .. } => "REGISTRY_NOT_FOUND",
            Self::ContextMismatch { .. } => "REGISTRY_CONTEXT_MISMATCH",
            Self::KindMismatch { .. } => "REGISTRY_KIND_MISMATCH",
        }
    }
}
