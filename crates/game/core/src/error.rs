//! Common error infrastructure for arcana-core.
//!
//! Domain-specific errors (e.g. `RegistryError`, `PlayError`) live next to the
//! code that raises them. They all implement [`GameError`] so the runtime can
//! decide how loudly to log a dropped action without matching every variant.
//!
//! Nothing in the core is surfaced to a player as a recoverable dialog: the
//! runtime logs the error and continues with the next action.

/// Severity level of an error, used for log levels and diagnostics.
///
/// - **Recoverable**: the local player can retry with a different choice
/// - **Validation**: a replicated action was rejected; every client rejects it
/// - **Internal**: local state disagrees with the action stream (likely desync)
/// - **Fatal**: the session cannot meaningfully continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - a different local choice may succeed.
    ///
    /// Examples: cost not affordable, no legal target
    Recoverable,

    /// Validation error - malformed or illegal replicated action.
    ///
    /// Examples: acting out of turn, paying with a non-matching selection
    Validation,

    /// Internal error - state inconsistency that indicates a desync or bug.
    ///
    /// Examples: dealt cards are not on top of the deck
    Internal,

    /// Fatal error - the game cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug or desync.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all arcana-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on who can fix it, not on impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
