use arcana_core::essence::EssenceParseError;
use arcana_core::registry::RegistryError;
use arcana_core::{ErrorSeverity, GameError};

/// Why a line could not be encoded or decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("line does not end with the end separator")]
    MissingEnd,

    #[error("header has {0} fields, expected 4")]
    Header(usize),

    #[error("unknown role marker '{0}'")]
    BadRole(String),

    #[error("client id '{0}' is not a number")]
    BadClientId(String),

    #[error("unknown action key '{0}'")]
    UnknownKey(String),

    #[error("unknown server notice '{0}'")]
    UnknownNotice(String),

    #[error("{key} payload has {found} parts, expected {expected}")]
    PartCount {
        key: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid {field}: '{value}'")]
    BadValue { field: &'static str, value: String },

    #[error(transparent)]
    Essence(#[from] EssenceParseError),

    #[error(transparent)]
    Unresolved(#[from] RegistryError),

    #[error("{0} has no identifier in this registry")]
    Unregistered(String),
}

impl ProtocolError {
    pub(crate) fn bad(field: &'static str, value: impl Into<String>) -> Self {
        ProtocolError::BadValue {
            field,
            value: value.into(),
        }
    }
}

impl GameError for ProtocolError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ProtocolError::Unresolved(inner) => inner.severity(),
            ProtocolError::Unregistered(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProtocolError::MissingEnd => "PROTO_MISSING_END",
            ProtocolError::Header(_) => "PROTO_HEADER",
            ProtocolError::BadRole(_) => "PROTO_BAD_ROLE",
            ProtocolError::BadClientId(_) => "PROTO_BAD_CLIENT_ID",
            ProtocolError::UnknownKey(_) => "PROTO_UNKNOWN_KEY",
            ProtocolError::UnknownNotice(_) => "PROTO_UNKNOWN_NOTICE",
            ProtocolError::PartCount { .. } => "PROTO_PART_COUNT",
            ProtocolError::BadValue { .. } => "PROTO_BAD_VALUE",
            ProtocolError::Essence(inner) => inner.error_code(),
            ProtocolError::Unresolved(inner) => inner.error_code(),
            ProtocolError::Unregistered(_) => "PROTO_UNREGISTERED",
        }
    }
}
