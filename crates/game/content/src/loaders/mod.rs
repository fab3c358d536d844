//! Loaders that turn RON/TOML data into core types.

pub mod catalog;
pub mod config;
pub mod factory;

pub use catalog::CatalogLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;

use std::path::{Path, PathBuf};

use arcana_core::cards::CatalogError;
use arcana_core::{ErrorSeverity, GameError};

/// Errors raised while reading content.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("catalog rejected: {0}")]
    Invalid(#[from] CatalogError),
}

impl GameError for LoadError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "LOAD_IO",
            LoadError::Parse { .. } => "LOAD_PARSE",
            LoadError::Invalid(_) => "LOAD_INVALID",
        }
    }
}

/// Common result type for loaders.
pub type LoadResult<T> = Result<T, LoadError>;

pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
