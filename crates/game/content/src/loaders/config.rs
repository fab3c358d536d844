//! Rule parameter loader.

use std::path::Path;

use arcana_core::GameConfig;

use crate::loaders::{LoadError, LoadResult, read_file};

/// Loader for [`GameConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, what: &str) -> LoadResult<GameConfig> {
        toml::from_str(content).map_err(|e| LoadError::Parse {
            what: what.to_string(),
            message: e.to_string(),
        })
    }

    pub fn builtin() -> LoadResult<GameConfig> {
        Self::parse(crate::BUILTIN_CONFIG, "builtin config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_the_defaults() {
        assert_eq!(ConfigLoader::builtin().unwrap(), GameConfig::default());
    }

    #[test]
    fn missing_fields_are_an_error() {
        assert!(matches!(
            ConfigLoader::parse("win_points = 12", "inline"),
            Err(LoadError::Parse { .. })
        ));
    }
}
