//! Content factory for loading a whole content directory.

use std::path::{Path, PathBuf};

use arcana_core::{CardCatalog, GameConfig};

use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult};

/// Loads content from a data directory, falling back to the built-in files
/// for anything the directory does not provide.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// └── cards.ron
/// ```
pub struct ContentFactory {
    data_dir: Option<PathBuf>,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
        }
    }

    /// Factory that only serves the compiled-in content.
    pub fn builtin() -> Self {
        Self { data_dir: None }
    }

    pub fn load_config(&self) -> LoadResult<GameConfig> {
        match self.existing("config.toml") {
            Some(path) => ConfigLoader::load(&path),
            None => ConfigLoader::builtin(),
        }
    }

    pub fn load_catalog(&self) -> LoadResult<CardCatalog> {
        match self.existing("cards.ron") {
            Some(path) => CatalogLoader::load(&path),
            None => CatalogLoader::builtin(),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn existing(&self, file: &str) -> Option<PathBuf> {
        let path = self.data_dir.as_ref()?.join(file);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back_to_builtin_content() {
        let factory = ContentFactory::new("/nonexistent/arcana-data");
        assert_eq!(factory.data_dir(), Some(Path::new("/nonexistent/arcana-data")));
        assert_eq!(factory.load_config().unwrap(), GameConfig::default());
        assert_eq!(
            factory.load_catalog().unwrap(),
            CatalogLoader::builtin().unwrap()
        );
    }
}
