//! Card catalog loader.

use std::path::Path;

use arcana_core::{CardCatalog, GameConfig};
use tracing::debug;

use crate::loaders::{LoadError, LoadResult, read_file};

/// Loader for card catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load and validate a catalog file.
    pub fn load(path: &Path) -> LoadResult<CardCatalog> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse RON catalog text. `what` names the source in errors.
    ///
    /// The catalog must hold enough draft material for a full table.
    pub fn parse(content: &str, what: &str) -> LoadResult<CardCatalog> {
        let catalog: CardCatalog = ron::from_str(content).map_err(|e| LoadError::Parse {
            what: what.to_string(),
            message: e.to_string(),
        })?;
        catalog.validate(GameConfig::MAX_PLAYERS)?;
        debug!(
            target: "arcana::content",
            source = what,
            cards = catalog.len(),
            "card catalog loaded"
        );
        Ok(catalog)
    }

    /// The catalog compiled into this crate.
    pub fn builtin() -> LoadResult<CardCatalog> {
        Self::parse(crate::BUILTIN_CARDS, "builtin cards.ron")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::cards::TappableKind;
    use arcana_core::{AbilityEffect, EssenceKind, EssenceSelection};

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = CatalogLoader::builtin().expect("builtin catalog parses");
        assert!(catalog.mages.len() >= GameConfig::MAX_PLAYERS * GameConfig::MAGES_OFFERED);
        assert!(catalog.magic_items.len() >= GameConfig::MAX_PLAYERS);
        for (kind, list) in catalog.lists() {
            assert!(list.iter().all(|card| card.kind == kind));
        }
    }

    #[test]
    fn essences_are_written_in_wire_form() {
        let source = r#"(
            artifacts: [(
                key: "chalice",
                name: "Chalice",
                kind: artifact,
                cost: "0:1:1:0:0:0",
                abilities: [(effect: Produce(output: "0:2:0:0:0:0"))],
            )],
        )"#;
        let catalog: CardCatalog = ron::from_str(source).unwrap();
        let chalice = &catalog.artifacts[0];
        assert_eq!(chalice.kind, TappableKind::Artifact);
        assert_eq!(chalice.cost.get(EssenceKind::Calm), 1);
        assert!(chalice.abilities[0].requires_tap);
        assert_eq!(
            chalice.abilities[0].effect,
            AbilityEffect::Produce {
                output: EssenceSelection::of(EssenceKind::Life, 2)
            }
        );
    }

    #[test]
    fn thin_catalogs_are_rejected() {
        let err = CatalogLoader::parse("(mages: [])", "inline").unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    fn syntax_errors_name_the_source() {
        let err = CatalogLoader::parse("(artifacts: [", "broken.ron").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }
}
