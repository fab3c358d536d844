use std::collections::BTreeSet;

use super::{Capabilities, TappableKind};
use crate::ability::AbilityEffect;
use crate::essence::{EssenceKind, EssenceSelection};

/// Static description of one ability slot on a card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityTemplate {
    pub effect: AbilityEffect,
    /// Essences paid on activation; may be indeterminate.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: EssenceSelection,
    #[cfg_attr(feature = "serde", serde(default = "default_requires_tap"))]
    pub requires_tap: bool,
    /// The parent card returns to the supply after use.
    #[cfg_attr(feature = "serde", serde(default))]
    pub one_shot: bool,
}

#[cfg(feature = "serde")]
fn default_requires_tap() -> bool {
    true
}

impl AbilityTemplate {
    pub fn new(effect: AbilityEffect) -> Self {
        Self {
            effect,
            cost: EssenceSelection::zero(),
            requires_tap: true,
            one_shot: false,
        }
    }

    pub fn with_cost(mut self, cost: EssenceSelection) -> Self {
        self.cost = cost;
        self
    }

    pub fn without_tap(mut self) -> Self {
        self.requires_tap = false;
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }
}

/// Static description of one card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardTemplate {
    pub key: String,
    pub name: String,
    pub kind: TappableKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: EssenceSelection,
    #[cfg_attr(feature = "serde", serde(default))]
    pub points: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub capabilities: Capabilities,
    #[cfg_attr(feature = "serde", serde(default))]
    pub collect: EssenceSelection,
    #[cfg_attr(feature = "serde", serde(default))]
    pub points_per_stored: Option<EssenceKind>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub abilities: Vec<AbilityTemplate>,
}

/// Errors detected while checking a catalog before a game starts.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate card key '{0}'")]
    DuplicateKey(String),

    #[error("card '{key}' is a {found} but sits in the {expected} list")]
    WrongList {
        key: String,
        expected: TappableKind,
        found: TappableKind,
    },

    #[error("catalog needs at least {needed} {kind} cards, has {found}")]
    TooFew {
        kind: TappableKind,
        needed: usize,
        found: usize,
    },
}

/// Ordered card lists. The order is part of the deterministic setup input:
/// factories walk the lists front to back, so two clients with the same
/// catalog assign the same identities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardCatalog {
    #[cfg_attr(feature = "serde", serde(default))]
    pub artifacts: Vec<CardTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mages: Vec<CardTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub magic_items: Vec<CardTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub monuments: Vec<CardTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub power_places: Vec<CardTemplate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scrolls: Vec<CardTemplate>,
}

impl CardCatalog {
    /// Lists in factory order, tagged with the kind they must contain.
    pub fn lists(&self) -> [(TappableKind, &[CardTemplate]); 6] {
        [
            (TappableKind::Artifact, &self.artifacts),
            (TappableKind::Mage, &self.mages),
            (TappableKind::MagicItem, &self.magic_items),
            (TappableKind::Monument, &self.monuments),
            (TappableKind::PowerPlace, &self.power_places),
            (TappableKind::Scroll, &self.scrolls),
        ]
    }

    /// Every template in factory order.
    pub fn templates(&self) -> impl Iterator<Item = &CardTemplate> {
        self.lists()
            .into_iter()
            .flat_map(|(_, templates)| templates.iter())
    }

    pub fn len(&self) -> usize {
        self.lists().iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&CardTemplate> {
        self.templates().find(|template| template.key == key)
    }

    /// Checks key uniqueness, list membership and the minimum counts a game
    /// with `players` seats needs.
    pub fn validate(&self, players: usize) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for (expected, list) in self.lists() {
            for template in list {
                if template.kind != expected {
                    return Err(CatalogError::WrongList {
                        key: template.key.clone(),
                        expected,
                        found: template.kind,
                    });
                }
                if !seen.insert(template.key.as_str()) {
                    return Err(CatalogError::DuplicateKey(template.key.clone()));
                }
            }
        }

        let needed = [
            (
                TappableKind::Mage,
                players * crate::GameConfig::MAGES_OFFERED,
                self.mages.len(),
            ),
            (TappableKind::MagicItem, players, self.magic_items.len()),
            (TappableKind::Artifact, players, self.artifacts.len()),
        ];
        for (kind, needed, found) in needed {
            if found < needed {
                return Err(CatalogError::TooFew {
                    kind,
                    needed,
                    found,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(key: &str, kind: TappableKind) -> CardTemplate {
        CardTemplate {
            key: key.into(),
            name: key.into(),
            kind,
            cost: EssenceSelection::zero(),
            points: 0,
            capabilities: Capabilities::empty(),
            collect: EssenceSelection::zero(),
            points_per_stored: None,
            abilities: Vec::new(),
        }
    }

    fn catalog() -> CardCatalog {
        CardCatalog {
            artifacts: vec![
                card("a1", TappableKind::Artifact),
                card("a2", TappableKind::Artifact),
            ],
            mages: (0..4)
                .map(|i| card(&format!("m{i}"), TappableKind::Mage))
                .collect(),
            magic_items: vec![
                card("i1", TappableKind::MagicItem),
                card("i2", TappableKind::MagicItem),
            ],
            ..CardCatalog::default()
        }
    }

    #[test]
    fn templates_follow_factory_order() {
        let catalog = catalog();
        let keys: Vec<_> = catalog.templates().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, ["a1", "a2", "m0", "m1", "m2", "m3", "i1", "i2"]);
        assert_eq!(catalog.len(), 8);
        assert!(catalog.get("m2").is_some());
    }

    #[test]
    fn validate_accepts_a_two_player_catalog() {
        assert_eq!(catalog().validate(2), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicates_and_misfiled_cards() {
        let mut catalog = catalog();
        catalog.artifacts.push(card("m0", TappableKind::Artifact));
        assert_eq!(
            catalog.validate(2),
            Err(CatalogError::DuplicateKey("m0".into()))
        );

        let mut catalog = self::catalog();
        catalog.scrolls.push(card("s1", TappableKind::Monument));
        assert!(matches!(
            catalog.validate(2),
            Err(CatalogError::WrongList { .. })
        ));
    }

    #[test]
    fn validate_counts_draft_material() {
        assert!(matches!(
            catalog().validate(3),
            Err(CatalogError::TooFew {
                kind: TappableKind::Mage,
                ..
            })
        ));
    }
}
