//! Tappables: every card-like board object.
//!
//! Cards are one closed set of kinds plus a capability table instead of a
//! type hierarchy. All tappables live in the arena `GameState::tappables`
//! and are referenced everywhere else by [`TappableId`].
mod catalog;

pub use catalog::{AbilityTemplate, CardCatalog, CardTemplate, CatalogError};

use bitflags::bitflags;
use tracing::warn;

use crate::essence::{EssenceKind, EssenceSelection};
use crate::registry::{AbilityId, PlayerId, TappableId};

/// Closed set of card kinds.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TappableKind {
    Artifact,
    Mage,
    MagicItem,
    Monument,
    PowerPlace,
    Scroll,
}

impl TappableKind {
    /// Kinds that are bought from the shared supply during the turn loop.
    pub fn is_buyable(self) -> bool {
        matches!(
            self,
            TappableKind::Monument | TappableKind::PowerPlace | TappableKind::Scroll
        )
    }

    /// Buying one of these can end the game.
    pub fn is_game_ending(self) -> bool {
        matches!(self, TappableKind::Monument | TappableKind::PowerPlace)
    }
}

bitflags! {
    /// Capability table shared by every card kind.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Capabilities: u8 {
        const COST_REDUCES = 1 << 0;
        const PROTECTS = 1 << 1;
        const BEAST = 1 << 2;
        const DRAGON = 1 << 3;
        const DEMON = 1 << 4;
    }
}

/// Where a tappable currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Location {
    /// Shared pool: unbought monuments, power places, scrolls, unpicked
    /// magic items, and artifacts before the initial shuffle.
    #[default]
    Supply,
    Deck(PlayerId),
    Hand(PlayerId),
    Discard(PlayerId),
    InPlay(PlayerId),
    /// A mage offered to a player during the draft.
    Offered(PlayerId),
}

impl Location {
    pub fn owner(self) -> Option<PlayerId> {
        match self {
            Location::Supply => None,
            Location::Deck(player)
            | Location::Hand(player)
            | Location::Discard(player)
            | Location::InPlay(player)
            | Location::Offered(player) => Some(player),
        }
    }

    pub fn is_in_play_for(self, player: PlayerId) -> bool {
        self == Location::InPlay(player)
    }
}

/// A card-like board object.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tappable {
    pub id: TappableId,
    pub kind: TappableKind,
    /// Catalog key; also the registry context.
    pub key: String,
    pub name: String,
    pub cost: EssenceSelection,
    pub points: i32,
    /// Points added during play (ennobling).
    pub bonus_points: i32,
    pub capabilities: Capabilities,
    pub tapped: bool,
    pub location: Location,
    /// Essences placed on the card.
    pub stored: EssenceSelection,
    /// Income collected at the start of each round while in play.
    pub collect: EssenceSelection,
    /// Stored essences of this kind count as points.
    pub points_per_stored: Option<EssenceKind>,
    pub abilities: Vec<AbilityId>,
}

impl Tappable {
    pub fn from_template(id: TappableId, template: &CardTemplate) -> Self {
        Self {
            id,
            kind: template.kind,
            key: template.key.clone(),
            name: template.name.clone(),
            cost: template.cost,
            points: template.points,
            bonus_points: 0,
            capabilities: template.capabilities,
            tapped: false,
            location: Location::Supply,
            stored: EssenceSelection::zero(),
            collect: template.collect,
            points_per_stored: template.points_per_stored,
            abilities: Vec::new(),
        }
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.location.owner()
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    /// Victory points this card is currently worth.
    pub fn current_points(&self) -> i32 {
        let stored = self
            .points_per_stored
            .map_or(0, |kind| self.stored.get(kind).max(0));
        self.points + self.bonus_points + stored
    }

    /// Marks the card used for the round. Tapping a tapped card is a no-op.
    pub fn tap(&mut self) -> bool {
        if self.tapped {
            warn!(
                target: "arcana::cards",
                card = %self.id,
                key = %self.key,
                "attempted to tap an already tapped card"
            );
            return false;
        }
        self.tapped = true;
        true
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Returns the card to a neutral state, e.g. when it leaves play.
    pub fn reset(&mut self) {
        self.tapped = false;
        self.stored = EssenceSelection::zero();
        self.bonus_points = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relic() -> Tappable {
        let template = CardTemplate {
            key: "ancient_relic".into(),
            name: "Ancient Relic".into(),
            kind: TappableKind::Artifact,
            cost: EssenceSelection::of(EssenceKind::Gold, 2),
            points: 1,
            capabilities: Capabilities::empty(),
            collect: EssenceSelection::zero(),
            points_per_stored: Some(EssenceKind::Gold),
            abilities: Vec::new(),
        };
        Tappable::from_template(TappableId(0), &template)
    }

    #[test]
    fn points_include_bonus_and_scoring_storage() {
        let mut card = relic();
        card.bonus_points = 1;
        card.stored = EssenceSelection::of(EssenceKind::Gold, 2).with(EssenceKind::Life, 4);
        assert_eq!(card.current_points(), 4);
    }

    #[test]
    fn tapping_twice_is_a_no_op() {
        let mut card = relic();
        assert!(card.tap());
        assert!(!card.tap());
        assert!(card.tapped);
        card.untap();
        assert!(!card.tapped);
    }

    #[test]
    fn location_reports_owner() {
        assert_eq!(Location::Supply.owner(), None);
        assert_eq!(Location::Hand(PlayerId(2)).owner(), Some(PlayerId(2)));
        assert!(Location::InPlay(PlayerId(1)).is_in_play_for(PlayerId(1)));
    }
}
