use std::collections::BTreeSet;

use arrayvec::ArrayVec;

use crate::config::GameConfig;
use crate::essence::EssenceSelection;
use crate::registry::{PlayerId, TappableId};

/// One seat at the table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    /// Relay connection that speaks for this seat.
    pub client_id: u32,
    pub name: String,
    /// Always determined.
    pub essences: EssenceSelection,
    /// Index 0 is the top of the deck.
    pub deck: Vec<TappableId>,
    pub hand: Vec<TappableId>,
    pub discard: Vec<TappableId>,
    /// Artifacts, monuments, power places and scrolls on the table.
    pub in_play: Vec<TappableId>,
    pub mage: Option<TappableId>,
    pub magic_item: Option<TappableId>,
    pub offered_mages: ArrayVec<TappableId, { GameConfig::MAGES_OFFERED }>,
    pub passed: bool,
    pub income_resolved: bool,
    pub voted_next_round: bool,
    pub disconnected: bool,
    pub disconnect_votes: BTreeSet<PlayerId>,
}

impl Player {
    pub fn new(id: PlayerId, client_id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            client_id,
            name: name.into(),
            essences: EssenceSelection::zero(),
            deck: Vec::new(),
            hand: Vec::new(),
            discard: Vec::new(),
            in_play: Vec::new(),
            mage: None,
            magic_item: None,
            offered_mages: ArrayVec::new(),
            passed: false,
            income_resolved: false,
            voted_next_round: false,
            disconnected: false,
            disconnect_votes: BTreeSet::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.disconnected
    }

    /// Still taking turns this round.
    pub fn is_active(&self) -> bool {
        !self.disconnected && !self.passed
    }

    /// Everything the player has on the table: mage, magic item, then the
    /// other cards in play order.
    pub fn table(&self) -> impl Iterator<Item = TappableId> + '_ {
        self.mage
            .into_iter()
            .chain(self.magic_item)
            .chain(self.in_play.iter().copied())
    }

    pub fn owns_on_table(&self, card: TappableId) -> bool {
        self.table().any(|id| id == card)
    }
}
