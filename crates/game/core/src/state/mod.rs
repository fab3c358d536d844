//! Replicated game state.
//!
//! Every client owns one [`GameState`]. Entities live in flat arenas indexed
//! by their registry ids; everything else refers to them by id. The state is
//! mutated only through [`crate::engine::GameEngine`] (replicated actions) and
//! through [`GameState::local`] (this client's pending input, never
//! replicated).
mod phase;
mod player;
mod setup;
mod snapshot;

pub use bounded_vector::BoundedVec;
pub use phase::{DraftStage, PendingAttack, Phase, SetupProgress, TurnState};
pub use player::Player;
pub use snapshot::{CardSnapshot, PlayerSnapshot, StateSnapshot};

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::warn;

use crate::ability::{Ability, AbilityEffect};
use crate::cards::{CardCatalog, Location, Tappable, TappableKind};
use crate::config::GameConfig;
use crate::engine::GameEvent;
use crate::essence::EssenceSelection;
use crate::input::LocalInput;
use crate::registry::{AbilityId, EntityRegistry, PlayerId, TappableId};

/// Canonical per-client copy of the game.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub config: GameConfig,
    pub registry: EntityRegistry,
    pub phase: Phase,
    pub turn: TurnState,
    pub setup: SetupProgress,
    pub players: BoundedVec<Player, 0, { GameConfig::MAX_PLAYERS }>,
    /// Arena of every card; `TappableId(i)` is `tappables[i]`.
    pub tappables: Vec<Tappable>,
    /// Arena of every ability; `AbilityId(i)` is `abilities[i]`.
    pub abilities: Vec<Ability>,
    pub pending_attacks: VecDeque<PendingAttack>,

    #[cfg_attr(feature = "serde", serde(skip))]
    catalog: Arc<CardCatalog>,
    /// This client's in-progress input. Differs between clients.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub local: LocalInput,
    #[cfg_attr(feature = "serde", serde(skip))]
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(config: GameConfig, catalog: Arc<CardCatalog>) -> Self {
        Self {
            config,
            registry: EntityRegistry::new(),
            phase: Phase::Lobby,
            turn: TurnState::default(),
            setup: SetupProgress::default(),
            players: BoundedVec::default(),
            tappables: Vec::new(),
            abilities: Vec::new(),
            pending_attacks: VecDeque::new(),
            catalog,
            local: LocalInput::default(),
            events: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    // ===== lookups =====

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn player_by_client(&self, client_id: u32) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|player| player.client_id == client_id)
            .map(|player| player.id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.is_connected())
    }

    /// Client that performs shared random draws and phase broadcasts: the
    /// lowest-seated connected player.
    pub fn designated_client(&self) -> Option<u32> {
        self.connected_players()
            .min_by_key(|player| player.id)
            .map(|player| player.client_id)
    }

    pub fn tappable(&self, id: TappableId) -> Option<&Tappable> {
        self.tappables.get(id.index())
    }

    pub fn tappable_mut(&mut self, id: TappableId) -> Option<&mut Tappable> {
        self.tappables.get_mut(id.index())
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(id.index())
    }

    pub fn ability_mut(&mut self, id: AbilityId) -> Option<&mut Ability> {
        self.abilities.get_mut(id.index())
    }

    /// Player who currently holds the ability's card.
    pub fn ability_owner(&self, id: AbilityId) -> Option<PlayerId> {
        let ability = self.ability(id)?;
        self.tappable(ability.card)?.owner()
    }

    /// Seats in turn order starting with `from`.
    pub fn seats_from(&self, from: PlayerId) -> impl Iterator<Item = PlayerId> + '_ {
        let count = self.players.len() as u32;
        (0..count).map(move |offset| PlayerId((from.0 + offset) % count.max(1)))
    }

    // ===== scoring =====

    pub fn points(&self, player: PlayerId) -> i32 {
        self.player(player).map_or(0, |seat| {
            seat.table()
                .filter_map(|card| self.tappable(card))
                .map(Tappable::current_points)
                .sum()
        })
    }

    /// Total essences held, used to break ties on points.
    pub fn essence_total(&self, player: PlayerId) -> i32 {
        self.player(player)
            .map_or(0, |seat| seat.essences.determined_total())
    }

    // ===== card rules =====

    /// Sum of the cost reductions `player`'s passives grant towards `card`.
    pub fn cost_reduction(&self, player: PlayerId, card: TappableId) -> EssenceSelection {
        let Some(seat) = self.player(player) else {
            return EssenceSelection::zero();
        };
        let Some(target) = self.tappable(card) else {
            return EssenceSelection::zero();
        };
        let mut total = EssenceSelection::zero();
        for source in seat.table().filter(|source| *source != card) {
            let Some(source) = self.tappable(source) else {
                continue;
            };
            for ability in source.abilities.iter().filter_map(|id| self.ability(*id)) {
                if let AbilityEffect::CostReduction {
                    reduction,
                    applies_to,
                } = &ability.template.effect
                    && (applies_to.is_empty() || target.capabilities.intersects(*applies_to))
                {
                    total.add(reduction);
                }
            }
        }
        total
    }

    /// Cost of playing `card` for `player` after reductions.
    pub fn reduced_cost(&self, player: PlayerId, card: TappableId) -> Option<EssenceSelection> {
        let mut cost = self.tappable(card)?.cost;
        cost.reduce(&self.cost_reduction(player, card));
        Some(cost)
    }

    /// Cards on the player's table that yield income.
    pub fn income_sources(&self, player: PlayerId) -> Vec<(TappableId, EssenceSelection)> {
        let Some(seat) = self.player(player) else {
            return Vec::new();
        };
        seat.table()
            .filter_map(|card| self.tappable(card))
            .filter(|card| !card.collect.is_zero())
            .map(|card| (card.id, card.collect))
            .collect()
    }

    /// Cards on `player`'s table that can absorb an attack.
    pub fn protectors(&self, player: PlayerId) -> Vec<TappableId> {
        let Some(seat) = self.player(player) else {
            return Vec::new();
        };
        seat.table()
            .filter_map(|card| self.tappable(card))
            .filter(|card| !card.tapped && self.can_protect(card))
            .map(|card| card.id)
            .collect()
    }

    fn can_protect(&self, card: &Tappable) -> bool {
        card.has(crate::cards::Capabilities::PROTECTS)
            || card.abilities.iter().any(|id| {
                self.ability(*id)
                    .is_some_and(|ability| matches!(ability.template.effect, AbilityEffect::Protect))
            })
    }

    // ===== card movement =====

    /// Moves a card between zones, keeping the owners' zone lists in sync.
    ///
    /// Cards leaving play are untapped and lose stored essences and bonus
    /// points.
    pub fn move_card(&mut self, card: TappableId, to: Location) -> bool {
        let Some(tappable) = self.tappable(card) else {
            warn!(target: "arcana::state", %card, "move of unknown card");
            return false;
        };
        if let Some(owner) = to.owner()
            && self.player(owner).is_none()
        {
            warn!(target: "arcana::state", %card, %owner, "move to unknown player");
            return false;
        }
        let from = tappable.location;
        let kind = tappable.kind;

        if let Some(owner) = from.owner()
            && let Some(seat) = self.player_mut(owner)
        {
            match from {
                Location::Deck(_) => seat.deck.retain(|id| *id != card),
                Location::Hand(_) => seat.hand.retain(|id| *id != card),
                Location::Discard(_) => seat.discard.retain(|id| *id != card),
                Location::Offered(_) => seat.offered_mages.retain(|id| *id != card),
                Location::InPlay(_) => {
                    if seat.mage == Some(card) {
                        seat.mage = None;
                    } else if seat.magic_item == Some(card) {
                        seat.magic_item = None;
                    } else {
                        seat.in_play.retain(|id| *id != card);
                    }
                }
                Location::Supply => {}
            }
        }

        if let Some(owner) = to.owner()
            && let Some(seat) = self.player_mut(owner)
        {
            match to {
                Location::Deck(_) => seat.deck.push(card),
                Location::Hand(_) => seat.hand.push(card),
                Location::Discard(_) => seat.discard.push(card),
                Location::Offered(_) => {
                    if seat.offered_mages.try_push(card).is_err() {
                        warn!(target: "arcana::state", %card, %owner, "offer list full");
                    }
                }
                Location::InPlay(_) => match kind {
                    TappableKind::Mage => seat.mage = Some(card),
                    TappableKind::MagicItem => seat.magic_item = Some(card),
                    _ => seat.in_play.push(card),
                },
                Location::Supply => {}
            }
        }

        if let Some(tappable) = self.tappable_mut(card) {
            if matches!(from, Location::InPlay(_)) && !matches!(to, Location::InPlay(_)) {
                tappable.reset();
            }
            tappable.location = to;
        }
        true
    }

    /// Draws up to `count` cards from the top of the deck. Returns the number
    /// actually drawn.
    pub fn draw(&mut self, player: PlayerId, count: usize) -> usize {
        let mut drawn = 0;
        while drawn < count {
            let Some(top) = self.player(player).and_then(|seat| seat.deck.first().copied())
            else {
                break;
            };
            self.move_card(top, Location::Hand(player));
            drawn += 1;
        }
        drawn
    }

    // ===== events =====

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
