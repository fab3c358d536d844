//! Card and seat factories.
//!
//! Factories run once per game in a fixed order over the catalog lists, so
//! every client assigns the same registry identities.
use tracing::{debug, warn};

use super::{GameState, Player};
use crate::ability::Ability;
use crate::cards::{Location, Tappable};
use crate::essence::{EssenceKind, EssenceSelection};
use crate::registry::PlayerId;

impl GameState {
    /// Takes the next seat for `client_id`.
    pub(crate) fn seat_player(&mut self, client_id: u32, name: &str) -> Option<PlayerId> {
        let seat = self.players.len();
        let id = self.registry.register_player(&format!("seat{seat}"));
        if id.index() != seat {
            warn!(
                target: "arcana::setup",
                %id,
                seat,
                "player registry out of step with seating"
            );
        }
        if self.players.push(Player::new(id, client_id, name)).is_err() {
            warn!(target: "arcana::setup", client_id, "table is full");
            return None;
        }
        Some(id)
    }

    /// Instantiates every catalog card and its abilities, then freezes the
    /// registry.
    pub(crate) fn build_cards(&mut self) {
        let catalog = self.catalog.clone();
        for template in catalog.templates() {
            let card_id = self.registry.register_tappable(&template.key);
            let mut card = Tappable::from_template(card_id, template);
            for (slot, ability) in template.abilities.iter().enumerate() {
                let ability_id = self
                    .registry
                    .register_ability(&format!("{}.{slot}", template.key));
                card.abilities.push(ability_id);
                self.abilities
                    .push(Ability::new(ability_id, card_id, slot as u8, ability.clone()));
            }
            self.tappables.push(card);
        }
        self.registry.freeze();
        debug!(
            target: "arcana::setup",
            cards = self.tappables.len(),
            abilities = self.abilities.len(),
            "card factories complete"
        );
    }

    /// Starting essences for every seat.
    pub(crate) fn grant_starting_essences(&mut self) {
        let amount = self.config.starting_essence;
        let start = EssenceKind::ALL
            .into_iter()
            .fold(EssenceSelection::zero(), |acc, kind| acc.with(kind, amount));
        for player in self.players.iter_mut() {
            player.essences = start;
        }
    }

    /// Ids of every card of the given kind still in the supply, in arena
    /// order.
    pub fn supply_of(&self, kind: crate::cards::TappableKind) -> Vec<crate::registry::TappableId> {
        self.tappables
            .iter()
            .filter(|card| card.kind == kind && card.location == Location::Supply)
            .map(|card| card.id)
            .collect()
    }
}
