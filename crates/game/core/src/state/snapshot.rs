//! Immutable views of the replicated state.
//!
//! Snapshots carry only consistency-relevant data: two clients that applied
//! the same action log produce equal snapshots. They are what statistics
//! recorders receive and what the checksum exchange hashes.
use super::{GameState, Phase};
use crate::essence::EssenceSelection;
use crate::registry::{PlayerId, TappableId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSnapshot {
    pub round: u32,
    pub turn: u32,
    pub phase: Phase,
    pub current: PlayerId,
    pub first_player: PlayerId,
    pub players: Vec<PlayerSnapshot>,
    pub table: Vec<CardSnapshot>,
    pub pending_attacks: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub essences: EssenceSelection,
    pub points: i32,
    pub deck: Vec<TappableId>,
    pub hand: Vec<TappableId>,
    pub discard: Vec<TappableId>,
    pub in_play: Vec<TappableId>,
    pub passed: bool,
    pub disconnected: bool,
}

/// State of one card that is on some player's table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardSnapshot {
    pub id: TappableId,
    pub key: String,
    pub tapped: bool,
    pub stored: EssenceSelection,
    pub bonus_points: i32,
}

impl GameState {
    pub fn snapshot(&self) -> StateSnapshot {
        let players = self
            .players
            .iter()
            .map(|player| PlayerSnapshot {
                id: player.id,
                name: player.name.clone(),
                essences: player.essences,
                points: self.points(player.id),
                deck: player.deck.clone(),
                hand: player.hand.clone(),
                discard: player.discard.clone(),
                in_play: player.table().collect(),
                passed: player.passed,
                disconnected: player.disconnected,
            })
            .collect();

        let table = self
            .tappables
            .iter()
            .filter(|card| matches!(card.location, crate::cards::Location::InPlay(_)))
            .map(|card| CardSnapshot {
                id: card.id,
                key: card.key.clone(),
                tapped: card.tapped,
                stored: card.stored,
                bonus_points: card.bonus_points,
            })
            .collect();

        StateSnapshot {
            round: self.turn.round,
            turn: self.turn.turn,
            phase: self.phase,
            current: self.turn.current,
            first_player: self.turn.first_player,
            players,
            table,
            pending_attacks: self.pending_attacks.len(),
        }
    }
}

impl StateSnapshot {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|player| player.id == id)
    }
}
