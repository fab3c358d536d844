//! Abilities: activatable capabilities attached to tappables.
//!
//! Each ability is a closed [`AbilityEffect`] variant plus an explicit
//! [`AbilityStatus`] state machine. Two entry points exist:
//!
//! - `activate` (local only): collects the activating player's choices
//!   through selectors and yields one fully resolved [`AbilityAction`]
//! - `activate_overwrite` (every client): replays a broadcast
//!   [`AbilityAction`] as a pure function of state and payload
mod activate;
mod effect;
mod error;
mod overwrite;
mod status;

pub use activate::{Activation, FixedRoll, RollSource};
pub use effect::{AbilityEffect, TargetRule};
pub use error::AbilityError;
pub use overwrite::EffectSummary;
pub use status::{AbilityStatus, Progress};

use crate::cards::{AbilityTemplate, Location};
use crate::essence::EssenceSelection;
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::GameState;

/// One ability instance. Created with its parent card at setup and never
/// destroyed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ability {
    pub id: AbilityId,
    /// Parent card.
    pub card: TappableId,
    /// Position on the parent card.
    pub slot: u8,
    pub template: AbilityTemplate,
    /// Local input progress; never replicated.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub status: AbilityStatus,
}

impl Ability {
    pub fn new(id: AbilityId, card: TappableId, slot: u8, template: AbilityTemplate) -> Self {
        Self {
            id,
            card,
            slot,
            template,
            status: AbilityStatus::Idle,
        }
    }

    pub fn effect(&self) -> &AbilityEffect {
        &self.template.effect
    }
}

/// Fully resolved choices for one activation. Replaying it needs no further
/// input on any client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityAction {
    /// Determined essences paid.
    pub cost: EssenceSelection,
    /// Determined essences gained or stored.
    pub output: EssenceSelection,
    pub target: Option<TappableId>,
    /// Outcome index drawn by the activating client.
    pub roll: Option<u32>,
}

impl GameState {
    /// Checks shared by local activation and replay. Returns the owner.
    pub(crate) fn check_usable(&self, id: AbilityId) -> Result<PlayerId, AbilityError> {
        let ability = self.ability(id).ok_or(AbilityError::NotFound(id))?;
        if self.phase.is_game_over() {
            return Err(AbilityError::GameOver);
        }
        if self.phase != crate::state::Phase::Turns {
            return Err(AbilityError::NotTurnLoop);
        }
        if ability.template.effect.is_passive() {
            return Err(AbilityError::Passive(id));
        }

        let owner = self.ability_owner(id);
        let current = self.turn.current;
        if owner != Some(current) {
            return Err(AbilityError::NotOwnersTurn { owner, current });
        }
        if self.player(current).is_none_or(|seat| seat.passed) {
            return Err(AbilityError::OwnerPassed);
        }
        if self.turn.awaiting_advance {
            return Err(AbilityError::TurnSpent);
        }
        if !self.pending_attacks.is_empty() {
            return Err(AbilityError::AttackPending);
        }

        let card = self
            .tappable(ability.card)
            .ok_or(AbilityError::NotOnTable(ability.card))?;
        if card.location != Location::InPlay(current) {
            return Err(AbilityError::NotOnTable(card.id));
        }
        if ability.template.requires_tap && card.tapped {
            return Err(AbilityError::Tapped(card.id));
        }
        Ok(current)
    }
}
