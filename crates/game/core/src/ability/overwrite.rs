//! Replay of a broadcast [`AbilityAction`].
//!
//! Runs on every client, including the one that activated the ability. The
//! action carries every choice, so replay is a pure function of state and
//! payload.
use tracing::{debug, warn};

use super::{AbilityAction, AbilityEffect, AbilityError};
use crate::cards::Location;
use crate::engine::{GameEvent, turns};
use crate::essence::EssenceSelection;
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::GameState;

/// What one ability replay did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectSummary {
    pub ability: AbilityId,
    pub owner: PlayerId,
    pub effect: &'static str,
    pub paid: EssenceSelection,
    /// Added to the owner's pool.
    pub gained: EssenceSelection,
    pub target: Option<TappableId>,
    pub attacks_opened: usize,
    /// The effect may have pushed someone over the win threshold.
    pub game_ending: bool,
}

impl GameState {
    /// Checks a broadcast ability action against the current state. Returns
    /// the ability's owner.
    pub fn validate_overwrite(
        &self,
        id: AbilityId,
        action: &AbilityAction,
    ) -> Result<PlayerId, AbilityError> {
        let owner = self.check_usable(id)?;
        let ability = self.ability(id).ok_or(AbilityError::NotFound(id))?;
        let seat = self.player(owner).ok_or(AbilityError::OwnerPassed)?;
        let effect = ability.effect();

        if !action.cost.is_resolution_of(&ability.template.cost) {
            return Err(AbilityError::InvalidCost(action.cost.to_string()));
        }
        if !action.cost.is_payable(&seat.essences) {
            return Err(AbilityError::CostUnpayable);
        }

        match (effect.target_rule(), action.target) {
            (Some(_), None) => return Err(AbilityError::MissingTarget),
            (Some(_), Some(target)) if !self.target_candidates(id).contains(&target) => {
                return Err(AbilityError::InvalidTarget(target));
            }
            (None, Some(target)) => return Err(AbilityError::InvalidTarget(target)),
            _ => {}
        }

        match effect.roll_sides() {
            Some(sides) if !action.roll.is_some_and(|roll| roll < sides) => {
                return Err(AbilityError::InvalidRoll {
                    roll: action.roll,
                    sides,
                });
            }
            None if action.roll.is_some() => {
                return Err(AbilityError::InvalidRoll {
                    roll: action.roll,
                    sides: 0,
                });
            }
            _ => {}
        }

        let template = self
            .output_template(id, action.target, &action.cost, action.roll)
            .ok_or_else(|| AbilityError::InvalidOutput(action.output.to_string()))?;
        if !action.output.is_resolution_of(&template) {
            return Err(AbilityError::InvalidOutput(action.output.to_string()));
        }
        Ok(owner)
    }

    /// Applies a validated ability action: pay, tap, run the effect.
    pub(crate) fn activate_overwrite(
        &mut self,
        id: AbilityId,
        action: &AbilityAction,
    ) -> Result<EffectSummary, AbilityError> {
        let ability = self.ability(id).ok_or(AbilityError::NotFound(id))?.clone();
        let owner = self
            .ability_owner(id)
            .ok_or(AbilityError::NotOnTable(ability.card))?;
        let effect = ability.template.effect.clone();
        let name: &'static str = (&effect).into();
        let output = action.output.determined_part();

        if let Some(seat) = self.player_mut(owner) {
            seat.essences.subtract(&action.cost);
        }
        if ability.template.requires_tap
            && let Some(card) = self.tappable_mut(ability.card)
        {
            card.tap();
        }

        let mut gained = EssenceSelection::zero();
        let mut attacks_opened = 0;
        let target = action.target;

        match &effect {
            AbilityEffect::Produce { .. }
            | AbilityEffect::Convert { .. }
            | AbilityEffect::GainPerCapability { .. }
            | AbilityEffect::Gamble { .. } => gained = output,
            AbilityEffect::StoreOnSelf { .. } => self.store(ability.card, &output),
            AbilityEffect::StoreOnOther { .. } => {
                if let Some(target) = target {
                    self.store(target, &output);
                }
            }
            AbilityEffect::CollectStored => {
                if let Some(card) = self.tappable_mut(ability.card) {
                    card.stored = EssenceSelection::zero();
                }
                gained = output;
            }
            AbilityEffect::Attack { loss, .. } => {
                gained = output;
                attacks_opened = turns::open_attack(self, id, owner, *loss);
            }
            AbilityEffect::Draw { count } => {
                self.draw(owner, usize::from(*count));
            }
            AbilityEffect::Foresee { .. } | AbilityEffect::Retrieve => {
                if let Some(target) = target {
                    self.move_card(target, Location::Hand(owner));
                }
            }
            AbilityEffect::DiscardForGain { .. } | AbilityEffect::Sacrifice { .. } => {
                if let Some(target) = target {
                    self.move_card(target, Location::Discard(owner));
                }
                gained = output;
            }
            AbilityEffect::DestroyOther => {
                if let Some(target) = target
                    && let Some(victim) = self.tappable(target).and_then(|card| card.owner())
                {
                    self.move_card(target, Location::Discard(victim));
                }
            }
            AbilityEffect::Untap => {
                if let Some(card) = target.and_then(|target| self.tappable_mut(target)) {
                    card.untap();
                }
            }
            AbilityEffect::Refresh => {
                let table: Vec<TappableId> = self
                    .player(owner)
                    .map(|seat| seat.table().filter(|id| *id != ability.card).collect())
                    .unwrap_or_default();
                for card in table {
                    if let Some(card) = self.tappable_mut(card) {
                        card.untap();
                    }
                }
            }
            AbilityEffect::Drain { kind, amount } => {
                let cap = (*amount).max(0);
                for seat in self.players.iter_mut() {
                    if seat.id == owner || seat.disconnected {
                        continue;
                    }
                    let taken = seat.essences.get(*kind).clamp(0, cap);
                    seat.essences.set(*kind, seat.essences.get(*kind) - taken);
                }
                gained = output;
            }
            AbilityEffect::Share { others, .. } => {
                let others = others.determined_part();
                for seat in self.players.iter_mut() {
                    if seat.id != owner && !seat.disconnected {
                        seat.essences.add(&others);
                    }
                }
                gained = output;
            }
            AbilityEffect::Ennoble { points } => {
                if let Some(card) = target.and_then(|target| self.tappable_mut(target)) {
                    card.bonus_points += *points;
                }
            }
            AbilityEffect::TakeFirstPlayer => {
                self.turn.next_first_player = Some(owner);
            }
            AbilityEffect::Transmute { .. } => {
                if let Some(card) = target.and_then(|target| self.tappable_mut(target)) {
                    card.stored = EssenceSelection::zero();
                }
                gained = output;
            }
            AbilityEffect::Protect | AbilityEffect::CostReduction { .. } => {
                warn!(target: "arcana::ability", ability = %id, "passive ability replayed");
            }
        }

        if !gained.is_zero()
            && let Some(seat) = self.player_mut(owner)
        {
            seat.essences.add(&gained);
        }
        if ability.template.one_shot {
            self.move_card(ability.card, Location::Supply);
        }

        debug!(
            target: "arcana::ability",
            ability = %id,
            %owner,
            effect = name,
            paid = %action.cost,
            %gained,
            ?target,
            "ability replayed"
        );
        self.emit(GameEvent::AbilityUsed { ability: id, owner });

        Ok(EffectSummary {
            ability: id,
            owner,
            effect: name,
            paid: action.cost,
            gained,
            target,
            attacks_opened,
            game_ending: effect.is_game_ending(),
        })
    }

    fn store(&mut self, card: TappableId, amount: &EssenceSelection) {
        if let Some(card) = self.tappable_mut(card) {
            card.stored.add(amount);
        }
    }
}
