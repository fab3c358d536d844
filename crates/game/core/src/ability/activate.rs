//! Local activation driver.
//!
//! Only the client of the ability's owner runs this. It walks the
//! [`AbilityStatus`](super::AbilityStatus) machine, asking for each missing
//! choice through the selector queue, and yields one fully resolved message.
//! Nothing is broadcast before that point, so canceling leaves no trace on
//! other clients.
use tracing::{debug, info, warn};

use super::{AbilityAction, AbilityError, AbilityStatus, Progress};
use crate::action::{Message, UserInputOverwrite};
use crate::essence::EssenceSelection;
use crate::input::{Requester, SelectorKind};
use crate::registry::AbilityId;
use crate::state::GameState;

/// Random outcome source for abilities that roll.
///
/// The roll is made once by the activating client and carried in the
/// broadcast, so replay never draws randomness.
pub trait RollSource {
    /// Returns a value in `0..sides`. `sides` is never zero.
    fn roll(&mut self, sides: u32) -> u32;
}

/// Always rolls the same outcome, modulo the number of sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedRoll(pub u32);

impl RollSource for FixedRoll {
    fn roll(&mut self, sides: u32) -> u32 {
        self.0 % sides.max(1)
    }
}

/// Where a local activation stands after the last step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Every choice is made; broadcast the message.
    Resolved(Message),
    /// Waiting for the visible selector to be answered.
    Pending,
    Rejected(AbilityError),
}

impl Activation {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Activation::Resolved(_))
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Activation::Resolved(message) => Some(message),
            Activation::Pending | Activation::Rejected(_) => None,
        }
    }
}

impl GameState {
    /// Starts activating `id` for the local player.
    pub fn activate_ability(&mut self, id: AbilityId, rolls: &mut dyn RollSource) -> Activation {
        match self.start_activation(id, rolls) {
            Ok(progress) => self.drive_activation(id, progress),
            Err(err) => {
                debug!(target: "arcana::ability", ability = %id, "activation refused: {err}");
                Activation::Rejected(err)
            }
        }
    }

    fn start_activation(
        &mut self,
        id: AbilityId,
        rolls: &mut dyn RollSource,
    ) -> Result<Progress, AbilityError> {
        let local = self.local.player.ok_or(AbilityError::NotLocal)?;
        if let Some(active) = self.local.active_ability {
            warn!(
                target: "arcana::ability",
                requested = %id,
                %active,
                "another ability is waiting for input"
            );
            return Err(AbilityError::AnotherActive(active));
        }
        if self.local.pending_card.is_some() {
            return Err(AbilityError::InputPending);
        }

        let owner = self.check_usable(id)?;
        if owner != local {
            return Err(AbilityError::NotLocal);
        }
        let ability = self.ability(id).ok_or(AbilityError::NotFound(id))?;
        let seat = self.player(owner).ok_or(AbilityError::NotLocal)?;
        if !ability.template.cost.is_payable(&seat.essences) {
            return Err(AbilityError::CostUnpayable);
        }
        if ability.effect().target_rule().is_some() && self.target_candidates(id).is_empty() {
            return Err(AbilityError::NoTargets);
        }
        let roll = match ability.effect().roll_sides() {
            Some(0) => return Err(AbilityError::InvalidRoll { roll: None, sides: 0 }),
            Some(sides) => Some(rolls.roll(sides)),
            None => None,
        };
        let progress = ability.status.begin(roll)?;
        self.local.active_ability = Some(id);
        Ok(progress)
    }

    /// Asks for the next missing choice, or resolves the activation when
    /// nothing is missing.
    pub(crate) fn drive_activation(&mut self, id: AbilityId, mut progress: Progress) -> Activation {
        let Some(ability) = self.ability(id) else {
            return self.reject_activation(id, AbilityError::NotFound(id));
        };
        let needs_target = ability.effect().target_rule().is_some();
        let cost_template = ability.template.cost;

        if needs_target && progress.target.is_none() {
            let candidates = self.target_candidates(id);
            if candidates.is_empty() {
                return self.reject_activation(id, AbilityError::NoTargets);
            }
            self.set_status(id, progress.awaiting_target());
            self.local
                .selectors
                .push(Requester::Ability(id), SelectorKind::Target { candidates });
            return Activation::Pending;
        }

        let cost = match progress.cost {
            Some(cost) => cost,
            None if cost_template.is_determined() => {
                progress.cost = Some(cost_template);
                cost_template
            }
            None => {
                let available = self
                    .ability_owner(id)
                    .and_then(|owner| self.player(owner))
                    .map_or_else(EssenceSelection::zero, |seat| seat.essences);
                self.set_status(id, progress.awaiting_cost());
                self.local.selectors.push(
                    Requester::Ability(id),
                    SelectorKind::Cost {
                        template: cost_template,
                        available,
                    },
                );
                return Activation::Pending;
            }
        };

        let Some(template) = self.output_template(id, progress.target, &cost, progress.roll) else {
            return self.reject_activation(id, AbilityError::InvalidOutput(cost.to_string()));
        };
        if template.is_determined() {
            return self.finish_activation(id, progress.resolve(cost, template));
        }
        self.set_status(id, progress.awaiting_output(cost));
        self.local
            .selectors
            .push(Requester::Ability(id), SelectorKind::Output { template });
        Activation::Pending
    }

    pub(crate) fn finish_activation(&mut self, id: AbilityId, action: AbilityAction) -> Activation {
        self.reset_activation(id);
        if let Err(err) = self.validate_overwrite(id, &action) {
            warn!(target: "arcana::ability", ability = %id, "resolved activation is invalid: {err}");
            return Activation::Rejected(err);
        }
        info!(
            target: "arcana::ability",
            ability = %id,
            cost = %action.cost,
            output = %action.output,
            target = ?action.target,
            "activation resolved"
        );
        Activation::Resolved(Message::GameAction(UserInputOverwrite::Ability {
            ability: id,
            action,
        }))
    }

    fn reject_activation(&mut self, id: AbilityId, err: AbilityError) -> Activation {
        self.reset_activation(id);
        debug!(target: "arcana::ability", ability = %id, "activation dropped: {err}");
        Activation::Rejected(err)
    }

    /// Returns the ability to `Idle` and drops its selectors.
    pub(crate) fn reset_activation(&mut self, id: AbilityId) {
        self.set_status(id, AbilityStatus::Idle);
        if self.local.active_ability == Some(id) {
            self.local.active_ability = None;
        }
        self.local
            .selectors
            .discard_where(|requester| *requester == Requester::Ability(id));
    }

    fn set_status(&mut self, id: AbilityId, status: AbilityStatus) {
        if let Some(ability) = self.ability_mut(id) {
            ability.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::EssenceKind;
    use crate::input::SelectionResult;
    use crate::registry::PlayerId;
    use crate::testing::TestTable;

    fn producer(table: &TestTable) -> AbilityId {
        table.mage_ability(PlayerId(0))
    }

    #[test]
    fn indeterminate_cost_waits_for_a_selector() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        let id = producer(&table);
        let activation = table.state.activate_ability(id, &mut FixedRoll(0));
        assert_eq!(activation, Activation::Pending);
        assert!(matches!(
            table.state.ability(id).unwrap().status,
            AbilityStatus::AwaitingCost { .. }
        ));
        assert_eq!(table.state.local.active_ability, Some(id));
    }

    #[test]
    fn a_second_activation_is_refused_while_one_is_open() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        let id = producer(&table);
        table.state.activate_ability(id, &mut FixedRoll(0));
        let second = table.state.activate_ability(id, &mut FixedRoll(0));
        assert_eq!(second, Activation::Rejected(AbilityError::AnotherActive(id)));
    }

    #[test]
    fn answering_the_cost_resolves_the_action() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        table.state.player_mut(PlayerId(0)).unwrap().essences =
            EssenceSelection::of(EssenceKind::Elan, 3);
        let id = producer(&table);
        table.state.activate_ability(id, &mut FixedRoll(0));
        let message = table
            .state
            .resolve_selection(SelectionResult::Essences(EssenceSelection::of(
                EssenceKind::Elan,
                2,
            )))
            .unwrap()
            .expect("cost was the last open choice");
        let Message::GameAction(UserInputOverwrite::Ability { action, .. }) = message else {
            panic!("expected an ability overwrite");
        };
        assert_eq!(action.cost.to_string(), "2:0:0:0:0:0");
        assert_eq!(action.output.to_string(), "0:0:0:0:1:0");
        assert!(table.state.local.active_ability.is_none());
        assert!(table.state.ability(id).unwrap().status.is_idle());
    }

    #[test]
    fn canceling_leaves_no_trace() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        let before = table.state.snapshot();
        let id = producer(&table);
        table.state.activate_ability(id, &mut FixedRoll(0));
        assert!(table.state.cancel_selection());
        assert!(table.state.ability(id).unwrap().status.is_idle());
        assert!(table.state.local.selectors.is_empty());
        assert_eq!(table.state.snapshot(), before);
    }

    #[test]
    fn other_players_abilities_are_not_local() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(1));
        let id = producer(&table);
        let activation = table.state.activate_ability(id, &mut FixedRoll(0));
        assert!(matches!(
            activation,
            Activation::Rejected(AbilityError::NotOwnersTurn { .. } | AbilityError::NotLocal)
        ));
    }

    #[test]
    fn fixed_roll_stays_in_range() {
        assert_eq!(FixedRoll(7).roll(3), 1);
        assert_eq!(FixedRoll(0).roll(5), 0);
    }
}
