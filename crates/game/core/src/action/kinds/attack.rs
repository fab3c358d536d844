use crate::action::{ActionTransition, SenderRule};
use crate::engine::turns;
use crate::error::{ErrorSeverity, GameError};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::GameState;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    #[error("no attack by {ability} is waiting on {victim}")]
    NotPending { ability: AbilityId, victim: PlayerId },

    #[error("card {0} cannot protect its owner")]
    NotProtector(TappableId),
}

impl GameError for AttackError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }
}

/// How the victim deals with an attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackReply {
    /// Tap an untapped protector and lose nothing.
    Protect(TappableId),
    /// Lose the attack's essences, as far as they are held.
    Suffer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackResponse {
    pub ability: AbilityId,
    pub victim: PlayerId,
    pub reply: AttackReply,
}

impl ActionTransition for AttackResponse {
    type Error = AttackError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.victim)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        let pending = state
            .pending_attacks
            .iter()
            .any(|attack| attack.ability == self.ability && attack.victim == self.victim);
        if !pending {
            return Err(AttackError::NotPending {
                ability: self.ability,
                victim: self.victim,
            });
        }
        if let AttackReply::Protect(card) = self.reply
            && !state.protectors(self.victim).contains(&card)
        {
            return Err(AttackError::NotProtector(card));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        turns::resolve_attack(state, self.ability, self.victim, self.reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::{EssenceKind, EssenceSelection};
    use crate::state::PendingAttack;
    use crate::testing::TestTable;

    fn with_attack(table: &mut TestTable) -> AbilityId {
        let ability = AbilityId(0);
        table.state.pending_attacks.push_back(PendingAttack {
            ability,
            attacker: PlayerId(0),
            victim: PlayerId(1),
            loss: EssenceSelection::of(EssenceKind::Life, 5),
        });
        ability
    }

    #[test]
    fn suffering_never_goes_below_zero() {
        let mut table = TestTable::three_players();
        table.start();
        let ability = with_attack(&mut table);
        table.apply_from(11, AttackResponse {
            ability,
            victim: PlayerId(1),
            reply: AttackReply::Suffer,
        });
        let seat = table.state.player(PlayerId(1)).unwrap();
        assert_eq!(seat.essences.get(EssenceKind::Life), 0);
        assert!(table.state.pending_attacks.is_empty());
    }

    #[test]
    fn only_the_victim_answers() {
        let mut table = TestTable::three_players();
        table.start();
        let ability = with_attack(&mut table);
        let outcome = table.apply_from(12, AttackResponse {
            ability,
            victim: PlayerId(1),
            reply: AttackReply::Suffer,
        });
        assert!(outcome.is_none());
        assert_eq!(table.state.pending_attacks.len(), 1);
    }

    #[test]
    fn protecting_needs_a_protector() {
        let mut table = TestTable::three_players();
        table.start();
        let ability = with_attack(&mut table);
        let err = AttackResponse {
            ability,
            victim: PlayerId(1),
            reply: AttackReply::Protect(TappableId(0)),
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert_eq!(err, AttackError::NotProtector(TappableId(0)));
    }
}
