//! Built-in turn strategies.
use arcana_core::{GameState, PlayerId, TappableKind};

use super::{TurnChoice, TurnStrategy};

/// Plays the first affordable artifact, else buys the first affordable
/// monument, power place or scroll, else passes.
///
/// A hand larger than the starting hand is thinned by discarding for gold
/// before passing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl TurnStrategy for GreedyStrategy {
    fn choose(&self, state: &GameState, player: PlayerId) -> TurnChoice {
        let Some(seat) = state.player(player) else {
            return TurnChoice::Pass;
        };
        let wallet = seat.essences;

        let playable = seat.hand.iter().copied().find(|card| {
            state
                .reduced_cost(player, *card)
                .is_some_and(|cost| cost.is_payable(&wallet))
        });
        if let Some(card) = playable {
            return TurnChoice::Play(card);
        }

        let buyable = [
            TappableKind::Monument,
            TappableKind::PowerPlace,
            TappableKind::Scroll,
        ]
        .into_iter()
        .flat_map(|kind| state.supply_of(kind))
        .find(|card| {
            state
                .tappable(*card)
                .is_some_and(|target| target.cost.is_payable(&wallet))
        });
        if let Some(card) = buyable {
            return TurnChoice::Buy(card);
        }

        match seat.hand.first() {
            Some(card) if seat.hand.len() > state.config.starting_hand => {
                TurnChoice::Discard(*card)
            }
            _ => TurnChoice::Pass,
        }
    }

    fn name(&self) -> &'static str {
        "greedy"
    }

    fn description(&self) -> &'static str {
        "Spends essences on the first card it can afford"
    }
}

/// Passes every turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveStrategy;

impl TurnStrategy for PassiveStrategy {
    fn choose(&self, _state: &GameState, _player: PlayerId) -> TurnChoice {
        TurnChoice::Pass
    }

    fn name(&self) -> &'static str {
        "passive"
    }

    fn description(&self) -> &'static str {
        "Never acts, only collects income"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::testing::TestTable;

    #[test]
    fn greedy_plays_before_passing() {
        let mut table = TestTable::three_players();
        table.start();
        let player = table.state.turn.current;
        let choice = GreedyStrategy.choose(&table.state, player);
        let hand = &table.state.player(player).unwrap().hand;
        match choice {
            TurnChoice::Play(card) => assert!(hand.contains(&card)),
            TurnChoice::Buy(card) => {
                assert_eq!(table.state.tappable(card).unwrap().location, arcana_core::Location::Supply)
            }
            TurnChoice::Discard(_) => panic!("starting hand is never thinned"),
            TurnChoice::Pass => {}
        }
    }

    #[test]
    fn passive_always_passes() {
        let mut table = TestTable::three_players();
        table.start();
        assert_eq!(
            PassiveStrategy.choose(&table.state, PlayerId(0)),
            TurnChoice::Pass
        );
    }
}
