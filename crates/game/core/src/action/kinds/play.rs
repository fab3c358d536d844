use tracing::info;

use crate::ability::{AbilityAction, AbilityError, EffectSummary};
use crate::action::{ActionTransition, SenderRule};
use crate::cards::{Location, TappableKind};
use crate::engine::{GameEvent, turns};
use crate::error::{ErrorSeverity, GameError};
use crate::essence::{EssenceKind, EssenceSelection};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::{GameState, Phase};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error("not allowed during {0}")]
    WrongPhase(Phase),

    #[error("it is {current}'s turn, not {player}'s")]
    NotCurrent { player: PlayerId, current: PlayerId },

    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),

    #[error("player {0} has passed this round")]
    Passed(PlayerId),

    #[error("the current turn has already acted")]
    TurnSpent,

    #[error("attack responses are still pending")]
    AttackPending,

    #[error("card {0} is not in the player's hand")]
    NotInHand(TappableId),

    #[error("card {0} cannot be bought")]
    NotBuyable(TappableId),

    #[error("card {0} is not in the supply")]
    NotInSupply(TappableId),

    #[error("payment {0} does not settle the card's cost")]
    InvalidPayment(String),

    #[error("payment exceeds the player's essences")]
    CannotAfford,

    #[error("discard gain {0} is neither one gold nor two other essences")]
    InvalidGain(String),

    #[error("card {0} is not an available magic item")]
    ItemUnavailable(TappableId),
}

impl GameError for PlayError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PlayError::Ability(inner) => inner.severity(),
            PlayError::CannotAfford | PlayError::TurnSpent => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlayError::Ability(inner) => inner.error_code(),
            PlayError::WrongPhase(_) => "PLAY_WRONG_PHASE",
            PlayError::NotCurrent { .. } => "PLAY_NOT_CURRENT",
            PlayError::UnknownPlayer(_) => "PLAY_UNKNOWN_PLAYER",
            PlayError::Passed(_) => "PLAY_PASSED",
            PlayError::TurnSpent => "PLAY_TURN_SPENT",
            PlayError::AttackPending => "PLAY_ATTACK_PENDING",
            PlayError::NotInHand(_) => "PLAY_NOT_IN_HAND",
            PlayError::NotBuyable(_) => "PLAY_NOT_BUYABLE",
            PlayError::NotInSupply(_) => "PLAY_NOT_IN_SUPPLY",
            PlayError::InvalidPayment(_) => "PLAY_INVALID_PAYMENT",
            PlayError::CannotAfford => "PLAY_CANNOT_AFFORD",
            PlayError::InvalidGain(_) => "PLAY_INVALID_GAIN",
            PlayError::ItemUnavailable(_) => "PLAY_ITEM_UNAVAILABLE",
        }
    }
}

/// What happens to a card during a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardAction {
    /// Put an artifact from hand into play.
    Play { payment: EssenceSelection },
    /// Buy a monument, power place or scroll from the supply.
    Buy { payment: EssenceSelection },
    /// Discard from hand for one gold or two other essences.
    Discard { gain: EssenceSelection },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerAction {
    /// Stop acting this round, optionally swapping the magic item.
    Pass { magic_item: Option<TappableId> },
}

/// The current player's turn action, fully resolved by their client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UserInputOverwrite {
    Ability {
        ability: AbilityId,
        action: AbilityAction,
    },
    Card {
        player: PlayerId,
        card: TappableId,
        action: CardAction,
    },
    Player {
        player: PlayerId,
        action: PlayerAction,
    },
}

/// Gain allowed for discarding a card: one gold, or two essences of the
/// other kinds.
pub fn discard_gain_allowed(gain: &EssenceSelection) -> bool {
    if !gain.excluded().is_empty() {
        return false;
    }
    let gold = EssenceSelection::of(EssenceKind::Gold, 1);
    let other = EssenceSelection::any_except(2, EssenceKind::Gold.mask());
    gain.same_amounts(&gold) || gain.is_resolution_of(&other)
}

/// Checks that `player` may take a turn action right now.
pub(crate) fn check_turn(state: &GameState, player: PlayerId) -> Result<(), PlayError> {
    if state.phase != Phase::Turns {
        return Err(PlayError::WrongPhase(state.phase));
    }
    let seat = state
        .player(player)
        .ok_or(PlayError::UnknownPlayer(player))?;
    if state.turn.current != player {
        return Err(PlayError::NotCurrent {
            player,
            current: state.turn.current,
        });
    }
    if seat.passed {
        return Err(PlayError::Passed(player));
    }
    if state.turn.awaiting_advance {
        return Err(PlayError::TurnSpent);
    }
    if !state.pending_attacks.is_empty() {
        return Err(PlayError::AttackPending);
    }
    Ok(())
}

impl UserInputOverwrite {
    fn check_card(
        state: &GameState,
        player: PlayerId,
        card: TappableId,
        action: &CardAction,
    ) -> Result<(), PlayError> {
        check_turn(state, player)?;
        let seat = state
            .player(player)
            .ok_or(PlayError::UnknownPlayer(player))?;
        match action {
            CardAction::Play { payment } => {
                if !seat.hand.contains(&card) {
                    return Err(PlayError::NotInHand(card));
                }
                let cost = state
                    .reduced_cost(player, card)
                    .ok_or(PlayError::NotInHand(card))?;
                Self::check_payment(&seat.essences, payment, &cost)
            }
            CardAction::Buy { payment } => {
                let target = state.tappable(card).ok_or(PlayError::NotInSupply(card))?;
                if !target.kind.is_buyable() {
                    return Err(PlayError::NotBuyable(card));
                }
                if target.location != Location::Supply {
                    return Err(PlayError::NotInSupply(card));
                }
                Self::check_payment(&seat.essences, payment, &target.cost)
            }
            CardAction::Discard { gain } => {
                if !seat.hand.contains(&card) {
                    return Err(PlayError::NotInHand(card));
                }
                if !discard_gain_allowed(gain) {
                    return Err(PlayError::InvalidGain(gain.to_string()));
                }
                Ok(())
            }
        }
    }

    fn check_payment(
        essences: &EssenceSelection,
        payment: &EssenceSelection,
        cost: &EssenceSelection,
    ) -> Result<(), PlayError> {
        if !payment.is_resolution_of(cost) {
            return Err(PlayError::InvalidPayment(payment.to_string()));
        }
        if !payment.is_payable(essences) {
            return Err(PlayError::CannotAfford);
        }
        Ok(())
    }

    fn apply_card(state: &mut GameState, player: PlayerId, card: TappableId, action: &CardAction) {
        match action {
            CardAction::Play { payment } => {
                if let Some(seat) = state.player_mut(player) {
                    seat.essences.subtract(payment);
                }
                state.move_card(card, Location::InPlay(player));
                state.emit(GameEvent::CardPlayed { player, card });
            }
            CardAction::Buy { payment } => {
                if let Some(seat) = state.player_mut(player) {
                    seat.essences.subtract(payment);
                }
                state.move_card(card, Location::InPlay(player));
                state.emit(GameEvent::CardBought { player, card });
                let ends_game = state
                    .tappable(card)
                    .is_some_and(|bought| bought.kind.is_game_ending());
                if ends_game {
                    turns::check_game_end(state);
                }
            }
            CardAction::Discard { gain } => {
                state.move_card(card, Location::Discard(player));
                if let Some(seat) = state.player_mut(player) {
                    seat.essences.add(&gain.determined_part());
                }
                state.emit(GameEvent::CardDiscarded { player, card });
            }
        }
        info!(
            target: "arcana::turn",
            %player,
            %card,
            ?action,
            "card action"
        );
    }

    fn check_pass(
        state: &GameState,
        player: PlayerId,
        magic_item: Option<TappableId>,
    ) -> Result<(), PlayError> {
        check_turn(state, player)?;
        if let Some(item) = magic_item {
            let available = state.tappable(item).is_some_and(|card| {
                card.kind == TappableKind::MagicItem && card.location == Location::Supply
            });
            if !available {
                return Err(PlayError::ItemUnavailable(item));
            }
        }
        Ok(())
    }

    fn apply_pass(state: &mut GameState, player: PlayerId, magic_item: Option<TappableId>) {
        let previous = state.player(player).and_then(|seat| seat.magic_item);
        if let Some(seat) = state.player_mut(player) {
            seat.passed = true;
        }
        if state.turn.next_first_player.is_none() {
            state.turn.next_first_player = Some(player);
        }
        if let Some(item) = magic_item {
            if let Some(previous) = previous {
                state.move_card(previous, Location::Supply);
            }
            state.move_card(item, Location::InPlay(player));
        }
        let drawn = state.draw(player, 1);
        info!(
            target: "arcana::turn",
            %player,
            drawn,
            swapped = magic_item.is_some(),
            "player passed"
        );
        state.emit(GameEvent::PlayerPassed { player });
    }
}

impl ActionTransition for UserInputOverwrite {
    type Error = PlayError;
    type Result = Option<EffectSummary>;

    fn sender(&self, state: &GameState) -> SenderRule {
        match self {
            UserInputOverwrite::Ability { ability, .. } => {
                SenderRule::Seat(state.ability_owner(*ability).unwrap_or(state.turn.current))
            }
            UserInputOverwrite::Card { player, .. } | UserInputOverwrite::Player { player, .. } => {
                SenderRule::Seat(*player)
            }
        }
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        match self {
            UserInputOverwrite::Ability { ability, action } => {
                state.validate_overwrite(*ability, action)?;
                Ok(())
            }
            UserInputOverwrite::Card {
                player,
                card,
                action,
            } => Self::check_card(state, *player, *card, action),
            UserInputOverwrite::Player {
                player,
                action: PlayerAction::Pass { magic_item },
            } => Self::check_pass(state, *player, *magic_item),
        }
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        let summary = match self {
            UserInputOverwrite::Ability { ability, action } => {
                let summary = state.activate_overwrite(*ability, action)?;
                if summary.game_ending {
                    turns::check_game_end(state);
                }
                Some(summary)
            }
            UserInputOverwrite::Card {
                player,
                card,
                action,
            } => {
                Self::apply_card(state, *player, *card, action);
                None
            }
            UserInputOverwrite::Player {
                player,
                action: PlayerAction::Pass { magic_item },
            } => {
                Self::apply_pass(state, *player, *magic_item);
                None
            }
        };
        state.turn.awaiting_advance = true;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::EssenceMask;
    use crate::testing::TestTable;

    #[test]
    fn discard_gain_is_one_gold_or_two_others() {
        assert!(discard_gain_allowed(&EssenceSelection::of(EssenceKind::Gold, 1)));
        assert!(discard_gain_allowed(&EssenceSelection::from_pairs(&[
            (EssenceKind::Elan, 1),
            (EssenceKind::Calm, 1),
        ])));
        assert!(!discard_gain_allowed(&EssenceSelection::of(EssenceKind::Gold, 2)));
        assert!(!discard_gain_allowed(&EssenceSelection::of(EssenceKind::Life, 3)));
        assert!(!discard_gain_allowed(
            &EssenceSelection::of(EssenceKind::Gold, 1).with_excluded(EssenceKind::Life.mask())
        ));
    }

    #[test]
    fn masked_discard_gain_is_refused() {
        let mut table = TestTable::three_players();
        table.start();
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        let gain: EssenceSelection = "0:0:0:0:1:0~life".parse().unwrap();
        let err = UserInputOverwrite::Card {
            player: PlayerId(0),
            card,
            action: CardAction::Discard { gain },
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert!(matches!(err, PlayError::InvalidGain(_)));
        assert!(table.state.player(PlayerId(0)).unwrap().essences.excluded().is_empty());
    }

    #[test]
    fn oversized_discard_gain_is_refused_without_overflow() {
        let mut table = TestTable::three_players();
        table.start();
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        let gain = EssenceSelection::new([i32::MAX, i32::MAX, 0, 0, 0, 0], EssenceMask::empty());
        let err = UserInputOverwrite::Card {
            player: PlayerId(0),
            card,
            action: CardAction::Discard { gain },
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert!(matches!(err, PlayError::InvalidGain(_)));
    }

    #[test]
    fn only_the_current_player_may_act() {
        let mut table = TestTable::three_players();
        table.start();
        let other = PlayerId(1);
        let err = UserInputOverwrite::Player {
            player: other,
            action: PlayerAction::Pass { magic_item: None },
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert_eq!(
            err,
            PlayError::NotCurrent {
                player: other,
                current: PlayerId(0)
            }
        );
    }

    #[test]
    fn passing_claims_first_player_and_moves_the_turn() {
        let mut table = TestTable::three_players();
        table.start();
        let hand_before = table.state.player(PlayerId(0)).unwrap().hand.len();
        table.apply_from(10, UserInputOverwrite::Player {
            player: PlayerId(0),
            action: PlayerAction::Pass { magic_item: None },
        });
        let seat = table.state.player(PlayerId(0)).unwrap();
        assert!(seat.passed);
        assert_eq!(seat.hand.len(), hand_before + 1);
        assert_eq!(table.state.turn.next_first_player, Some(PlayerId(0)));
        assert_eq!(table.state.turn.current, PlayerId(1));
        assert!(!table.state.turn.awaiting_advance);
    }

    #[test]
    fn discarding_pays_out_and_ends_the_turn() {
        let mut table = TestTable::three_players();
        table.start();
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        let gold = table.state.player(PlayerId(0)).unwrap().essences.get(EssenceKind::Gold);
        table.apply_from(10, UserInputOverwrite::Card {
            player: PlayerId(0),
            card,
            action: CardAction::Discard {
                gain: EssenceSelection::of(EssenceKind::Gold, 1),
            },
        });
        let seat = table.state.player(PlayerId(0)).unwrap();
        assert!(seat.discard.contains(&card));
        assert_eq!(seat.essences.get(EssenceKind::Gold), gold + 1);
        assert_eq!(table.state.turn.current, PlayerId(1));
    }

    #[test]
    fn playing_needs_an_exact_payment() {
        let mut table = TestTable::three_players();
        table.start();
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        let cost = table.state.reduced_cost(PlayerId(0), card).unwrap();
        let overpaid = cost.default_resolution() + EssenceSelection::of(EssenceKind::Gold, 1);
        let err = UserInputOverwrite::Card {
            player: PlayerId(0),
            card,
            action: CardAction::Play { payment: overpaid },
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert!(matches!(err, PlayError::InvalidPayment(_)));
    }
}
