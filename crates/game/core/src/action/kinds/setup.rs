use tracing::{debug, info};

use crate::action::{ActionTransition, SenderRule};
use crate::cards::{Location, TappableKind};
use crate::config::GameConfig;
use crate::engine::{GameEvent, turns};
use crate::error::{ErrorSeverity, GameError};
use crate::registry::{PlayerId, TappableId};
use crate::state::{DraftStage, GameState, Phase};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("not allowed during {0}")]
    WrongPhase(Phase),

    #[error("{0} already happened")]
    AlreadyDone(&'static str),

    #[error("{0} has not happened yet")]
    NotReady(&'static str),

    #[error("{kind} order is not a permutation of the expected cards")]
    NotPermutation { kind: ShuffleKind },

    #[error("refill shuffle names no player")]
    MissingPlayer,

    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),

    #[error("player {0} still has cards in their deck")]
    DeckNotEmpty(PlayerId),

    #[error("dealt cards are not the top of {0}'s deck")]
    WrongDeal(PlayerId),

    #[error("player {0} was already dealt")]
    AlreadyDealt(PlayerId),

    #[error("card {card} is not offered to {player}")]
    NotOffered { card: TappableId, player: PlayerId },

    #[error("it is {expected}'s pick, not {found}'s")]
    NotPicking { expected: PlayerId, found: PlayerId },

    #[error("card {0} is not an available magic item")]
    NotAvailable(TappableId),

    #[error("player {0} already picked")]
    AlreadyPicked(PlayerId),
}

impl GameError for SetupError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SetupError::NotPermutation { .. } | SetupError::WrongDeal(_) => {
                ErrorSeverity::Internal
            }
            _ => ErrorSeverity::Validation,
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShuffleKind {
    /// Artifact order; dealt into decks in equal chunks.
    Initial,
    /// A player's discard pile becomes their new deck.
    Refill,
    /// Mage order; offered in pairs.
    Draft,
}

/// Shuffle result computed once by the designated client.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shuffle {
    pub kind: ShuffleKind,
    /// Only for refills.
    pub player: Option<PlayerId>,
    pub order: Vec<TappableId>,
}

fn is_permutation(order: &[TappableId], expected: &[TappableId]) -> bool {
    let mut left = order.to_vec();
    let mut right = expected.to_vec();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

impl Shuffle {
    fn all_of(state: &GameState, kind: TappableKind) -> Vec<TappableId> {
        state
            .tappables
            .iter()
            .filter(|card| card.kind == kind)
            .map(|card| card.id)
            .collect()
    }

    /// Cards each player receives from the initial shuffle.
    pub fn deck_size(state: &GameState) -> usize {
        let artifacts = state
            .tappables
            .iter()
            .filter(|card| card.kind == TappableKind::Artifact)
            .count();
        let players = state.player_count().max(1);
        state.config.artifacts_per_player.min(artifacts / players)
    }
}

impl ActionTransition for Shuffle {
    type Error = SetupError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Designated
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        match self.kind {
            ShuffleKind::Initial => {
                if state.phase != Phase::Setup {
                    return Err(SetupError::WrongPhase(state.phase));
                }
                if state.setup.decks_shuffled {
                    return Err(SetupError::AlreadyDone("initial shuffle"));
                }
                let artifacts = Self::all_of(state, TappableKind::Artifact);
                if !is_permutation(&self.order, &artifacts) {
                    return Err(SetupError::NotPermutation { kind: self.kind });
                }
            }
            ShuffleKind::Draft => {
                if state.phase != Phase::Setup {
                    return Err(SetupError::WrongPhase(state.phase));
                }
                if state.setup.mages_offered {
                    return Err(SetupError::AlreadyDone("draft shuffle"));
                }
                if state.setup.dealt.len() < state.player_count() {
                    return Err(SetupError::NotReady("dealing"));
                }
                let mages = Self::all_of(state, TappableKind::Mage);
                if !is_permutation(&self.order, &mages) {
                    return Err(SetupError::NotPermutation { kind: self.kind });
                }
            }
            ShuffleKind::Refill => {
                if !matches!(state.phase, Phase::Turns | Phase::RoundEnd) {
                    return Err(SetupError::WrongPhase(state.phase));
                }
                let player = self.player.ok_or(SetupError::MissingPlayer)?;
                let seat = state
                    .player(player)
                    .ok_or(SetupError::UnknownPlayer(player))?;
                if !seat.deck.is_empty() {
                    return Err(SetupError::DeckNotEmpty(player));
                }
                if !is_permutation(&self.order, &seat.discard) {
                    return Err(SetupError::NotPermutation { kind: self.kind });
                }
            }
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        match self.kind {
            ShuffleKind::Initial => {
                let chunk = Self::deck_size(state);
                let seats: Vec<PlayerId> = state.players.iter().map(|seat| seat.id).collect();
                for (seat, cards) in seats.iter().zip(self.order.chunks(chunk.max(1))) {
                    for card in cards {
                        state.move_card(*card, Location::Deck(*seat));
                    }
                }
                state.setup.decks_shuffled = true;
                debug!(target: "arcana::setup", chunk, "decks built");
            }
            ShuffleKind::Draft => {
                let seats: Vec<PlayerId> = state.players.iter().map(|seat| seat.id).collect();
                for (seat, mages) in seats
                    .iter()
                    .zip(self.order.chunks(GameConfig::MAGES_OFFERED))
                {
                    for mage in mages {
                        state.move_card(*mage, Location::Offered(*seat));
                    }
                }
                state.setup.mages_offered = true;
                turns::begin_draft(state);
            }
            ShuffleKind::Refill => {
                let player = self.player.ok_or(SetupError::MissingPlayer)?;
                for card in &self.order {
                    state.move_card(*card, Location::Deck(player));
                }
                state.emit(GameEvent::DeckRefilled { player });
            }
        }
        Ok(())
    }
}

/// Moves the top of a player's deck into their hand during setup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DealCards {
    pub player: PlayerId,
    pub cards: Vec<TappableId>,
}

impl ActionTransition for DealCards {
    type Error = SetupError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Designated
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::Setup {
            return Err(SetupError::WrongPhase(state.phase));
        }
        if !state.setup.decks_shuffled {
            return Err(SetupError::NotReady("initial shuffle"));
        }
        if state.setup.dealt.contains(&self.player) {
            return Err(SetupError::AlreadyDealt(self.player));
        }
        let seat = state
            .player(self.player)
            .ok_or(SetupError::UnknownPlayer(self.player))?;
        let count = state.config.starting_hand.min(seat.deck.len());
        if seat.deck[..count] != self.cards[..] {
            return Err(SetupError::WrongDeal(self.player));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        for card in &self.cards {
            state.move_card(*card, Location::Hand(self.player));
        }
        state.setup.dealt.push(self.player);
        Ok(())
    }
}

/// Keeps one offered mage, or picks a magic item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DraftAction {
    pub player: PlayerId,
    pub card: TappableId,
}

impl ActionTransition for DraftAction {
    type Error = SetupError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        let seat = state
            .player(self.player)
            .ok_or(SetupError::UnknownPlayer(self.player))?;
        match state.phase {
            Phase::Draft(DraftStage::Mages) => {
                if seat.mage.is_some() {
                    return Err(SetupError::AlreadyPicked(self.player));
                }
                if !seat.offered_mages.contains(&self.card) {
                    return Err(SetupError::NotOffered {
                        card: self.card,
                        player: self.player,
                    });
                }
            }
            Phase::Draft(DraftStage::MagicItems { picking }) => {
                if picking != self.player {
                    return Err(SetupError::NotPicking {
                        expected: picking,
                        found: self.player,
                    });
                }
                let available = state.tappable(self.card).is_some_and(|card| {
                    card.kind == TappableKind::MagicItem && card.location == Location::Supply
                });
                if !available {
                    return Err(SetupError::NotAvailable(self.card));
                }
            }
            other => return Err(SetupError::WrongPhase(other)),
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        turns::draft_pick(state, self.player, self.card);
        info!(
            target: "arcana::draft",
            player = %self.player,
            card = %self.card,
            "draft pick"
        );
        turns::progress_draft(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::GameStart;
    use crate::testing::{TestTable, fixture_catalog};

    fn started() -> TestTable {
        let mut table = TestTable::new(fixture_catalog());
        table.seat(10, "ana");
        table.seat(11, "bo");
        table.apply_from(10, GameStart);
        table
    }

    #[test]
    fn initial_shuffle_must_cover_every_artifact() {
        let table = started();
        let mut order = table.artifact_ids();
        order.pop();
        let err = Shuffle {
            kind: ShuffleKind::Initial,
            player: None,
            order,
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert_eq!(
            err,
            SetupError::NotPermutation {
                kind: ShuffleKind::Initial
            }
        );
    }

    #[test]
    fn initial_shuffle_deals_equal_chunks_top_first() {
        let mut table = started();
        let order = table.artifact_ids();
        let chunk = Shuffle::deck_size(&table.state);
        table.apply_from(10, Shuffle {
            kind: ShuffleKind::Initial,
            player: None,
            order: order.clone(),
        });
        let deck = &table.state.player(PlayerId(1)).unwrap().deck;
        assert_eq!(deck[..], order[chunk..chunk * 2]);
    }

    #[test]
    fn deal_must_take_the_top_of_the_deck() {
        let mut table = started();
        let order = table.artifact_ids();
        table.apply_from(10, Shuffle {
            kind: ShuffleKind::Initial,
            player: None,
            order,
        });
        let deck = table.state.player(PlayerId(0)).unwrap().deck.clone();
        let wrong = DealCards {
            player: PlayerId(0),
            cards: deck[1..4].to_vec(),
        };
        assert_eq!(
            wrong.pre_validate(&table.state),
            Err(SetupError::WrongDeal(PlayerId(0)))
        );
    }

    #[test]
    fn only_the_designated_client_may_shuffle() {
        let mut table = started();
        let order = table.artifact_ids();
        let outcome = table.apply_from(11, Shuffle {
            kind: ShuffleKind::Initial,
            player: None,
            order,
        });
        assert!(outcome.is_none());
        assert!(!table.state.setup.decks_shuffled);
    }

    #[test]
    fn permutation_ignores_order_but_not_content() {
        let a = [TappableId(1), TappableId(2)];
        assert!(is_permutation(&[TappableId(2), TappableId(1)], &a));
        assert!(!is_permutation(&[TappableId(2), TappableId(2)], &a));
    }
}
