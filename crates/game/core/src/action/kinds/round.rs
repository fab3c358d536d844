use crate::action::{ActionTransition, SenderRule};
use crate::engine::{GameEvent, turns};
use crate::error::{ErrorSeverity, GameError};
use crate::essence::EssenceSelection;
use crate::registry::{PlayerId, TappableId};
use crate::state::{GameState, Phase};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("not allowed during {0}")]
    WrongPhase(Phase),

    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),

    #[error("player {0} already settled their income")]
    AlreadyResolved(PlayerId),

    #[error("income choices of player {0} do not settle their open sources")]
    InvalidIncome(PlayerId),

    #[error("player {0} already voted")]
    AlreadyVoted(PlayerId),

    #[error("{0} players have not voted for the next round")]
    VotesMissing(usize),

    #[error("expected round {expected}, got {found}")]
    WrongRound { expected: u32, found: u32 },

    #[error("checksum digest '{0}' is not hex")]
    MalformedDigest(String),
}

impl GameError for RoundError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RoundError::AlreadyResolved(_) | RoundError::AlreadyVoted(_) => {
                ErrorSeverity::Recoverable
            }
            RoundError::WrongRound { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }
}

/// Returns true if `choices` settles each of the open `sources` exactly once
/// with a legal resolution, and names no other card.
pub fn settles_income(
    sources: &[(TappableId, EssenceSelection)],
    choices: &[(TappableId, EssenceSelection)],
) -> bool {
    choices.len() == sources.len()
        && sources.iter().all(|(card, _)| {
            choices.iter().filter(|(chosen, _)| chosen == card).count() == 1
        })
        && choices.iter().all(|(chosen, choice)| {
            sources
                .iter()
                .any(|(card, collect)| card == chosen && choice.is_resolution_of(collect))
        })
}

/// A player's settled income for the round.
///
/// `choices` settles every indeterminate income source; determined sources
/// are collected without a choice.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncomeDone {
    pub player: PlayerId,
    pub choices: Vec<(TappableId, EssenceSelection)>,
}

impl ActionTransition for IncomeDone {
    type Error = RoundError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::Income {
            return Err(RoundError::WrongPhase(state.phase));
        }
        let seat = state
            .player(self.player)
            .ok_or(RoundError::UnknownPlayer(self.player))?;
        if seat.income_resolved {
            return Err(RoundError::AlreadyResolved(self.player));
        }
        let open: Vec<_> = state
            .income_sources(self.player)
            .into_iter()
            .filter(|(_, collect)| !collect.is_determined())
            .collect();
        if !settles_income(&open, &self.choices) {
            return Err(RoundError::InvalidIncome(self.player));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        turns::collect_income(state, self.player, &self.choices);
        turns::progress_income(state);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoteNextRound {
    pub player: PlayerId,
}

impl ActionTransition for VoteNextRound {
    type Error = RoundError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::RoundEnd {
            return Err(RoundError::WrongPhase(state.phase));
        }
        let seat = state
            .player(self.player)
            .ok_or(RoundError::UnknownPlayer(self.player))?;
        if seat.voted_next_round {
            return Err(RoundError::AlreadyVoted(self.player));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        if let Some(seat) = state.player_mut(self.player) {
            seat.voted_next_round = true;
        }
        if turns::votes_missing(state) == 0 {
            state.emit(GameEvent::RoundVotesComplete {
                round: state.turn.round,
            });
        }
        Ok(())
    }
}

/// Starts the next round once every connected player has voted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NextRound {
    pub round: u32,
}

impl ActionTransition for NextRound {
    type Error = RoundError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Designated
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::RoundEnd {
            return Err(RoundError::WrongPhase(state.phase));
        }
        let missing = turns::votes_missing(state);
        if missing > 0 {
            return Err(RoundError::VotesMissing(missing));
        }
        let expected = state.turn.round + 1;
        if self.round != expected {
            return Err(RoundError::WrongRound {
                expected,
                found: self.round,
            });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        turns::next_round(state);
        Ok(())
    }
}

/// Advisory digest of the sender's replicated state after `next_round`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checksum {
    pub player: PlayerId,
    pub round: u32,
    pub digest: String,
}

impl ActionTransition for Checksum {
    type Error = RoundError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        state
            .player(self.player)
            .ok_or(RoundError::UnknownPlayer(self.player))?;
        if self.digest.is_empty() || !self.digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RoundError::MalformedDigest(self.digest.clone()));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        state.emit(GameEvent::ChecksumReceived {
            player: self.player,
            round: self.round,
            digest: self.digest.clone(),
        });
        Ok(())
    }
}
