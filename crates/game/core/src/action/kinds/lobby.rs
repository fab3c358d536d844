use tracing::info;

use super::sanitize_name;
use crate::action::{ActionTransition, SenderRule};
use crate::config::GameConfig;
use crate::engine::{GameEvent, turns};
use crate::error::{ErrorSeverity, GameError};
use crate::registry::PlayerId;
use crate::state::{GameState, Phase};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    #[error("seating is closed once the game has started")]
    NotInLobby,

    #[error("the table already seats {0} players")]
    TableFull(usize),

    #[error("client {0} already has a seat")]
    AlreadySeated(u32),

    #[error("{found} players seated, at least {min} needed")]
    TooFewPlayers { found: usize, min: usize },

    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is already disconnected")]
    AlreadyDisconnected(PlayerId),
}

impl GameError for LobbyError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            LobbyError::AlreadyDisconnected(_) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }
}

/// Takes the next free seat for the sending client.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddPlayer {
    /// Taken from the envelope header, not the payload.
    pub client_id: u32,
    pub name: String,
}

impl ActionTransition for AddPlayer {
    type Error = LobbyError;
    type Result = PlayerId;

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Client(self.client_id)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::Lobby {
            return Err(LobbyError::NotInLobby);
        }
        if state.player_count() >= GameConfig::MAX_PLAYERS {
            return Err(LobbyError::TableFull(GameConfig::MAX_PLAYERS));
        }
        if state.player_by_client(self.client_id).is_some() {
            return Err(LobbyError::AlreadySeated(self.client_id));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        let name = sanitize_name(&self.name);
        let player = state
            .seat_player(self.client_id, &name)
            .ok_or(LobbyError::TableFull(GameConfig::MAX_PLAYERS))?;
        info!(
            target: "arcana::lobby",
            %player,
            client_id = self.client_id,
            name = %name,
            "player seated"
        );
        state.emit(GameEvent::PlayerSeated {
            player,
            client_id: self.client_id,
        });
        Ok(player)
    }
}

/// Runs the card factories and hands setup to the designated client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameStart;

impl ActionTransition for GameStart {
    type Error = LobbyError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Designated
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        if state.phase != Phase::Lobby {
            return Err(LobbyError::NotInLobby);
        }
        let found = state.player_count();
        if found < GameConfig::MIN_PLAYERS {
            return Err(LobbyError::TooFewPlayers {
                found,
                min: GameConfig::MIN_PLAYERS,
            });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        state.build_cards();
        state.grant_starting_essences();
        state.phase = Phase::Setup;
        info!(
            target: "arcana::lobby",
            players = state.player_count(),
            cards = state.tappables.len(),
            "game started"
        );
        state.emit(GameEvent::GameStarted);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetName {
    pub player: PlayerId,
    pub name: String,
}

impl ActionTransition for SetName {
    type Error = LobbyError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        state
            .player(self.player)
            .map(|_| ())
            .ok_or(LobbyError::UnknownPlayer(self.player))
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        let seat = state
            .player_mut(self.player)
            .ok_or(LobbyError::UnknownPlayer(self.player))?;
        seat.name = sanitize_name(&self.name);
        Ok(())
    }
}

/// The player leaves the session for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Disconnect {
    pub player: PlayerId,
}

impl ActionTransition for Disconnect {
    type Error = LobbyError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.player)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        let seat = state
            .player(self.player)
            .ok_or(LobbyError::UnknownPlayer(self.player))?;
        if seat.disconnected {
            return Err(LobbyError::AlreadyDisconnected(self.player));
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        turns::retire_player(state, self.player);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("player {0} is not seated")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is disconnected")]
    Disconnected(PlayerId),

    #[error("players cannot vote against themselves")]
    SelfVote,

    #[error("{voter} already voted against {target}")]
    DuplicateVote { voter: PlayerId, target: PlayerId },
}

impl GameError for ControlError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ControlError::DuplicateVote { .. } => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }
}

/// Session commands that are not moves of the game itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlCommand {
    /// Ask the table to mark a stalled player as disconnected.
    VoteDisconnect { target: PlayerId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Control {
    pub voter: PlayerId,
    pub command: ControlCommand,
}

impl Control {
    /// Votes needed: a strict majority of the other connected players.
    fn votes_needed(state: &GameState, target: PlayerId) -> usize {
        let others = state
            .connected_players()
            .filter(|seat| seat.id != target)
            .count();
        others / 2 + 1
    }
}

impl ActionTransition for Control {
    type Error = ControlError;
    type Result = ();

    fn sender(&self, _state: &GameState) -> SenderRule {
        SenderRule::Seat(self.voter)
    }

    fn pre_validate(&self, state: &GameState) -> Result<(), Self::Error> {
        let ControlCommand::VoteDisconnect { target } = self.command;
        let voter = state
            .player(self.voter)
            .ok_or(ControlError::UnknownPlayer(self.voter))?;
        if voter.disconnected {
            return Err(ControlError::Disconnected(self.voter));
        }
        let seat = state
            .player(target)
            .ok_or(ControlError::UnknownPlayer(target))?;
        if seat.disconnected {
            return Err(ControlError::Disconnected(target));
        }
        if target == self.voter {
            return Err(ControlError::SelfVote);
        }
        if seat.disconnect_votes.contains(&self.voter) {
            return Err(ControlError::DuplicateVote {
                voter: self.voter,
                target,
            });
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error> {
        let ControlCommand::VoteDisconnect { target } = self.command;
        let needed = Self::votes_needed(state, target);
        let seat = state
            .player_mut(target)
            .ok_or(ControlError::UnknownPlayer(target))?;
        seat.disconnect_votes.insert(self.voter);
        let votes = seat.disconnect_votes.len();
        info!(
            target: "arcana::control",
            voter = %self.voter,
            %target,
            votes,
            needed,
            "disconnect vote"
        );
        if votes >= needed {
            turns::retire_player(state, target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestTable, fixture_catalog};

    #[test]
    fn seats_follow_arrival_order() {
        let mut table = TestTable::new(fixture_catalog());
        let first = table.seat(10, "ana");
        let second = table.seat(11, "bo|b");
        assert_eq!((first, second), (PlayerId(0), PlayerId(1)));
        assert_eq!(table.state.player(second).unwrap().name, "bob");
        assert_eq!(
            table.state.registry.identifier(second).as_deref(),
            Some("Player#1#seat1")
        );
    }

    #[test]
    fn a_client_takes_one_seat_only() {
        let mut table = TestTable::new(fixture_catalog());
        table.seat(10, "ana");
        let err = AddPlayer {
            client_id: 10,
            name: "again".into(),
        }
        .pre_validate(&table.state)
        .unwrap_err();
        assert_eq!(err, LobbyError::AlreadySeated(10));
    }

    #[test]
    fn game_start_needs_two_players() {
        let mut table = TestTable::new(fixture_catalog());
        table.seat(10, "ana");
        assert!(matches!(
            GameStart.pre_validate(&table.state),
            Err(LobbyError::TooFewPlayers { found: 1, .. })
        ));
    }

    #[test]
    fn majority_vote_disconnects_a_player() {
        let mut table = TestTable::three_players();
        table.start();
        let target = PlayerId(2);
        table.apply_from(10, Control {
            voter: PlayerId(0),
            command: ControlCommand::VoteDisconnect { target },
        });
        assert!(!table.state.player(target).unwrap().disconnected);
        table.apply_from(11, Control {
            voter: PlayerId(1),
            command: ControlCommand::VoteDisconnect { target },
        });
        assert!(table.state.player(target).unwrap().disconnected);
    }
}
