//! Replicated actions.
//!
//! Every state change is one [`Message`]. Messages are decoded once at the
//! wire boundary into these typed records and then applied identically by
//! every client through [`crate::engine::GameEngine`].
//!
//! # Module Structure
//!
//! - `kinds::lobby`: seating, game start, renames, disconnects, control votes
//! - `kinds::setup`: shuffles, dealing and the draft
//! - `kinds::round`: income, round votes, next round, checksums
//! - `kinds::play`: the current player's turn action (`UserInputOverwrite`)
//! - `kinds::attack`: attack responses
mod kinds;

pub use kinds::{
    AddPlayer, AttackError, AttackReply, AttackResponse, CardAction, Checksum, Control,
    ControlCommand, ControlError, DealCards, Disconnect, DraftAction, GameStart, IncomeDone,
    LobbyError, NextRound, PlayError, PlayerAction, RoundError, SetName, SetupError, Shuffle,
    ShuffleKind, UserInputOverwrite, VoteNextRound, discard_gain_allowed, settles_income,
};
pub(crate) use kinds::check_turn;
pub use kinds::sanitize_name;

use crate::registry::PlayerId;
use crate::state::GameState;

/// Connection allowed to send an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderRule {
    /// Exactly this connection (e.g. taking a seat).
    Client(u32),
    /// The lowest-seated connected player's client.
    Designated,
    /// The client seated as this player.
    Seat(PlayerId),
}

/// How a concrete action mutates the replicated state.
///
/// Hooks receive the state of the applying client only; they must be pure
/// functions of that state and the action payload.
pub trait ActionTransition {
    type Error;
    type Result;

    /// Which connection may send this action.
    fn sender(&self, state: &GameState) -> SenderRule;

    /// Validates pre-conditions using the state **before** mutation.
    fn pre_validate(&self, _state: &GameState) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies the action. Assumes `pre_validate` succeeded.
    fn apply(&self, state: &mut GameState) -> Result<Self::Result, Self::Error>;

    /// Validates post-conditions using the state **after** mutation.
    fn post_validate(&self, _state: &GameState) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Closed set of wire action keys.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionKey {
    AddPlayer,
    GameStart,
    SetName,
    Disconnect,
    GameAction,
    Shuffle,
    DraftAction,
    DealCards,
    NextRound,
    VoteNextRound,
    IncomeDone,
    Attack,
    Control,
    Checksum,
}

/// One replicated action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    AddPlayer(AddPlayer),
    GameStart(GameStart),
    SetName(SetName),
    Disconnect(Disconnect),
    GameAction(UserInputOverwrite),
    Shuffle(Shuffle),
    DraftAction(DraftAction),
    DealCards(DealCards),
    NextRound(NextRound),
    VoteNextRound(VoteNextRound),
    IncomeDone(IncomeDone),
    Attack(AttackResponse),
    Control(Control),
    Checksum(Checksum),
}

impl Message {
    pub fn key(&self) -> ActionKey {
        match self {
            Message::AddPlayer(_) => ActionKey::AddPlayer,
            Message::GameStart(_) => ActionKey::GameStart,
            Message::SetName(_) => ActionKey::SetName,
            Message::Disconnect(_) => ActionKey::Disconnect,
            Message::GameAction(_) => ActionKey::GameAction,
            Message::Shuffle(_) => ActionKey::Shuffle,
            Message::DraftAction(_) => ActionKey::DraftAction,
            Message::DealCards(_) => ActionKey::DealCards,
            Message::NextRound(_) => ActionKey::NextRound,
            Message::VoteNextRound(_) => ActionKey::VoteNextRound,
            Message::IncomeDone(_) => ActionKey::IncomeDone,
            Message::Attack(_) => ActionKey::Attack,
            Message::Control(_) => ActionKey::Control,
            Message::Checksum(_) => ActionKey::Checksum,
        }
    }
}

macro_rules! impl_from_message {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(action: $ty) -> Self {
                    Message::$variant(action)
                }
            }
        )*
    };
}

impl_from_message!(
    AddPlayer(AddPlayer),
    GameStart(GameStart),
    SetName(SetName),
    Disconnect(Disconnect),
    GameAction(UserInputOverwrite),
    Shuffle(Shuffle),
    DraftAction(DraftAction),
    DealCards(DealCards),
    NextRound(NextRound),
    VoteNextRound(VoteNextRound),
    IncomeDone(IncomeDone),
    Attack(AttackResponse),
    Control(Control),
    Checksum(Checksum),
);

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn action_keys_use_snake_case_wire_names() {
        assert_eq!(ActionKey::VoteNextRound.to_string(), "vote_next_round");
        assert_eq!("game_action".parse::<ActionKey>(), Ok(ActionKey::GameAction));
        assert!("GameAction".parse::<ActionKey>().is_err());
    }

    #[test]
    fn every_key_round_trips() {
        for key in ActionKey::iter() {
            assert_eq!(key.as_ref().parse::<ActionKey>(), Ok(key));
        }
    }

    #[test]
    fn message_reports_its_key() {
        let message = Message::from(NextRound { round: 2 });
        assert_eq!(message.key(), ActionKey::NextRound);
    }
}
