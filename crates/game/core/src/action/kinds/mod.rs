//! Concrete action records and their transitions.
mod attack;
mod lobby;
mod play;
mod round;
mod setup;

pub use attack::{AttackError, AttackReply, AttackResponse};
pub use lobby::{
    AddPlayer, Control, ControlCommand, ControlError, Disconnect, GameStart, LobbyError, SetName,
};
pub(crate) use play::check_turn;
pub use play::{CardAction, PlayError, PlayerAction, UserInputOverwrite, discard_gain_allowed};
pub use round::{Checksum, IncomeDone, NextRound, RoundError, VoteNextRound, settles_income};
pub use setup::{DealCards, DraftAction, SetupError, Shuffle, ShuffleKind};

/// Strips characters that would break the wire envelope.
pub fn sanitize_name(name: &str) -> String {
    const LIMIT: usize = 24;
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '|' | ';' | ',' | '$' | '#' | '='))
        .take(LIMIT)
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "player".to_string()
    } else {
        trimmed.to_string()
    }
}
