use crate::essence::EssenceSelection;
use crate::registry::{AbilityId, PlayerId};

/// Top-level game phase.
///
/// `Lobby → Setup → Draft → Income → Turns → RoundEnd → Income → … → GameOver`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Seats are being taken.
    #[default]
    Lobby,
    /// Cards exist; decks and hands are being dealt by the designated client.
    Setup,
    Draft(DraftStage),
    /// Players collect and settle their round income.
    Income,
    /// Players act one at a time until everyone has passed.
    Turns,
    /// Waiting for next-round votes and the designated client's refills.
    RoundEnd,
    GameOver { winner: Option<PlayerId> },
}

impl Phase {
    pub fn is_game_over(self) -> bool {
        matches!(self, Phase::GameOver { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DraftStage {
    /// Every player keeps one of their offered mages, in any order.
    Mages,
    /// Magic items are picked one seat at a time in reverse seat order.
    MagicItems { picking: PlayerId },
}

/// Turn and round bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    /// 1-based once the first round starts.
    pub round: u32,
    /// Turns taken in the current round.
    pub turn: u32,
    pub current: PlayerId,
    pub first_player: PlayerId,
    /// Claimed by the first player to pass or by an ability.
    pub next_first_player: Option<PlayerId>,
    /// The current player has acted; the turn moves on once nothing blocks it.
    pub awaiting_advance: bool,
}

/// An attack waiting for the victim's response.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingAttack {
    pub ability: AbilityId,
    pub attacker: PlayerId,
    pub victim: PlayerId,
    pub loss: EssenceSelection,
}

/// Which designated-client setup broadcasts have been applied.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetupProgress {
    pub decks_shuffled: bool,
    pub dealt: Vec<PlayerId>,
    pub mages_offered: bool,
}
