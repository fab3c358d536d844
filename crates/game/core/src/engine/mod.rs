//! Action application and turn scheduling.
//!
//! The [`GameEngine`] is the only writer of replicated state. Every client
//! feeds it the same ordered message stream, so every client reaches the same
//! state. After each action the engine settles the turn loop: a spent turn
//! moves on once no attack response is outstanding.

mod errors;
mod transition;
pub mod turns;

pub use errors::{ApplyError, TransitionPhase, TransitionPhaseError};

use tracing::{debug, error, info, warn};

use crate::ability::EffectSummary;
use crate::action::{ActionKey, Message};
use crate::error::{ErrorSeverity, GameError};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::GameState;

/// Something observable that happened while applying an action.
///
/// Events are not replicated; every client derives the same list from the
/// same message.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameEvent {
    PlayerSeated { player: PlayerId, client_id: u32 },
    GameStarted,
    DeckRefilled { player: PlayerId },
    DraftStarted,
    DraftFinished,
    IncomeStarted { round: u32 },
    TurnsStarted { round: u32 },
    TurnAdvanced { current: PlayerId },
    CardPlayed { player: PlayerId, card: TappableId },
    CardBought { player: PlayerId, card: TappableId },
    CardDiscarded { player: PlayerId, card: TappableId },
    PlayerPassed { player: PlayerId },
    AbilityUsed { ability: AbilityId, owner: PlayerId },
    AttackOpened { ability: AbilityId, victim: PlayerId },
    AttackResolved {
        ability: AbilityId,
        victim: PlayerId,
        protected_by: Option<TappableId>,
    },
    RoundEnded { round: u32 },
    RoundVotesComplete { round: u32 },
    RoundStarted { round: u32 },
    GameOver { winner: Option<PlayerId> },
    PlayerDisconnected { player: PlayerId },
    ChecksumReceived {
        player: PlayerId,
        round: u32,
        digest: String,
    },
    /// This client's unfinished turn input was dropped.
    LocalInputAborted { player: PlayerId },
}

/// Result of applying one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub key: ActionKey,
    pub events: Vec<GameEvent>,
    /// Set for ability replays.
    pub effect: Option<EffectSummary>,
}

/// Applies replicated actions to one client's [`GameState`].
pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    /// Applies `message` as sent by relay connection `sender`.
    ///
    /// A rejected message leaves the state as it was before `pre_validate`.
    pub fn apply(&mut self, message: &Message, sender: u32) -> Result<ApplyOutcome, ApplyError> {
        let key = message.key();
        if self.state.phase.is_game_over() && !Self::allowed_after_game_over(key) {
            return Err(ApplyError::GameOver(key));
        }

        match transition::dispatch(message, self.state, sender) {
            Ok(effect) => {
                turns::settle(self.state);
                let events = self.state.take_events();
                debug!(
                    target: "arcana::engine",
                    %key,
                    sender,
                    events = events.len(),
                    "action applied"
                );
                Ok(ApplyOutcome {
                    key,
                    events,
                    effect,
                })
            }
            Err(err) => {
                self.state.take_events();
                Err(err)
            }
        }
    }

    fn allowed_after_game_over(key: ActionKey) -> bool {
        matches!(
            key,
            ActionKey::Checksum | ActionKey::SetName | ActionKey::Disconnect
        )
    }
}

impl GameState {
    /// Applies `message` and logs a rejection instead of returning it.
    ///
    /// Rejected actions are dropped; the stream continues with the next one.
    pub fn apply_action(&mut self, message: &Message, sender: u32) -> Option<ApplyOutcome> {
        match GameEngine::new(self).apply(message, sender) {
            Ok(outcome) => {
                for event in &outcome.events {
                    if let GameEvent::GameOver { winner } = event {
                        info!(target: "arcana::engine", ?winner, "game over");
                    }
                }
                Some(outcome)
            }
            Err(err) => {
                let severity = err.severity();
                match severity {
                    ErrorSeverity::Recoverable => debug!(
                        target: "arcana::engine",
                        code = err.error_code(),
                        sender,
                        "action dropped: {err}"
                    ),
                    ErrorSeverity::Validation => warn!(
                        target: "arcana::engine",
                        code = err.error_code(),
                        sender,
                        "action rejected: {err}"
                    ),
                    ErrorSeverity::Internal | ErrorSeverity::Fatal => error!(
                        target: "arcana::engine",
                        code = err.error_code(),
                        severity = severity.as_str(),
                        sender,
                        "action failed: {err}"
                    ),
                }
                None
            }
        }
    }
}
