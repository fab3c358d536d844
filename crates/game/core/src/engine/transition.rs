//! Action dispatch through the transition pipeline.

use crate::ability::EffectSummary;
use crate::action::{ActionTransition, Message, SenderRule};
use crate::state::GameState;

use super::errors::{ApplyError, TransitionPhase, TransitionPhaseError};

/// Runs one transition: sender check, then
/// `pre_validate` → `apply` → `post_validate`.
#[inline]
fn drive_transition<T>(
    transition: &T,
    state: &mut GameState,
) -> Result<T::Result, TransitionPhaseError<T::Error>>
where
    T: ActionTransition,
{
    transition
        .pre_validate(state)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    let result = transition
        .apply(state)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(state)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))?;

    Ok(result)
}

/// Returns true if `client_id` satisfies `rule` in the current state.
pub(super) fn sender_allowed(state: &GameState, rule: SenderRule, client_id: u32) -> bool {
    match rule {
        SenderRule::Client(expected) => expected == client_id,
        SenderRule::Designated => state.designated_client() == Some(client_id),
        SenderRule::Seat(player) => state
            .player(player)
            .is_some_and(|seat| seat.client_id == client_id),
    }
}

fn check_sender<T: ActionTransition>(
    transition: &T,
    message: &Message,
    state: &GameState,
    client_id: u32,
) -> Result<(), ApplyError> {
    let rule = transition.sender(state);
    if sender_allowed(state, rule, client_id) {
        Ok(())
    } else {
        Err(ApplyError::WrongSender {
            key: message.key(),
            client_id,
            rule,
        })
    }
}

/// Routes a message to its transition. Returns the effect summary for
/// ability replays.
pub(super) fn dispatch(
    message: &Message,
    state: &mut GameState,
    client_id: u32,
) -> Result<Option<EffectSummary>, ApplyError> {
    macro_rules! run {
        ($transition:expr, $wrap:path) => {{
            check_sender($transition, message, state, client_id)?;
            drive_transition($transition, state).map_err($wrap)
        }};
    }

    match message {
        Message::AddPlayer(action) => run!(action, ApplyError::Lobby).map(|_| None),
        Message::GameStart(action) => run!(action, ApplyError::Lobby).map(|_| None),
        Message::SetName(action) => run!(action, ApplyError::Lobby).map(|_| None),
        Message::Disconnect(action) => run!(action, ApplyError::Lobby).map(|_| None),
        Message::Shuffle(action) => run!(action, ApplyError::Setup).map(|_| None),
        Message::DealCards(action) => run!(action, ApplyError::Setup).map(|_| None),
        Message::DraftAction(action) => run!(action, ApplyError::Setup).map(|_| None),
        Message::IncomeDone(action) => run!(action, ApplyError::Round).map(|_| None),
        Message::VoteNextRound(action) => run!(action, ApplyError::Round).map(|_| None),
        Message::NextRound(action) => run!(action, ApplyError::Round).map(|_| None),
        Message::Checksum(action) => run!(action, ApplyError::Round).map(|_| None),
        Message::GameAction(action) => run!(action, ApplyError::Play),
        Message::Attack(action) => run!(action, ApplyError::Attack).map(|_| None),
        Message::Control(action) => run!(action, ApplyError::Control).map(|_| None),
    }
}
