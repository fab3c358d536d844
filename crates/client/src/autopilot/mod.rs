//! Automatic player for the local seat.
//!
//! The [`Autopilot`] is a facade over a [`TurnStrategy`]: the strategy only
//! decides what to do with a turn, everything else (joining, drafting,
//! answering selectors) is handled the same way for every strategy.
pub mod answers;
mod strategies;

use arcana_core::state::DraftStage;
use arcana_core::{GameState, Phase, PlayerId, TappableId, TappableKind};
use arcana_runtime::{ClientSession, Result, Transport};
use tracing::{debug, warn};

pub use strategies::{GreedyStrategy, PassiveStrategy};

/// What to do with a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnChoice {
    Play(TappableId),
    Buy(TappableId),
    Discard(TappableId),
    Pass,
}

pub trait TurnStrategy: Send {
    fn choose(&self, state: &GameState, player: PlayerId) -> TurnChoice;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;
}

pub struct Autopilot {
    strategy: Box<dyn TurnStrategy>,
    joined: bool,
}

impl Autopilot {
    pub fn new(strategy: Box<dyn TurnStrategy>) -> Self {
        Self {
            strategy,
            joined: false,
        }
    }

    pub fn with_default() -> Self {
        Self::new(Box::new(GreedyStrategy))
    }

    /// # Supported Names
    ///
    /// - `"greedy"`: [`GreedyStrategy`]
    /// - `"passive"`: [`PassiveStrategy`]
    pub fn with_strategy_name(name: &str) -> Option<Self> {
        let strategy: Box<dyn TurnStrategy> = match name.to_ascii_lowercase().as_str() {
            "greedy" => Box::new(GreedyStrategy),
            "passive" => Box::new(PassiveStrategy),
            _ => return None,
        };
        Some(Self::new(strategy))
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Takes at most one local decision. Returns true if one was taken.
    ///
    /// Nothing happens while own messages are still on their way back, so
    /// every decision sees the effects of the previous one.
    pub fn step<T: Transport>(&mut self, session: &mut ClientSession<T>) -> Result<bool> {
        if session.in_flight() > 0 {
            return Ok(false);
        }
        let Some(me) = session.local_player() else {
            if !self.joined && session.client_id().is_some() {
                session.join()?;
                self.joined = true;
                return Ok(true);
            }
            return Ok(false);
        };
        if session.current_selector().is_some() {
            return self.answer(session);
        }

        let phase = session.state().phase;
        match phase {
            Phase::Draft(DraftStage::Mages) => {
                let offer = session
                    .state()
                    .player(me)
                    .filter(|seat| seat.mage.is_none())
                    .and_then(|seat| seat.offered_mages.first().copied());
                match offer {
                    Some(mage) => session.draft(mage).map(|()| true),
                    None => Ok(false),
                }
            }
            Phase::Draft(DraftStage::MagicItems { picking }) if picking == me => {
                let item = session.state().supply_of(TappableKind::MagicItem).first().copied();
                match item {
                    Some(item) => session.draft(item).map(|()| true),
                    None => Ok(false),
                }
            }
            Phase::Turns if may_act(session.state(), me) => self.take_turn(session, me),
            _ => Ok(false),
        }
    }

    fn take_turn<T: Transport>(
        &mut self,
        session: &mut ClientSession<T>,
        me: PlayerId,
    ) -> Result<bool> {
        let choice = self.strategy.choose(session.state(), me);
        debug!(target: "arcana::autopilot", strategy = self.strategy.name(), ?choice, "turn");
        let outcome = match choice {
            TurnChoice::Play(card) => session.play_card(card).map(drop),
            TurnChoice::Buy(card) => session.buy(card).map(drop),
            TurnChoice::Discard(card) => session.discard_for_essence(card),
            TurnChoice::Pass => session.pass(None),
        };
        match outcome {
            Ok(()) => Ok(true),
            Err(err) if choice != TurnChoice::Pass => {
                warn!(target: "arcana::autopilot", ?choice, %err, "choice refused, passing");
                session.pass(None)?;
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    fn answer<T: Transport>(&mut self, session: &mut ClientSession<T>) -> Result<bool> {
        let Some(selector) = session.current_selector().cloned() else {
            return Ok(false);
        };
        let outcome = match answers::answer(&selector.kind) {
            Some(result) => session.resolve_selector(result).map(drop),
            None => Ok(()),
        };
        match outcome {
            Ok(()) if session.current_selector().is_some_and(|next| next.id == selector.id) => {
                // Still open: nothing could be picked.
                Ok(session.cancel_selector())
            }
            Ok(()) => Ok(true),
            Err(err) if selector.is_cancelable() => {
                warn!(target: "arcana::autopilot", kind = selector.kind.as_ref(), %err, "answer refused");
                Ok(session.cancel_selector())
            }
            Err(err) => Err(err),
        }
    }
}

/// True when the local player holds the turn and nothing is half-done.
fn may_act(state: &GameState, me: PlayerId) -> bool {
    state.turn.current == me
        && !state.turn.awaiting_advance
        && state.local.active_ability.is_none()
        && state.local.pending_card.is_none()
        && state.player(me).is_some_and(|seat| !seat.passed)
}
