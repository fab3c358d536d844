//! This client's pending decisions.
//!
//! Everything here is local: it is never replicated and never hashed. Local
//! flows end in one [`Message`] to broadcast, or in nothing at all when the
//! player cancels.
mod selector;

pub use selector::{
    Requester, SelectionResult, Selector, SelectorId, SelectorKind, SelectorQueue,
};

use tracing::{debug, warn};

use crate::ability::{AbilityError, AbilityStatus, Activation};
use crate::action::{
    ActionTransition, AttackReply, AttackResponse, CardAction, IncomeDone, Message, PlayError,
    PlayerAction, UserInputOverwrite, discard_gain_allowed, settles_income,
};
use crate::engine::GameEvent;
use crate::error::{ErrorSeverity, GameError};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::{GameState, Phase};

/// Local input state of one client.
#[derive(Clone, Debug, Default)]
pub struct LocalInput {
    /// Seat this client speaks for, once seated.
    pub player: Option<PlayerId>,
    /// At most one ability is collecting input at a time.
    pub active_ability: Option<AbilityId>,
    /// Card play, buy or discard waiting for its selector.
    pub pending_card: Option<Requester>,
    pub selectors: SelectorQueue,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("this client has no seat")]
    NoLocalPlayer,

    #[error("no selector is visible")]
    NoSelector,

    #[error("answer does not fit the {expected} selector")]
    WrongAnswer { expected: String },

    #[error("card {0} was not offered")]
    NotACandidate(TappableId),

    #[error("essences {0} do not settle the request")]
    InvalidEssences(String),

    #[error("another local action is waiting for input")]
    InputPending,

    #[error(transparent)]
    Play(#[from] PlayError),

    #[error(transparent)]
    Ability(#[from] AbilityError),
}

impl GameError for InputError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            InputError::Play(inner) => inner.severity(),
            InputError::Ability(inner) => inner.severity(),
            InputError::WrongAnswer { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            InputError::Play(inner) => inner.error_code(),
            InputError::Ability(inner) => inner.error_code(),
            InputError::NoLocalPlayer => "INPUT_NO_LOCAL_PLAYER",
            InputError::NoSelector => "INPUT_NO_SELECTOR",
            InputError::WrongAnswer { .. } => "INPUT_WRONG_ANSWER",
            InputError::NotACandidate(_) => "INPUT_NOT_A_CANDIDATE",
            InputError::InvalidEssences(_) => "INPUT_INVALID_ESSENCES",
            InputError::InputPending => "INPUT_PENDING",
        }
    }
}

/// How an answer to a selector was handled.
enum Answer {
    Done(Option<Message>),
    /// The answer was illegal; the selector stays visible.
    Retry(InputError),
    /// The flow behind the selector is gone.
    Dropped(InputError),
}

impl From<Activation> for Answer {
    fn from(activation: Activation) -> Self {
        match activation {
            Activation::Resolved(message) => Answer::Done(Some(message)),
            Activation::Pending => Answer::Done(None),
            Activation::Rejected(err) => Answer::Dropped(err.into()),
        }
    }
}

impl GameState {
    pub fn set_local_player(&mut self, player: PlayerId) {
        self.local.player = Some(player);
    }

    pub fn local_player(&self) -> Option<PlayerId> {
        self.local.player
    }

    /// The local player, if they may start a turn action now.
    fn ready_for_turn_input(&self) -> Result<PlayerId, InputError> {
        let player = self.local.player.ok_or(InputError::NoLocalPlayer)?;
        if self.local.active_ability.is_some() || self.local.pending_card.is_some() {
            return Err(InputError::InputPending);
        }
        crate::action::check_turn(self, player)?;
        Ok(player)
    }

    fn checked(&self, action: UserInputOverwrite) -> Result<Message, InputError> {
        action.pre_validate(self)?;
        Ok(action.into())
    }

    // ===== turn actions =====

    /// Plays an artifact from hand. Returns the message at once when the
    /// cost needs no choice.
    pub fn begin_card_play(&mut self, card: TappableId) -> Result<Option<Message>, InputError> {
        let player = self.ready_for_turn_input()?;
        let seat = self
            .player(player)
            .ok_or(PlayError::UnknownPlayer(player))?;
        if !seat.hand.contains(&card) {
            return Err(PlayError::NotInHand(card).into());
        }
        let available = seat.essences;
        let cost = self
            .reduced_cost(player, card)
            .ok_or(PlayError::NotInHand(card))?;
        self.begin_payment(player, card, cost, available, Requester::CardPlay(card))
    }

    /// Buys a monument, power place or scroll from the supply.
    pub fn begin_buy(&mut self, card: TappableId) -> Result<Option<Message>, InputError> {
        let player = self.ready_for_turn_input()?;
        let available = self
            .player(player)
            .map(|seat| seat.essences)
            .ok_or(PlayError::UnknownPlayer(player))?;
        let target = self.tappable(card).ok_or(PlayError::NotInSupply(card))?;
        if !target.kind.is_buyable() {
            return Err(PlayError::NotBuyable(card).into());
        }
        let cost = target.cost;
        self.begin_payment(player, card, cost, available, Requester::Buy(card))
    }

    fn begin_payment(
        &mut self,
        player: PlayerId,
        card: TappableId,
        cost: crate::essence::EssenceSelection,
        available: crate::essence::EssenceSelection,
        requester: Requester,
    ) -> Result<Option<Message>, InputError> {
        if !cost.is_payable(&available) {
            return Err(PlayError::CannotAfford.into());
        }
        if cost.is_determined() {
            let payment = cost.determined_part();
            return self
                .checked(Self::card_overwrite(player, card, requester, payment))
                .map(Some);
        }
        self.local.selectors.push(
            requester,
            SelectorKind::Cost {
                template: cost,
                available,
            },
        );
        self.local.pending_card = Some(requester);
        Ok(None)
    }

    fn card_overwrite(
        player: PlayerId,
        card: TappableId,
        requester: Requester,
        essences: crate::essence::EssenceSelection,
    ) -> UserInputOverwrite {
        let action = match requester {
            Requester::Buy(_) => CardAction::Buy { payment: essences },
            Requester::Discard(_) => CardAction::Discard { gain: essences },
            _ => CardAction::Play { payment: essences },
        };
        UserInputOverwrite::Card {
            player,
            card,
            action,
        }
    }

    /// Discards a card from hand; the gain is chosen through a selector.
    pub fn begin_discard(&mut self, card: TappableId) -> Result<(), InputError> {
        let player = self.ready_for_turn_input()?;
        if !self
            .player(player)
            .is_some_and(|seat| seat.hand.contains(&card))
        {
            return Err(PlayError::NotInHand(card).into());
        }
        let requester = Requester::Discard(card);
        self.local
            .selectors
            .push(requester, SelectorKind::DiscardGain);
        self.local.pending_card = Some(requester);
        Ok(())
    }

    pub fn pass_turn(&mut self, magic_item: Option<TappableId>) -> Result<Message, InputError> {
        let player = self.ready_for_turn_input()?;
        self.checked(UserInputOverwrite::Player {
            player,
            action: PlayerAction::Pass { magic_item },
        })
    }

    // ===== mandatory decisions =====

    /// Starts the local income decision. Returns the message at once when no
    /// income source needs a choice.
    pub fn begin_local_income(&mut self) -> Option<Message> {
        let player = self.local.player?;
        if self.phase != Phase::Income {
            return None;
        }
        let seat = self.player(player)?;
        if seat.income_resolved
            || seat.disconnected
            || self.local.selectors.contains(Requester::Income)
        {
            return None;
        }
        let sources: Vec<_> = self
            .income_sources(player)
            .into_iter()
            .filter(|(_, collect)| !collect.is_determined())
            .collect();
        if sources.is_empty() {
            return Some(
                IncomeDone {
                    player,
                    choices: Vec::new(),
                }
                .into(),
            );
        }
        let id = self
            .local
            .selectors
            .push(Requester::Income, SelectorKind::Income { sources });
        self.local.selectors.disable_cancel(id);
        None
    }

    /// Starts the local response to the oldest attack on the local player.
    /// Without a protector the attack is suffered at once.
    pub fn begin_attack_response(&mut self) -> Option<Message> {
        let player = self.local.player?;
        let attack = self
            .pending_attacks
            .iter()
            .find(|attack| {
                attack.victim == player
                    && !self.local.selectors.contains(Requester::AttackResponse {
                        ability: attack.ability,
                    })
            })?
            .clone();
        let protectors = self.protectors(player);
        if protectors.is_empty() {
            return Some(
                AttackResponse {
                    ability: attack.ability,
                    victim: player,
                    reply: AttackReply::Suffer,
                }
                .into(),
            );
        }
        let id = self.local.selectors.push(
            Requester::AttackResponse {
                ability: attack.ability,
            },
            SelectorKind::AttackResponse {
                loss: attack.loss,
                protectors,
            },
        );
        self.local.selectors.disable_cancel(id);
        None
    }

    // ===== selector answers =====

    /// Answers the visible selector. Returns the message to broadcast once a
    /// flow is complete.
    pub fn resolve_selection(
        &mut self,
        result: SelectionResult,
    ) -> Result<Option<Message>, InputError> {
        let selector = self
            .local
            .selectors
            .take()
            .ok_or(InputError::NoSelector)?;
        if !result.fits(&selector.kind) {
            let expected = selector.kind.as_ref().to_string();
            self.local.selectors.restore(selector);
            return Err(InputError::WrongAnswer { expected });
        }
        let requester = selector.requester;
        match self.answer(&selector, result) {
            Answer::Done(message) => Ok(message),
            Answer::Retry(err) => {
                debug!(target: "arcana::input", id = %selector.id, "answer rejected: {err}");
                self.local.selectors.restore(selector);
                Err(err)
            }
            Answer::Dropped(err) => {
                self.drop_flow(requester);
                Err(err)
            }
        }
    }

    fn answer(&mut self, selector: &Selector, result: SelectionResult) -> Answer {
        let Some(player) = self.local.player else {
            return Answer::Dropped(InputError::NoLocalPlayer);
        };
        match (selector.requester, &selector.kind, result) {
            (Requester::Ability(id), SelectorKind::Target { candidates }, SelectionResult::Target(target)) => {
                if !candidates.contains(&target) {
                    return Answer::Retry(InputError::NotACandidate(target));
                }
                match self.ability_status(id).with_target(target) {
                    Ok(progress) => self.drive_activation(id, progress).into(),
                    Err(err) => Answer::Dropped(err.into()),
                }
            }
            (
                Requester::Ability(id),
                SelectorKind::Cost {
                    template,
                    available,
                },
                SelectionResult::Essences(cost),
            ) => {
                if !cost.is_resolution_of(template) || !cost.is_payable(available) {
                    return Answer::Retry(InputError::InvalidEssences(cost.to_string()));
                }
                match self.ability_status(id).with_cost(cost) {
                    Ok(progress) => self.drive_activation(id, progress).into(),
                    Err(err) => Answer::Dropped(err.into()),
                }
            }
            (Requester::Ability(id), SelectorKind::Output { template }, SelectionResult::Essences(output)) => {
                if !output.is_resolution_of(template) {
                    return Answer::Retry(InputError::InvalidEssences(output.to_string()));
                }
                match self.ability_status(id).with_output(output) {
                    Ok(action) => self.finish_activation(id, action).into(),
                    Err(err) => Answer::Dropped(err.into()),
                }
            }
            (
                requester @ (Requester::CardPlay(card) | Requester::Buy(card)),
                SelectorKind::Cost {
                    template,
                    available,
                },
                SelectionResult::Essences(payment),
            ) => {
                if !payment.is_resolution_of(template) || !payment.is_payable(available) {
                    return Answer::Retry(InputError::InvalidEssences(payment.to_string()));
                }
                self.finish_card(player, card, requester, payment.determined_part())
            }
            (requester @ Requester::Discard(card), SelectorKind::DiscardGain, SelectionResult::Essences(gain)) => {
                if !discard_gain_allowed(&gain) {
                    return Answer::Retry(InputError::InvalidEssences(gain.to_string()));
                }
                self.finish_card(player, card, requester, gain.determined_part())
            }
            (Requester::Income, SelectorKind::Income { sources }, SelectionResult::Income(choices)) => {
                if !settles_income(&sources, &choices) {
                    return Answer::Retry(InputError::InvalidEssences(format!("{choices:?}")));
                }
                Answer::Done(Some(IncomeDone { player, choices }.into()))
            }
            (
                Requester::AttackResponse { ability },
                SelectorKind::AttackResponse { protectors, .. },
                SelectionResult::Protect(choice),
            ) => {
                if let Some(card) = choice
                    && !protectors.contains(&card)
                {
                    return Answer::Retry(InputError::NotACandidate(card));
                }
                let reply = choice.map_or(AttackReply::Suffer, AttackReply::Protect);
                Answer::Done(Some(
                    AttackResponse {
                        ability,
                        victim: player,
                        reply,
                    }
                    .into(),
                ))
            }
            _ => Answer::Dropped(InputError::WrongAnswer {
                expected: selector.kind.as_ref().to_string(),
            }),
        }
    }

    fn finish_card(
        &mut self,
        player: PlayerId,
        card: TappableId,
        requester: Requester,
        essences: crate::essence::EssenceSelection,
    ) -> Answer {
        self.local.pending_card = None;
        match self.checked(Self::card_overwrite(player, card, requester, essences)) {
            Ok(message) => Answer::Done(Some(message)),
            Err(err) => Answer::Dropped(err),
        }
    }

    fn ability_status(&self, id: AbilityId) -> AbilityStatus {
        self.ability(id)
            .map_or(AbilityStatus::Idle, |ability| ability.status)
    }

    fn drop_flow(&mut self, requester: Requester) {
        match requester {
            Requester::Ability(id) => self.reset_activation(id),
            Requester::CardPlay(_) | Requester::Buy(_) | Requester::Discard(_) => {
                self.local.pending_card = None;
            }
            Requester::Income | Requester::AttackResponse { .. } => {}
        }
    }

    /// Cancels the visible selector and the flow behind it. Mandatory
    /// selectors cannot be canceled. Nothing is broadcast either way.
    pub fn cancel_selection(&mut self) -> bool {
        let Some(selector) = self.local.selectors.cancel() else {
            return false;
        };
        debug!(
            target: "arcana::input",
            id = %selector.id,
            requester = ?selector.requester,
            "selector canceled"
        );
        self.drop_flow(selector.requester);
        true
    }

    // ===== aborts =====

    /// Drops unfinished turn input. Called when the current player changes.
    pub fn abort_turn_input(&mut self) -> bool {
        let active = self.local.active_ability.take();
        let card = self.local.pending_card.take();
        if let Some(id) = active
            && let Some(ability) = self.ability_mut(id)
        {
            ability.status = AbilityStatus::Idle;
        }
        let dropped = self.local.selectors.discard_where(Requester::is_turn_input);
        if active.is_none() && card.is_none() && dropped == 0 {
            return false;
        }
        warn!(
            target: "arcana::input",
            ability = ?active,
            card = ?card,
            dropped,
            "turn input aborted"
        );
        if let Some(player) = self.local.player {
            self.emit(GameEvent::LocalInputAborted { player });
        }
        true
    }

    /// Drops every local decision, mandatory ones included.
    pub(crate) fn clear_local_input(&mut self) {
        self.abort_turn_input();
        self.local.selectors.discard_where(|_| true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::{EssenceKind, EssenceSelection};
    use crate::testing::TestTable;

    #[test]
    fn discard_goes_through_a_selector() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        table.state.begin_discard(card).unwrap();
        assert_eq!(
            table.state.local.pending_card,
            Some(Requester::Discard(card))
        );

        let wrong = table
            .state
            .resolve_selection(SelectionResult::Essences(EssenceSelection::of(
                EssenceKind::Gold,
                2,
            )))
            .unwrap_err();
        assert!(matches!(wrong, InputError::InvalidEssences(_)));
        assert!(table.state.local.selectors.current().is_some());

        let message = table
            .state
            .resolve_selection(SelectionResult::Essences(EssenceSelection::of(
                EssenceKind::Gold,
                1,
            )))
            .unwrap();
        assert!(matches!(message, Some(Message::GameAction(_))));
        assert!(table.state.local.pending_card.is_none());
    }

    #[test]
    fn turn_input_needs_the_turn() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(1));
        assert!(matches!(
            table.state.pass_turn(None),
            Err(InputError::Play(PlayError::NotCurrent { .. }))
        ));
    }

    #[test]
    fn leaving_clears_open_input() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(0));
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        table.state.begin_discard(card).unwrap();
        let outcome = table
            .apply_from(10, crate::action::Disconnect {
                player: PlayerId(0),
            })
            .unwrap();
        assert!(table.state.local.pending_card.is_none());
        assert!(table.state.local.selectors.is_empty());
        assert!(outcome.events.iter().any(|event| matches!(
            event,
            GameEvent::PlayerDisconnected { .. }
        )));
    }

    #[test]
    fn attack_without_protector_is_suffered_directly() {
        let mut table = TestTable::three_players();
        table.start();
        table.state.set_local_player(PlayerId(1));
        table.state.pending_attacks.push_back(crate::state::PendingAttack {
            ability: AbilityId(0),
            attacker: PlayerId(0),
            victim: PlayerId(1),
            loss: EssenceSelection::of(EssenceKind::Life, 1),
        });
        let message = table.state.begin_attack_response();
        assert!(matches!(
            message,
            Some(Message::Attack(AttackResponse {
                reply: AttackReply::Suffer,
                ..
            }))
        ));
    }

    #[test]
    fn mandatory_income_selector_survives_cancel() {
        let mut table = TestTable::three_players();
        table.start_until_income();
        table.state.set_local_player(PlayerId(0));
        assert!(table.state.begin_local_income().is_none());
        assert!(!table.state.cancel_selection());
        assert!(table.state.local.selectors.contains(Requester::Income));
    }
}
