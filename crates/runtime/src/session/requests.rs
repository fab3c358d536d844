//! Local player requests.
//!
//! Each request either opens a selector (returns `false`) or sends one fully
//! resolved message (returns `true`). Nothing here mutates replicated state.
use arcana_core::action::{
    AddPlayer, Control, ControlCommand, Disconnect, DraftAction, GameStart, SetName,
};
use arcana_core::{
    AbilityId, ActionTransition, Activation, Message, PlayerId, SelectionResult, TappableId,
};

use super::ClientSession;
use crate::error::{Result, SessionError};
use crate::transport::Transport;

impl<T: Transport> ClientSession<T> {
    /// Asks for a seat under the configured name.
    pub fn join(&mut self) -> Result<()> {
        let message = AddPlayer {
            client_id: self.client_id().unwrap_or(0),
            name: self.config.player_name.clone(),
        };
        self.send(&message.into())
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        let player = self.seat()?;
        self.send(
            &SetName {
                player,
                name: name.to_string(),
            }
            .into(),
        )
    }

    pub fn start_game(&mut self) -> Result<()> {
        GameStart.pre_validate(&self.state)?;
        self.send(&GameStart.into())
    }

    pub fn draft(&mut self, card: TappableId) -> Result<()> {
        let action = DraftAction {
            player: self.seat()?,
            card,
        };
        action.pre_validate(&self.state)?;
        self.send(&action.into())
    }

    /// Activates an ability of the local player.
    ///
    /// A second activation while one is collecting input is refused and
    /// changes nothing.
    pub fn activate_ability(&mut self, ability: AbilityId) -> Result<bool> {
        match self.state.activate_ability(ability, &mut self.random) {
            Activation::Resolved(message) => {
                self.send(&message)?;
                Ok(true)
            }
            Activation::Pending => Ok(false),
            Activation::Rejected(err) => Err(err.into()),
        }
    }

    pub fn play_card(&mut self, card: TappableId) -> Result<bool> {
        let message = self.state.begin_card_play(card)?;
        self.send_if_ready(message)
    }

    pub fn buy(&mut self, card: TappableId) -> Result<bool> {
        let message = self.state.begin_buy(card)?;
        self.send_if_ready(message)
    }

    /// Discards a hand card; the gain is always chosen through a selector.
    pub fn discard_for_essence(&mut self, card: TappableId) -> Result<()> {
        self.state.begin_discard(card)?;
        Ok(())
    }

    pub fn pass(&mut self, magic_item: Option<TappableId>) -> Result<()> {
        let message = self.state.pass_turn(magic_item)?;
        self.send(&message)
    }

    /// Answers the visible selector.
    pub fn resolve_selector(&mut self, result: SelectionResult) -> Result<bool> {
        let message = self.state.resolve_selection(result)?;
        self.send_if_ready(message)
    }

    /// Cancels the visible selector. Mandatory selectors stay open.
    pub fn cancel_selector(&mut self) -> bool {
        self.state.cancel_selection()
    }

    pub fn vote_disconnect(&mut self, target: PlayerId) -> Result<()> {
        let action = Control {
            voter: self.seat()?,
            command: ControlCommand::VoteDisconnect { target },
        };
        action.pre_validate(&self.state)?;
        self.send(&action.into())
    }

    /// Leaves the game for good.
    pub fn leave(&mut self) -> Result<()> {
        let player = self.seat()?;
        self.send(&Disconnect { player }.into())
    }

    fn seat(&self) -> Result<PlayerId> {
        self.local_player().ok_or(SessionError::NotSeated)
    }

    fn send_if_ready(&mut self, message: Option<Message>) -> Result<bool> {
        match message {
            Some(message) => {
                self.send(&message)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
