//! Messages a client sends without being asked.
use arcana_core::action::{
    ActionTransition, DealCards, GameStart, Shuffle, ShuffleKind, VoteNextRound,
};
use arcana_core::engine::turns;
use arcana_core::{GameState, Message, Phase, TappableKind};
use tracing::debug;

use super::ClientSession;
use crate::error::Result;
use crate::random::RandomSource;
use crate::transport::Transport;

impl<T: Transport> ClientSession<T> {
    pub(super) fn perform_duties(&mut self) -> Result<()> {
        let mut outgoing = Vec::new();
        if self.is_designated() {
            outgoing.extend(designated_messages(
                &self.state,
                &mut self.random,
                self.config.autostart_players,
            ));
        }
        outgoing.extend(self.local_messages());
        for message in &outgoing {
            debug!(target: "arcana::session", key = %message.key(), "duty");
            self.send(message)?;
        }
        Ok(())
    }

    /// True when this client performs the table's shared draws.
    pub fn is_designated(&self) -> bool {
        self.channel
            .client_id()
            .is_some_and(|id| self.state.designated_client() == Some(id))
    }

    /// Income, attack responses and round votes of the local player.
    fn local_messages(&mut self) -> Vec<Message> {
        let Some(me) = self.state.local_player() else {
            return Vec::new();
        };
        let Some(seat) = self.state.player(me) else {
            return Vec::new();
        };
        if seat.disconnected {
            return Vec::new();
        }
        let voted = seat.voted_next_round;

        let mut outgoing = Vec::new();
        match self.state.phase {
            Phase::Income => outgoing.extend(self.state.begin_local_income()),
            Phase::RoundEnd if !voted => outgoing.push(VoteNextRound { player: me }.into()),
            _ => {}
        }
        outgoing.extend(self.state.begin_attack_response());
        outgoing
    }
}

/// Setup draws and round transitions owed by the designated client.
fn designated_messages(
    state: &GameState,
    random: &mut RandomSource,
    autostart: Option<usize>,
) -> Vec<Message> {
    match state.phase {
        Phase::Lobby => match autostart {
            Some(needed) if state.player_count() >= needed && GameStart.pre_validate(state).is_ok() => {
                vec![GameStart.into()]
            }
            _ => Vec::new(),
        },
        Phase::Setup if !state.setup.decks_shuffled => {
            let artifacts = cards_of(state, TappableKind::Artifact);
            vec![
                Shuffle {
                    kind: ShuffleKind::Initial,
                    player: None,
                    order: random.shuffled(artifacts),
                }
                .into(),
            ]
        }
        Phase::Setup => {
            let deals: Vec<Message> = state
                .players
                .iter()
                .filter(|seat| !state.setup.dealt.contains(&seat.id))
                .map(|seat| {
                    let count = state.config.starting_hand.min(seat.deck.len());
                    DealCards {
                        player: seat.id,
                        cards: seat.deck[..count].to_vec(),
                    }
                    .into()
                })
                .collect();
            if !deals.is_empty() || state.setup.mages_offered {
                return deals;
            }
            let mages = cards_of(state, TappableKind::Mage);
            vec![
                Shuffle {
                    kind: ShuffleKind::Draft,
                    player: None,
                    order: random.shuffled(mages),
                }
                .into(),
            ]
        }
        Phase::RoundEnd => {
            let refills: Vec<Message> = state
                .players
                .iter()
                .filter(|seat| seat.deck.is_empty() && !seat.discard.is_empty())
                .map(|seat| {
                    Shuffle {
                        kind: ShuffleKind::Refill,
                        player: Some(seat.id),
                        order: random.shuffled(seat.discard.clone()),
                    }
                    .into()
                })
                .collect();
            if !refills.is_empty() || turns::votes_missing(state) > 0 {
                return refills;
            }
            vec![
                arcana_core::action::NextRound {
                    round: state.turn.round + 1,
                }
                .into(),
            ]
        }
        _ => Vec::new(),
    }
}

fn cards_of(state: &GameState, kind: TappableKind) -> Vec<arcana_core::TappableId> {
    state
        .tappables
        .iter()
        .filter(|card| card.kind == kind)
        .map(|card| card.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::testing::{TestTable, fixture_catalog};

    #[test]
    fn setup_draws_follow_the_progress() {
        let mut table = TestTable::three_players();
        let mut random = RandomSource::new(Some(1));
        assert!(designated_messages(&table.state, &mut random, None).is_empty());
        assert_eq!(
            designated_messages(&table.state, &mut random, Some(3)),
            vec![Message::from(GameStart)]
        );

        let designated = table.state.designated_client().unwrap();
        table.apply_from(designated, GameStart).unwrap();
        let initial = designated_messages(&table.state, &mut random, None);
        assert!(matches!(
            initial.as_slice(),
            [Message::Shuffle(Shuffle { kind: ShuffleKind::Initial, .. })]
        ));

        table.apply_from(designated, initial[0].clone()).unwrap();
        let deals = designated_messages(&table.state, &mut random, None);
        assert_eq!(deals.len(), 3);
        for deal in deals {
            table.apply_from(designated, deal).unwrap();
        }
        let draft = designated_messages(&table.state, &mut random, None);
        assert!(matches!(
            draft.as_slice(),
            [Message::Shuffle(Shuffle { kind: ShuffleKind::Draft, .. })]
        ));
        table.apply_from(designated, draft[0].clone()).unwrap();
        assert!(matches!(table.state.phase, Phase::Draft(_)));
    }

    #[test]
    fn a_lone_seat_never_starts_the_game() {
        let mut table = TestTable::new(fixture_catalog());
        table.seat(10, "ana");
        let mut random = RandomSource::new(Some(1));
        assert!(designated_messages(&table.state, &mut random, Some(1)).is_empty());
        table.seat(11, "bo");
        assert_eq!(
            designated_messages(&table.state, &mut random, Some(1)),
            vec![Message::from(GameStart)]
        );
    }

    #[test]
    fn nothing_is_owed_during_turns() {
        let mut table = TestTable::three_players();
        table.start();
        let mut random = RandomSource::new(Some(1));
        assert!(designated_messages(&table.state, &mut random, Some(2)).is_empty());
    }
}
