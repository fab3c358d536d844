//! One client's view of a replicated game.
//!
//! [`ClientSession`] owns the [`GameState`], the channel to the relay and the
//! local randomness. [`ClientSession::poll`] is the simulation step: it
//! drains received lines, applies them in relay order and then performs
//! whatever this client owes the table (designated broadcasts, automatic
//! votes, mandatory selectors, round checksums).
//!
//! Local requests (`play_card`, `activate_ability`, ...) never touch the
//! replicated state directly. They either open a selector or send a fully
//! resolved message, which is applied when the relay echoes it back.
mod duties;
mod requests;

use std::collections::BTreeMap;
use std::sync::Arc;

use arcana_core::action::Disconnect;
use arcana_core::input::Selector;
use arcana_core::{CardCatalog, GameConfig, GameEvent, GameState, Message, PlayerId};
use arcana_protocol::{Body, Envelope, Notice};
use tracing::{debug, error, info, warn};

use crate::channel::ActionChannel;
use crate::config::SessionConfig;
use crate::error::{Result, TransportError};
use crate::metrics::SessionMetrics;
use crate::random::RandomSource;
use crate::stats::{NullRecorder, StatsRecorder};
use crate::transport::Transport;
use crate::utils::hash::state_digest;

/// What one [`ClientSession::poll`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollReport {
    pub applied: usize,
    pub rejected: usize,
    pub events: Vec<GameEvent>,
}

impl PollReport {
    pub fn is_idle(&self) -> bool {
        self.applied == 0 && self.rejected == 0
    }
}

pub struct ClientSession<T> {
    config: SessionConfig,
    state: GameState,
    channel: ActionChannel<T>,
    random: RandomSource,
    recorder: Box<dyn StatsRecorder>,
    metrics: Arc<SessionMetrics>,
    /// Our own digest per round.
    digests: BTreeMap<u32, String>,
}

impl<T: Transport> ClientSession<T> {
    pub fn new(
        config: SessionConfig,
        game: GameConfig,
        catalog: Arc<CardCatalog>,
        transport: T,
    ) -> Self {
        let random = RandomSource::new(config.seed);
        Self {
            config,
            state: GameState::new(game, catalog),
            channel: ActionChannel::new(transport),
            random,
            recorder: Box::new(NullRecorder),
            metrics: Arc::new(SessionMetrics::new()),
            digests: BTreeMap::new(),
        }
    }

    pub fn with_recorder(mut self, recorder: impl StatsRecorder + 'static) -> Self {
        self.recorder = Box::new(recorder);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn client_id(&self) -> Option<u32> {
        self.channel.client_id()
    }

    pub fn local_player(&self) -> Option<PlayerId> {
        self.state.local_player()
    }

    /// Own messages the relay has not echoed yet.
    pub fn in_flight(&self) -> usize {
        self.channel.in_flight()
    }

    /// Our digest for `round`, if checksums are enabled and the round began.
    pub fn digest(&self, round: u32) -> Option<&str> {
        self.digests.get(&round).map(String::as_str)
    }

    /// The selector the player should answer now.
    pub fn current_selector(&mut self) -> Option<&Selector> {
        self.state.local.selectors.show()
    }

    /// Applies everything received so far, then performs pending duties.
    ///
    /// Duties wait until every own message has come back, so they are always
    /// derived from a state that already reflects what this client sent.
    pub fn poll(&mut self) -> Result<PollReport> {
        match self.channel.receive() {
            Ok(_) => {}
            Err(TransportError::Closed) if self.channel.has_pending() => {}
            Err(err) => return Err(err.into()),
        }

        let mut report = PollReport::default();
        while let Some(envelope) = self.channel.next_envelope(&self.state.registry) {
            self.handle(envelope, &mut report)?;
        }
        if self.channel.in_flight() == 0 {
            self.perform_duties()?;
        }
        Ok(report)
    }

    fn handle(&mut self, envelope: Envelope, report: &mut PollReport) -> Result<()> {
        let sender = envelope.client_id;
        let message = match envelope.body {
            Body::Action(message) => message,
            Body::Notice(Notice::Left) => match self.departed(sender) {
                Some(message) => message,
                None => return Ok(()),
            },
            Body::Notice(Notice::Welcome) => return Ok(()),
        };

        let Some(outcome) = self.state.apply_action(&message, sender) else {
            self.metrics.record_rejected();
            report.rejected += 1;
            return Ok(());
        };
        self.metrics.record_applied();
        report.applied += 1;
        for event in outcome.events {
            self.observe(&event)?;
            report.events.push(event);
        }
        Ok(())
    }

    /// A closed connection counts as that player's own `disconnect`.
    ///
    /// Every client sees the `left` notice at the same position in the
    /// stream, so applying it locally keeps the copies in step.
    fn departed(&self, client_id: u32) -> Option<Message> {
        let player = self.state.player_by_client(client_id)?;
        if self.state.player(player)?.disconnected {
            return None;
        }
        info!(target: "arcana::session", client_id, %player, "connection closed");
        Some(Disconnect { player }.into())
    }

    fn observe(&mut self, event: &GameEvent) -> Result<()> {
        match event {
            GameEvent::PlayerSeated { player, client_id } => {
                if Some(*client_id) == self.channel.client_id() {
                    info!(target: "arcana::session", %player, "seated");
                    self.state.set_local_player(*player);
                }
            }
            GameEvent::RoundStarted { round } => {
                if self.config.checksum {
                    self.exchange_checksum(*round)?;
                }
            }
            GameEvent::ChecksumReceived {
                player,
                round,
                digest,
            } => self.compare_checksum(*player, *round, digest),
            GameEvent::TurnAdvanced { .. } => {
                self.recorder.record_turn(&self.state.snapshot());
            }
            GameEvent::RoundEnded { .. } => {
                self.recorder.record_round(&self.state.snapshot());
            }
            GameEvent::LocalInputAborted { player } => {
                info!(target: "arcana::session", %player, "open input dropped");
            }
            _ => {}
        }
        Ok(())
    }

    fn exchange_checksum(&mut self, round: u32) -> Result<()> {
        let digest = match state_digest(&self.state.snapshot()) {
            Ok(digest) => digest,
            Err(err) => {
                warn!(target: "arcana::session", round, "state digest failed: {err}");
                return Ok(());
            }
        };
        debug!(target: "arcana::session", round, %digest, "round digest");
        self.digests.insert(round, digest.clone());

        let Some(player) = self.local_player() else {
            return Ok(());
        };
        if self.state.player(player).is_some_and(|seat| seat.is_connected()) {
            self.send(
                &arcana_core::action::Checksum {
                    player,
                    round,
                    digest,
                }
                .into(),
            )?;
        }
        Ok(())
    }

    fn compare_checksum(&self, player: PlayerId, round: u32, digest: &str) {
        if Some(player) == self.local_player() {
            return;
        }
        match self.digests.get(&round) {
            Some(ours) if ours == digest => {
                debug!(target: "arcana::session", %player, round, "checksum agrees");
            }
            Some(ours) => {
                self.metrics.record_mismatch();
                error!(
                    target: "arcana::session",
                    %player,
                    round,
                    ours = %ours,
                    theirs = digest,
                    "replicated state diverged"
                );
            }
            None => {
                debug!(target: "arcana::session", %player, round, "no local digest to compare");
            }
        }
    }

    pub(crate) fn send(&mut self, message: &Message) -> Result<()> {
        self.channel.send(message, &self.state.registry)?;
        self.metrics.record_sent();
        Ok(())
    }
}
