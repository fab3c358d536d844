//! Outgoing and incoming action lines for one client.
//!
//! Lines are decoded one at a time, right before they are applied, because
//! an earlier line in the same batch may register entities that a later line
//! refers to.
use std::collections::VecDeque;

use arcana_core::{EntityRegistry, GameError, Message};
use arcana_protocol::{Body, Envelope, Notice, RawLine, Role};
use tracing::{debug, info, warn};

use crate::error::{SessionError, TransportError};
use crate::transport::Transport;

/// Wire boundary of a session: typed messages go out, typed envelopes come
/// back.
pub struct ActionChannel<T> {
    transport: T,
    client_id: Option<u32>,
    inbox: VecDeque<String>,
    /// Own lines sent but not yet echoed back by the relay.
    in_flight: usize,
    dropped: u64,
}

impl<T: Transport> ActionChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            client_id: None,
            inbox: VecDeque::new(),
            in_flight: 0,
            dropped: 0,
        }
    }

    /// Id assigned by the relay's `welcome`, once it has arrived.
    pub fn client_id(&self) -> Option<u32> {
        self.client_id
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Lines that could not be decoded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn send(&mut self, message: &Message, registry: &EntityRegistry) -> Result<(), SessionError> {
        // The relay overwrites the id; 0 only matters before the welcome.
        let envelope = Envelope::action(self.client_id.unwrap_or(0), message.clone());
        let line = envelope.encode(registry)?;
        self.transport.send_line(&line)?;
        self.in_flight += 1;
        debug!(target: "arcana::channel", key = %message.key(), "sent");
        Ok(())
    }

    /// Moves everything the transport received into the local queue.
    pub fn receive(&mut self) -> Result<usize, TransportError> {
        let lines = self.transport.drain_lines()?;
        let count = lines.len();
        self.inbox.extend(lines);
        Ok(count)
    }

    pub fn has_pending(&self) -> bool {
        !self.inbox.is_empty()
    }

    /// Decodes the next queued line against `registry`.
    ///
    /// Undecodable lines are logged and skipped. `welcome` is consumed here.
    pub fn next_envelope(&mut self, registry: &EntityRegistry) -> Option<Envelope> {
        while let Some(line) = self.inbox.pop_front() {
            self.track_echo(&line);
            match Envelope::decode(&line, registry) {
                Ok(envelope) => {
                    if let Body::Notice(Notice::Welcome) = envelope.body {
                        if self.client_id.is_none() {
                            info!(target: "arcana::channel", client_id = envelope.client_id, "welcomed by relay");
                            self.client_id = Some(envelope.client_id);
                        }
                        continue;
                    }
                    return Some(envelope);
                }
                Err(err) => {
                    self.dropped += 1;
                    warn!(
                        target: "arcana::channel",
                        code = err.error_code(),
                        line = %line,
                        "line dropped: {err}"
                    );
                }
            }
        }
        None
    }

    fn track_echo(&mut self, line: &str) {
        let Some(own) = self.client_id else {
            return;
        };
        if let Ok(raw) = RawLine::parse(line)
            && raw.role == Role::Client
            && raw.client_id == own
        {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalHub;
    use arcana_core::action::{GameStart, NextRound};

    #[test]
    fn welcome_sets_the_id_and_echoes_clear_in_flight() {
        let hub = LocalHub::new();
        let mut channel = ActionChannel::new(hub.connect().unwrap());
        let registry = EntityRegistry::new();

        channel.receive().unwrap();
        assert!(channel.next_envelope(&registry).is_none());
        assert_eq!(channel.client_id(), Some(1));

        channel.send(&GameStart.into(), &registry).unwrap();
        assert_eq!(channel.in_flight(), 1);
        channel.receive().unwrap();
        let envelope = channel.next_envelope(&registry).unwrap();
        assert_eq!(envelope, Envelope::action(1, GameStart));
        assert_eq!(channel.in_flight(), 0);
    }

    #[test]
    fn undecodable_lines_are_skipped() {
        let hub = LocalHub::new();
        let mut channel = ActionChannel::new(hub.connect().unwrap());
        let mut other = hub.connect().unwrap();
        let registry = EntityRegistry::new();

        other.send_line("C|0|disconnect|Player#4#seat4$").unwrap();
        other.send_line("C|0|next_round|2$").unwrap();
        channel.receive().unwrap();
        let envelope = channel.next_envelope(&registry).unwrap();
        assert_eq!(envelope, Envelope::action(2, NextRound { round: 2 }));
        assert_eq!(channel.dropped(), 1);
    }
}
