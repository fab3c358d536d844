use std::sync::{Arc, Mutex};

use arcana_protocol::{Envelope, Notice, RawLine, Role};
use arcana_core::EntityRegistry;
use tracing::warn;

use super::Transport;
use crate::error::TransportError;

#[derive(Debug, Default)]
struct HubInner {
    next_client: u32,
    clients: Vec<(u32, Arc<Mutex<Vec<String>>>)>,
}

impl HubInner {
    fn broadcast(&self, line: &str) {
        for (_, inbox) in &self.clients {
            if let Ok(mut lines) = inbox.lock() {
                lines.push(line.to_string());
            }
        }
    }
}

/// In-process relay.
///
/// Behaves like the TCP relay: sequential client ids, a `welcome` on
/// connect, fan-out of every client line to everyone including the sender,
/// and a `left` notice when a transport is dropped. One lock around the
/// fan-out gives every client the same total order.
#[derive(Clone, Debug, Default)]
pub struct LocalHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self) -> Result<LocalTransport, TransportError> {
        let mut hub = self.inner.lock().map_err(|_| TransportError::Poisoned)?;
        hub.next_client += 1;
        let client_id = hub.next_client;
        let welcome = notice_line(client_id, Notice::Welcome);
        let inbox = Arc::new(Mutex::new(vec![welcome]));
        hub.clients.push((client_id, Arc::clone(&inbox)));
        Ok(LocalTransport {
            client_id,
            hub: Arc::clone(&self.inner),
            inbox,
        })
    }

    /// Number of live connections.
    pub fn connected(&self) -> usize {
        self.inner.lock().map_or(0, |hub| hub.clients.len())
    }
}

fn notice_line(client_id: u32, notice: Notice) -> String {
    // Notices carry no entities, so an empty registry always encodes them.
    Envelope::notice(client_id, notice)
        .encode(&EntityRegistry::new())
        .unwrap_or_default()
}

/// One connection to a [`LocalHub`].
#[derive(Debug)]
pub struct LocalTransport {
    client_id: u32,
    hub: Arc<Mutex<HubInner>>,
    inbox: Arc<Mutex<Vec<String>>>,
}

impl LocalTransport {
    pub fn client_id(&self) -> u32 {
        self.client_id
    }
}

impl Transport for LocalTransport {
    fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let hub = self.hub.lock().map_err(|_| TransportError::Poisoned)?;
        match RawLine::parse(line) {
            Ok(raw) if raw.role == Role::Client => {
                hub.broadcast(&raw.with_client(self.client_id).to_string());
            }
            Ok(_) => {
                warn!(target: "arcana::transport", client = self.client_id, "client sent a server notice")
            }
            Err(err) => {
                warn!(target: "arcana::transport", client = self.client_id, "unparseable line dropped: {err}")
            }
        }
        Ok(())
    }

    fn drain_lines(&mut self) -> Result<Vec<String>, TransportError> {
        let mut inbox = self.inbox.lock().map_err(|_| TransportError::Poisoned)?;
        Ok(std::mem::take(&mut *inbox))
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        if let Ok(mut hub) = self.hub.lock() {
            hub.clients.retain(|(id, _)| *id != self.client_id);
            hub.broadcast(&notice_line(self.client_id, Notice::Left));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_includes_the_sender_and_restamps_the_id() {
        let hub = LocalHub::new();
        let mut first = hub.connect().unwrap();
        let mut second = hub.connect().unwrap();
        assert_eq!(first.drain_lines().unwrap(), vec!["S|1|welcome|$"]);
        assert_eq!(second.drain_lines().unwrap(), vec!["S|2|welcome|$"]);

        first.send_line("C|0|game_start|$").unwrap();
        second.send_line("C|0|next_round|2$").unwrap();
        let expected = vec!["C|1|game_start|$", "C|2|next_round|2$"];
        assert_eq!(first.drain_lines().unwrap(), expected);
        assert_eq!(second.drain_lines().unwrap(), expected);
    }

    #[test]
    fn dropping_a_transport_announces_left() {
        let hub = LocalHub::new();
        let mut first = hub.connect().unwrap();
        let second = hub.connect().unwrap();
        first.drain_lines().unwrap();
        drop(second);
        assert_eq!(hub.connected(), 1);
        assert_eq!(first.drain_lines().unwrap(), vec!["S|2|left|$"]);
    }
}
