//! The single task that orders every line.
//!
//! Connections never write to each other. Their readers hand lines to the
//! hub over one channel, and the hub pushes each line into every outbox in
//! the order it dequeued them. That dequeue order is the total order all
//! clients observe.
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use arcana_protocol::{Notice, RawLine, Role};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

pub(crate) type Outbox = mpsc::Sender<Arc<str>>;

#[derive(Debug)]
pub(crate) enum HubEvent {
    Joined { client_id: u32, outbox: Outbox },
    Line { client_id: u32, line: String },
    Left { client_id: u32 },
}

pub(crate) struct Hub {
    clients: BTreeMap<u32, Outbox>,
    max_clients: usize,
}

impl Hub {
    pub(crate) fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            max_clients,
        }
    }

    pub(crate) async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        debug!(target: "arcana::relay", "hub stopped");
    }

    pub(crate) fn handle(&mut self, event: HubEvent) {
        match event {
            HubEvent::Joined { client_id, outbox } => self.join(client_id, outbox),
            HubEvent::Line { client_id, line } => self.relay(client_id, &line),
            HubEvent::Left { client_id } => {
                if self.clients.remove(&client_id).is_some() {
                    info!(target: "arcana::relay", client_id, "client left");
                    self.broadcast(notice_line(client_id, Notice::Left));
                }
            }
        }
    }

    fn join(&mut self, client_id: u32, outbox: Outbox) {
        if self.clients.len() >= self.max_clients {
            warn!(
                target: "arcana::relay",
                client_id,
                max = self.max_clients,
                "table full, closing connection"
            );
            return;
        }
        if outbox.try_send(notice_line(client_id, Notice::Welcome)).is_err() {
            return;
        }
        info!(target: "arcana::relay", client_id, "client joined");
        self.clients.insert(client_id, outbox);
    }

    /// Restamps a client line with the connection's id and fans it out to
    /// everyone, the sender included.
    fn relay(&mut self, client_id: u32, line: &str) {
        if !self.clients.contains_key(&client_id) {
            return;
        }
        match RawLine::parse(line) {
            Ok(raw) if raw.role == Role::Client => {
                debug!(target: "arcana::relay", client_id, key = raw.key, "relaying");
                self.broadcast(raw.with_client(client_id).to_string().into());
            }
            Ok(raw) => {
                warn!(target: "arcana::relay", client_id, key = raw.key, "client sent a server line");
            }
            Err(err) => {
                warn!(target: "arcana::relay", client_id, %err, "dropping malformed line");
            }
        }
    }

    /// Outboxes that are full or closed lose their client, which is then
    /// announced like any other departure.
    fn broadcast(&mut self, line: Arc<str>) {
        let mut pending = VecDeque::from([line]);
        while let Some(line) = pending.pop_front() {
            let mut dropped = Vec::new();
            for (client_id, outbox) in &self.clients {
                match outbox.try_send(Arc::clone(&line)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(target: "arcana::relay", client_id, "outbox full, dropping client");
                        dropped.push(*client_id);
                    }
                    Err(TrySendError::Closed(_)) => dropped.push(*client_id),
                }
            }
            for client_id in dropped {
                self.clients.remove(&client_id);
                info!(target: "arcana::relay", client_id, "client left");
                pending.push_back(notice_line(client_id, Notice::Left));
            }
        }
    }

    #[cfg(test)]
    fn connected(&self) -> usize {
        self.clients.len()
    }
}

pub(crate) fn notice_line(client_id: u32, notice: Notice) -> Arc<str> {
    RawLine {
        role: Role::Server,
        client_id,
        key: notice.as_ref(),
        payload: "",
    }
    .to_string()
    .into()
}
