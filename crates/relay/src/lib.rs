//! Line relay for a replicated table.
//!
//! The relay knows nothing about the game. It assigns each connection a
//! sequential client id, greets it with a `welcome` notice and fans every
//! client line out to all connections, the sender included, after stamping
//! the sender's id into the header. A closed connection is announced with a
//! `left` notice. All fan-out goes through one hub task, so every client
//! receives the same lines in the same order.
mod config;
mod connection;
mod error;
mod hub;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub use config::RelayConfig;
pub use error::RelayError;

use crate::hub::Hub;

pub struct Relay {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: RelayConfig,
}

impl Relay {
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let bind_error = |source| RelayError::Bind {
            addr: config.bind.clone(),
            source,
        };
        let listener = TcpListener::bind(&config.bind).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!(target: "arcana::relay", addr = %local_addr, "relay listening");
        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until the hub stops.
    pub async fn run(self) -> Result<(), RelayError> {
        let (events, inbox) = mpsc::channel(self.config.queue);
        tokio::spawn(Hub::new(self.config.max_clients).run(inbox));

        let mut next_client: u32 = 0;
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(target: "arcana::relay", %err, "accept failed");
                    continue;
                }
            };
            next_client += 1;
            info!(target: "arcana::relay", client_id = next_client, %peer, "connection accepted");
            connection::open(stream, next_client, self.config.queue, events.clone()).await?;
        }
    }
}
