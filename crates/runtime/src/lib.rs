//! Client runtime for the replicated card game.
//!
//! Wires a [`GameState`](arcana_core::GameState) to the relay: a transport
//! with its reader thread, the [`ActionChannel`] that encodes and decodes
//! envelope lines, and the [`ClientSession`] poll loop that applies the
//! ordered action stream and performs this client's share of the table's
//! work.
//!
//! Modules are organized by responsibility:
//! - [`transport`] moves raw lines (TCP or in-process)
//! - [`channel`] is the typed wire boundary
//! - [`session`] hosts the poll loop and local requests
//! - [`stats`] and [`metrics`] expose what happened to observers
pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod random;
pub mod session;
pub mod stats;
pub mod transport;
pub mod utils;

pub use channel::ActionChannel;
pub use config::SessionConfig;
pub use error::{Result, SessionError, TransportError};
pub use metrics::SessionMetrics;
pub use random::RandomSource;
pub use session::{ClientSession, PollReport};
pub use stats::{MemoryRecorder, NullRecorder, StatsRecorder, TracingRecorder};
pub use transport::{LocalHub, LocalTransport, TcpTransport, Transport};
pub use utils::hash::state_digest;
