//! Headless client for a replicated arcana table.
//!
//! The binary connects a [`ClientSession`](arcana_runtime::ClientSession) to
//! the relay and lets an [`Autopilot`] play the local seat: it joins, drafts,
//! answers every selector and takes turns according to a pluggable
//! [`TurnStrategy`].
pub mod autopilot;
pub mod config;

pub use autopilot::{Autopilot, GreedyStrategy, PassiveStrategy, TurnChoice, TurnStrategy};
pub use config::ClientConfig;
