//! Session counters.
//!
//! Atomics so a UI or a logging thread can read them while the simulation
//! thread keeps polling.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// Messages applied by the engine.
    applied: AtomicU64,
    /// Messages the engine rejected.
    rejected: AtomicU64,
    /// Own messages sent to the relay.
    sent: AtomicU64,
    /// Peer digests that disagreed with ours.
    checksum_mismatches: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mismatch(&self) {
        self.checksum_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn checksum_mismatches(&self) -> u64 {
        self.checksum_mismatches.load(Ordering::Relaxed)
    }

    /// Share of received messages that were rejected.
    pub fn rejection_rate(&self) -> f64 {
        let applied = self.applied();
        let rejected = self.rejected();
        let total = applied + rejected;
        if total == 0 {
            0.0
        } else {
            rejected as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_rate_counts_both_outcomes() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.rejection_rate(), 0.0);
        metrics.record_applied();
        metrics.record_applied();
        metrics.record_applied();
        metrics.record_rejected();
        assert_eq!(metrics.rejection_rate(), 0.25);
    }
}
