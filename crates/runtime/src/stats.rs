//! Statistics hand-off.
//!
//! The session pushes an immutable [`StateSnapshot`] after every turn and
//! every round. What happens to it (UI, export) is up to the recorder.
use arcana_core::StateSnapshot;
use tracing::{info, warn};

pub trait StatsRecorder {
    fn record_turn(&mut self, snapshot: &StateSnapshot);
    fn record_round(&mut self, snapshot: &StateSnapshot);
}

/// Drops every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRecorder;

impl StatsRecorder for NullRecorder {
    fn record_turn(&mut self, _snapshot: &StateSnapshot) {}
    fn record_round(&mut self, _snapshot: &StateSnapshot) {}
}

/// Keeps every snapshot in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecorder {
    pub turns: Vec<StateSnapshot>,
    pub rounds: Vec<StateSnapshot>,
}

impl StatsRecorder for MemoryRecorder {
    fn record_turn(&mut self, snapshot: &StateSnapshot) {
        self.turns.push(snapshot.clone());
    }

    fn record_round(&mut self, snapshot: &StateSnapshot) {
        self.rounds.push(snapshot.clone());
    }
}

/// Logs each snapshot as JSON under `arcana::stats`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRecorder;

impl TracingRecorder {
    fn emit(kind: &'static str, snapshot: &StateSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => info!(
                target: "arcana::stats",
                kind,
                round = snapshot.round,
                turn = snapshot.turn,
                snapshot = %json
            ),
            Err(err) => warn!(target: "arcana::stats", kind, "snapshot not serializable: {err}"),
        }
    }
}

impl StatsRecorder for TracingRecorder {
    fn record_turn(&mut self, snapshot: &StateSnapshot) {
        Self::emit("turn", snapshot);
    }

    fn record_round(&mut self, snapshot: &StateSnapshot) {
        Self::emit("round", snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::testing::TestTable;

    #[test]
    fn snapshots_serialize_to_json() {
        let mut table = TestTable::three_players();
        table.start();
        let json = serde_json::to_value(table.state.snapshot()).unwrap();
        assert_eq!(json["round"], 1);
        assert_eq!(json["players"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn memory_recorder_keeps_order() {
        let mut table = TestTable::three_players();
        table.start();
        let mut recorder = MemoryRecorder::default();
        recorder.record_turn(&table.state.snapshot());
        recorder.record_round(&table.state.snapshot());
        assert_eq!(recorder.turns.len(), 1);
        assert_eq!(recorder.rounds[0], table.state.snapshot());
    }
}
