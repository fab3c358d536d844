/// Game configuration constants and tunable rule parameters.
///
/// Every client of a session must use the same configuration; it is part of
/// the deterministic input alongside the card catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Points at which the game ends at the next round boundary check.
    pub win_points: i32,
    /// Upper bound on artifacts dealt into each player's deck.
    pub artifacts_per_player: usize,
    /// Cards the designated client deals into each hand at setup.
    pub starting_hand: usize,
    /// Essences of every kind each player starts with.
    pub starting_essence: i32,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_PLAYERS: usize = 4;
    pub const MIN_PLAYERS: usize = 2;
    pub const MAGES_OFFERED: usize = 2;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_WIN_POINTS: i32 = 10;
    pub const DEFAULT_ARTIFACTS_PER_PLAYER: usize = 8;
    pub const DEFAULT_STARTING_HAND: usize = 3;
    pub const DEFAULT_STARTING_ESSENCE: i32 = 1;

    pub fn new() -> Self {
        Self {
            win_points: Self::DEFAULT_WIN_POINTS,
            artifacts_per_player: Self::DEFAULT_ARTIFACTS_PER_PLAYER,
            starting_hand: Self::DEFAULT_STARTING_HAND,
            starting_essence: Self::DEFAULT_STARTING_ESSENCE,
        }
    }

    pub fn with_win_points(mut self, win_points: i32) -> Self {
        self.win_points = win_points;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
