//! Digests of the replicated state for the round checksum exchange.

use arcana_core::StateSnapshot;
use sha2::{Digest, Sha256};

/// SHA-256 over the bincode encoding of `snapshot`, as lowercase hex.
///
/// Two clients that applied the same action log produce the same digest.
pub fn state_digest(snapshot: &StateSnapshot) -> Result<String, bincode::Error> {
    let bytes = bincode::serialize(snapshot)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::testing::TestTable;
    use arcana_core::{EssenceKind, EssenceSelection, PlayerId};

    #[test]
    fn digest_is_stable_and_hex() {
        let mut table = TestTable::three_players();
        table.start();
        let digest = state_digest(&table.state.snapshot()).unwrap();
        assert_eq!(digest, state_digest(&table.state.snapshot()).unwrap());
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn any_essence_change_changes_the_digest() {
        let mut table = TestTable::three_players();
        table.start();
        let before = state_digest(&table.state.snapshot()).unwrap();
        table.state.player_mut(PlayerId(2)).unwrap().essences =
            EssenceSelection::of(EssenceKind::Death, 4);
        assert_ne!(before, state_digest(&table.state.snapshot()).unwrap());
    }
}
