//! Randomness drawn by this client and broadcast as data.
//!
//! Only the designated client shuffles and only the activating client rolls.
//! The outcome travels in the action, so replaying clients never draw.
use arcana_core::{RollSource, TappableId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn shuffled(&mut self, mut cards: Vec<TappableId>) -> Vec<TappableId> {
        cards.shuffle(&mut self.rng);
        cards
    }
}

impl RollSource for RandomSource {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(0..sides.max(1))
    }
}
