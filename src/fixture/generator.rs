//! Random fixture generation.
//!
//! Uses a ChaCha8 RNG so a run can be reproduced from its seed. When no seed
//! is given one is drawn from the thread RNG and kept for logging.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::pools::{FIRST_NAMES, HOBBIES, SURNAMES};
use super::{Condition, Fixture};
use crate::error::FixtureError;

/// Youngest generated subject.
pub const MIN_AGE: u8 = 18;

/// Oldest generated subject.
pub const MAX_AGE: u8 = 80;

/// Hobbies per fixture unless configured otherwise.
pub const DEFAULT_HOBBY_COUNT: usize = 2;

/// Draws randomized fixtures from the fixed pools.
pub struct FixtureGenerator {
    seed: u64,
    rng: ChaCha8Rng,
    hobby_count: usize,
}

impl FixtureGenerator {
    /// Creates a generator.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed for reproducible runs; `None` draws a fresh seed
    /// * `hobby_count` - Number of hobbies per fixture
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::InvalidHobbyCount` if `hobby_count` is zero or
    /// larger than the hobby pool.
    pub fn new(seed: Option<u64>, hobby_count: usize) -> Result<Self, FixtureError> {
        if hobby_count == 0 || hobby_count > HOBBIES.len() {
            return Err(FixtureError::InvalidHobbyCount {
                requested: hobby_count,
                available: HOBBIES.len(),
            });
        }

        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            hobby_count,
        })
    }

    /// Seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws the next fixture.
    pub fn next_fixture(
        &mut self,
        sequence: u32,
        condition: Condition,
    ) -> Result<Fixture, FixtureError> {
        if sequence == 0 {
            return Err(FixtureError::InvalidSequence);
        }

        let age = self.rng.random_range(MIN_AGE..=MAX_AGE);
        let subject_name = self.random_name();
        let hobbies = self.random_hobbies();

        Ok(Fixture {
            sequence,
            subject_name,
            age,
            hobbies,
            condition,
        })
    }

    /// Independent draws of first name and surname; collisions are allowed.
    fn random_name(&mut self) -> String {
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Alice");
        let last = SURNAMES.choose(&mut self.rng).copied().unwrap_or("Smith");
        format!("{first} {last}")
    }

    /// Shuffles the pool and keeps the first entries.
    ///
    /// Draws are by position, so repeated pool entries can yield the same
    /// hobby twice.
    fn random_hobbies(&mut self) -> Vec<String> {
        let mut pool: Vec<&str> = HOBBIES.to_vec();
        pool.shuffle(&mut self.rng);
        pool.into_iter()
            .take(self.hobby_count)
            .map(str::to_string)
            .collect()
    }
}
