//! Node Identity Generation
//!
//! Graph node names are the AST kind plus a numeric suffix drawn from a seeded
//! PCG stream. The same seed always yields the same sequence, so translating
//! the same tree twice gives identical graphs. Collisions are not detected;
//! with 64-bit suffixes they are not expected within one tree.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0;

/// Suffix of the root node, in place of a generated number.
pub const ROOT_SUFFIX: &str = "root";

#[derive(Debug, Clone)]
pub struct IdGenerator {
    rng: Pcg64,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Next suffix, in base 10.
    pub fn next(&mut self) -> String {
        self.rng.next_u64().to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
