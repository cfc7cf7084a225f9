//! Injectable PRNG source (spec §3: "a pseudo-random number source...
//! injected (defaulting to a system PRNG)").
//!
//! Treating the PRNG as an owned trait-object field of `Simulation` (rather
//! than a free function call) is what makes scenario-level reproducibility
//! (spec §8, property 6) testable at all: a test can hand the simulation a
//! scripted source that returns `0.3` then `0.9` and assert on the exact
//! reaction that fires.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces uniform reals in `[0, 1)`. The engine assumes no particular
/// seed discipline from implementors, only that a fixed seed and a fixed
/// call sequence reproduce the same output stream.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// The default PRNG: `rand`'s `StdRng`, seedable for reproducible runs or
/// left to seed from OS entropy for normal operation.
pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    /// Seeds from OS entropy. Used when no particular reproducibility
    /// discipline is required.
    pub fn from_entropy() -> Self {
        SystemRandom { rng: StdRng::from_os_rng() }
    }

    /// Seeds deterministically, for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        SystemRandom { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SystemRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// A scripted source that replays a fixed sequence of draws.
///
/// Not test-gated: both this crate's own tests and an embedding's
/// integration tests need to pin exactly which reaction fires (spec §8
/// scenarios S1–S6), and the latter can only reach a `pub` type.
pub struct ScriptedRandom {
    draws: std::vec::IntoIter<f64>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        ScriptedRandom { draws: draws.into_iter().collect::<Vec<_>>().into_iter() }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws.next().expect("ScriptedRandom exhausted: test supplied too few draws")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_with_same_seed_reproduce_the_same_stream() {
        let mut a = SystemRandom::seeded(7);
        let mut b = SystemRandom::seeded(7);
        for _ in 0..16 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn scripted_random_replays_exact_sequence() {
        let mut r = ScriptedRandom::new([0.3, 0.9, 0.1]);
        assert_eq!(r.next_unit(), 0.3);
        assert_eq!(r.next_unit(), 0.9);
        assert_eq!(r.next_unit(), 0.1);
    }
}
