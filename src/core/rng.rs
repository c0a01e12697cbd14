//! Randomness source for hit rolls, damage variance and AI branching

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Substitutable random source
///
/// Everything is derived from `next_f64`, so a test double only has to
/// implement that one method.
pub trait BattleRng {
    /// Uniform sample in [0, 1)
    fn next_f64(&mut self) -> f64;

    /// True with probability `odds`; odds of 1.0 or more always succeed
    fn chance(&mut self, odds: f64) -> bool {
        self.next_f64() < odds
    }

    /// Uniform index in [0, len); `len` must be non-zero
    fn index(&mut self, len: usize) -> usize {
        let i = (self.next_f64() * len as f64) as usize;
        i.min(len.saturating_sub(1))
    }

    /// Uniform integer in [low, high]
    fn range(&mut self, low: u32, high: u32) -> u32 {
        low + self.index((high - low + 1) as usize) as u32
    }

    /// Uniform sample in [mean - tolerance, mean + tolerance]
    fn uniform(&mut self, mean: f64, tolerance: f64) -> f64 {
        mean + (self.next_f64() * 2.0 - 1.0) * tolerance
    }

    /// Normally distributed sample (Box-Muller)
    fn normal(&mut self, mean: f64, sigma: f64) -> f64 {
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + z * sigma
    }
}

/// Deterministic ChaCha-backed source
pub struct SeededRng {
    rng: ChaCha8Rng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl BattleRng for SeededRng {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Source that always returns the same sample
///
/// `FixedRng::new(0.0)` makes every chance roll with positive odds succeed
/// and every variance roll land on its low edge.
#[derive(Debug, Clone, Copy)]
pub struct FixedRng {
    value: f64,
}

impl FixedRng {
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 0.999_999),
        }
    }
}

impl BattleRng for FixedRng {
    fn next_f64(&mut self) -> f64 {
        self.value
    }
}
