//! Deterministic simulation RNG.
//!
//! A 31-bit linear-congruential generator. The recurrence is fixed so that a
//! given seed yields the same tank trajectory on every platform, which the
//! golden-output tests depend on. Each simulation session owns one instance;
//! nothing here is shared.

/// LCG multiplier.
const MULTIPLIER: u64 = 1_103_515_245;
/// LCG increment.
const INCREMENT: u64 = 12_345;
/// State is kept modulo 2^31.
const MODULUS_MASK: u64 = 0x7fff_ffff;
/// Divisor that maps the state onto the unit interval.
const SCALE: f64 = 0x7fff_ffff as f64;

/// Seeded linear-congruential generator driving all tank noise and drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Create a generator from `seed`. Only the low 31 bits are significant.
    pub fn new(seed: u64) -> Self {
        Self {
            state: (seed & MODULUS_MASK) as u32,
        }
    }

    /// Current internal state, for inspection and hashing.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance the state and return it scaled by `1 / (2^31 - 1)`.
    pub fn next(&mut self) -> f64 {
        let advanced = (self.state as u64 * MULTIPLIER + INCREMENT) & MODULUS_MASK;
        self.state = advanced as u32;
        advanced as f64 / SCALE
    }

    /// One draw mapped linearly onto `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Multiplicative perturbation uniformly distributed in `[1 - factor, 1 + factor]`.
    pub fn noise(&mut self, factor: f64) -> f64 {
        1.0 + (self.next() - 0.5) * 2.0 * factor
    }

    /// Zero-mean additive step of total width `magnitude`.
    pub fn drift(&mut self, magnitude: f64) -> f64 {
        (self.next() - 0.5) * magnitude
    }
}

impl Default for SeededRandom {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SEED)
    }
}
