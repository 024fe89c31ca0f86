//! Sampler implementations.
//!
//! The kernel takes any [`Sampler`] for interarrival and service times;
//! these are the stock ones. Each owns a private seeded [`SmallRng`], so
//! two blocks never share a random stream and a run reproduces exactly
//! from its seeds. Ad-hoc schedules can skip all of this: any
//! `FnMut() -> f64` closure is already a sampler.

use flowstone_kernel::Sampler;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};

/// Always returns the same duration. Deterministic models and tests.
#[derive(Debug, Clone, Copy)]
pub struct Constant {
    value: f64,
}

impl Constant {
    /// # Panics
    ///
    /// Panics when `value` is negative or not finite — the kernel requires
    /// non-negative durations.
    pub fn new(value: f64) -> Self {
        assert!(
            value >= 0.0 && value.is_finite(),
            "constant sampler needs a finite non-negative duration, got {value}"
        );
        Self { value }
    }
}

impl Sampler for Constant {
    fn sample(&mut self) -> f64 {
        self.value
    }
}

/// Exponentially distributed durations — the memoryless interarrival and
/// service process of M/M/c queueing models.
#[derive(Debug, Clone)]
pub struct Exponential {
    rng: SmallRng,
    dist: Exp<f64>,
}

impl Exponential {
    /// `rate` is events per unit time; sampled durations have mean
    /// `1 / rate`.
    ///
    /// # Panics
    ///
    /// Panics when `rate` is not strictly positive and finite.
    pub fn new(seed: u64, rate: f64) -> Self {
        assert!(
            rate > 0.0 && rate.is_finite(),
            "exponential rate must be positive and finite, got {rate}"
        );
        let dist = Exp::new(rate).expect("rate validated above");
        Self {
            rng: SmallRng::seed_from_u64(seed),
            dist,
        }
    }
}

impl Sampler for Exponential {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Durations drawn uniformly from `[low, high)`.
#[derive(Debug, Clone)]
pub struct UniformRange {
    rng: SmallRng,
    low: f64,
    high: f64,
}

impl UniformRange {
    /// # Panics
    ///
    /// Panics unless `0 <= low < high` and both bounds are finite.
    pub fn new(seed: u64, low: f64, high: f64) -> Self {
        assert!(
            low >= 0.0 && low < high && high.is_finite(),
            "uniform range needs 0 <= low < high, got [{low}, {high})"
        );
        Self {
            rng: SmallRng::seed_from_u64(seed),
            low,
            high,
        }
    }
}

impl Sampler for UniformRange {
    fn sample(&mut self) -> f64 {
        self.rng.gen_range(self.low..self.high)
    }
}
