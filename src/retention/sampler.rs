//! Sampling gate for opportunistic retention sweeps.
//!
//! A sweep piggybacks on ingestion: each accepted batch draws once and
//! sweeps its channel when the draw falls under the probability.

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Fraction of ingestion calls that also sweep.
pub const DEFAULT_SWEEP_PROBABILITY: f64 = 0.05;

/// Uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible generator for simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Decides whether an ingestion call should also sweep.
pub struct SweepSampler {
    probability: f64,
    source: Box<dyn RandomSource>,
}

impl SweepSampler {
    /// `probability` is clamped into `[0, 1]`.
    pub fn new(probability: f64, source: Box<dyn RandomSource>) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            probability,
            source,
        }
    }

    pub fn always() -> Self {
        Self::new(1.0, Box::new(FixedRandom(0.0)))
    }

    pub fn never() -> Self {
        Self::new(0.0, Box::new(FixedRandom(0.0)))
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn should_sweep(&self) -> bool {
        self.source.next_f64() < self.probability
    }
}

impl Default for SweepSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_PROBABILITY, Box::new(ThreadRandom))
    }
}

impl std::fmt::Debug for SweepSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepSampler")
            .field("probability", &self.probability)
            .finish()
    }
}
