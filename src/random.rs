//! Sources for the per-day perturbation of the transmission flux.
//!
//! The stepper never reaches for an ambient generator. Stochastic runs own a seeded rng, so two
//! runs built from the same configuration and seed produce identical output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper (exclusive) bound of the uniform transmission multiplier.
pub const MAX_TRANSMISSION_FACTOR: f64 = 2.0;

pub trait Perturbation {
    /// Multiplier applied to the day's new infections. Called exactly once per simulated day.
    fn transmission_factor(&mut self) -> f64;
}

/// No perturbation: every day uses the deterministic flux.
#[derive(Copy, Clone, Debug, Default)]
pub struct Deterministic;

impl Perturbation for Deterministic {
    fn transmission_factor(&mut self) -> f64 {
        1.0
    }
}

/// Multiplies new infections by a factor drawn uniformly from `[0, 2)`, which keeps the expected
/// flux equal to the deterministic one.
#[derive(Clone, Debug)]
pub struct UniformPerturbation {
    rng: StdRng,
}

impl UniformPerturbation {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        UniformPerturbation {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Perturbation for UniformPerturbation {
    fn transmission_factor(&mut self) -> f64 {
        self.rng.random_range(0.0..MAX_TRANSMISSION_FACTOR)
    }
}

/// Replays a fixed sequence of factors, starting over when it runs out.
#[derive(Clone, Debug)]
pub struct ScriptedPerturbation {
    factors: Vec<f64>,
    next: usize,
}

impl ScriptedPerturbation {
    /// An empty script behaves like `Deterministic`.
    #[must_use]
    pub fn new(factors: Vec<f64>) -> Self {
        ScriptedPerturbation { factors, next: 0 }
    }
}

impl Perturbation for ScriptedPerturbation {
    fn transmission_factor(&mut self) -> f64 {
        if self.factors.is_empty() {
            return 1.0;
        }
        let factor = self.factors[self.next];
        self.next = (self.next + 1) % self.factors.len();
        factor
    }
}
