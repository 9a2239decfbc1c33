//! Random layer assignment for new nodes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws the top layer of each inserted node from an exponentially decaying
/// distribution, using an explicit seeded generator.
#[derive(Debug, Clone)]
pub struct LevelSampler {
    rng: StdRng,
    multiplier: f64,
    max_level: usize,
}

impl LevelSampler {
    /// Creates a sampler. `max_layers` must be at least 1.
    pub fn new(rng: StdRng, multiplier: f64, max_layers: usize) -> Self {
        Self {
            rng,
            multiplier,
            max_level: max_layers.saturating_sub(1),
        }
    }

    /// Creates a sampler seeded from `seed`.
    pub fn seeded(seed: u64, multiplier: f64, max_layers: usize) -> Self {
        Self::new(StdRng::seed_from_u64(seed), multiplier, max_layers)
    }

    /// Returns `floor(-ln(U) * multiplier)` for `U ~ Uniform(0, 1]`, capped at
    /// `max_layers - 1`.
    pub fn sample_level(&mut self) -> usize {
        // gen::<f64>() is in [0, 1); flipping it keeps ln() away from zero.
        let u = 1.0 - self.rng.gen::<f64>();
        let level = (-u.ln() * self.multiplier).floor();
        if level.is_finite() && level >= 0.0 {
            (level as usize).min(self.max_level)
        } else {
            0
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}
