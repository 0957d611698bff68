//! Random jitter used while spawning a particle field.
//!
//! Field layout is a pure function of the particle index except for a small
//! random perturbation of radius, angle and brightness. [`Jitter`] decides
//! where that randomness comes from:
//!
//! ```ignore
//! // Different every run (the default)
//! FieldGenerator::new().with_jitter(Jitter::Entropy);
//!
//! // Byte-identical across runs
//! FieldGenerator::new().with_jitter(Jitter::Seeded(42));
//!
//! // No perturbation at all, every sample sits at the distribution center
//! FieldGenerator::new().with_jitter(Jitter::Disabled);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeding strategy for the spawn-time jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Seed from OS entropy; every generation differs.
    #[default]
    Entropy,
    /// Seed from a fixed value; generation is reproducible.
    Seeded(u64),
    /// No randomness. Uniform samples return 0.5.
    Disabled,
}

impl Jitter {
    /// Create the sample source for one field generation.
    pub(crate) fn source(self) -> JitterSource {
        let rng = match self {
            Jitter::Entropy => Some(SmallRng::from_entropy()),
            Jitter::Seeded(seed) => Some(SmallRng::seed_from_u64(seed)),
            Jitter::Disabled => None,
        };
        JitterSource { rng }
    }
}

/// Uniform sample source handed to the field generator.
pub(crate) struct JitterSource {
    rng: Option<SmallRng>,
}

impl JitterSource {
    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        match self.rng.as_mut() {
            Some(rng) => rng.gen::<f64>(),
            None => 0.5,
        }
    }

    /// Uniform sample in `[-magnitude / 2, magnitude / 2)`.
    #[inline]
    pub fn symmetric(&mut self, magnitude: f64) -> f64 {
        (self.unit() - 0.5) * magnitude
    }
}
