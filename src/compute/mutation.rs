//! Gene-wise Gaussian mutation.

use super::rng::EvoRng;
use crate::schema::Bounds;

/// Noise standard deviation as a fraction of each gene's range.
const MUTATION_SCALE: f64 = 0.2;

/// Gaussian mutation applied independently to every gene.
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    rate: f64,
}

impl Mutation {
    /// Mutation with per-gene probability `rate`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Default rate of `0.01 / num_params`.
    pub fn for_params(num_params: usize) -> Self {
        Self::new(0.01 / num_params.max(1) as f64)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Mutate a batch of offspring in place.
    ///
    /// Returns the number of genes that were perturbed.
    pub fn apply(&self, offspring: &mut [Vec<f64>], bounds: &Bounds, rng: &mut EvoRng) -> usize {
        let mut mutated = 0;
        for child in offspring.iter_mut() {
            for (i, gene) in child.iter_mut().enumerate() {
                if rng.unit() < self.rate {
                    let sigma = bounds.range(i) * MUTATION_SCALE;
                    *gene = bounds.clamp(i, *gene + rng.normal(sigma));
                    mutated += 1;
                }
            }
        }
        mutated
    }
}
