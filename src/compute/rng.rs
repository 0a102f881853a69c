//! Seedable random source shared by every stochastic step of the engine.

use rand::prelude::*;
use rand::seq::index;

use crate::schema::Bounds;

/// Random number generator wrapper for evolutionary operators.
///
/// All sampling goes through one instance owned by the engine, so a fixed
/// seed reproduces a whole run.
#[derive(Debug, Clone)]
pub struct EvoRng {
    rng: StdRng,
}

impl EvoRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// Standard normal sample.
    #[inline]
    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample(rand_distr::StandardNormal)
    }

    /// Normal sample with zero mean and standard deviation `sigma`.
    #[inline]
    pub fn normal(&mut self, sigma: f64) -> f64 {
        self.standard_normal() * sigma
    }

    /// Uniform index in `0..len`.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform vector inside the bounds.
    pub fn uniform_vector(&mut self, bounds: &Bounds) -> Vec<f64> {
        bounds
            .min
            .iter()
            .zip(&bounds.max)
            .map(|(&lo, &hi)| self.rng.gen_range(lo..=hi))
            .collect()
    }

    /// Sample `amount` distinct indices from `0..len`.
    ///
    /// Returns `(selected, remaining)`; `selected` is in draw order and
    /// `remaining` holds the complement in ascending order.
    pub fn pick_ids(&mut self, len: usize, amount: usize) -> (Vec<usize>, Vec<usize>) {
        let selected = index::sample(&mut self.rng, len, amount).into_vec();
        let mut taken = vec![false; len];
        for &i in &selected {
            taken[i] = true;
        }
        let remaining = (0..len).filter(|&i| !taken[i]).collect();
        (selected, remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_ids_partition() {
        let mut rng = EvoRng::new(7);
        let (selected, remaining) = rng.pick_ids(10, 4);

        assert_eq!(selected.len(), 4);
        assert_eq!(remaining.len(), 6);

        let mut all: Vec<usize> = selected.iter().chain(&remaining).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_uniform_vector_in_bounds() {
        let mut rng = EvoRng::new(1);
        let bounds = Bounds::new(vec![-1.0, 2.0, 5.0], vec![1.0, 3.0, 5.0]).unwrap();
        for _ in 0..100 {
            let v = rng.uniform_vector(&bounds);
            assert!(bounds.contains(&v));
            assert_eq!(v[2], 5.0);
        }
    }

    #[test]
    fn test_seed_reproducible() {
        let mut a = EvoRng::new(42);
        let mut b = EvoRng::new(42);
        for _ in 0..10 {
            assert_eq!(a.standard_normal(), b.standard_normal());
        }
    }
}
