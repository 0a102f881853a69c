//! PCX and UNDX crossover operators.
//!
//! Both operators sample `mu` parents from the population and return one
//! offspring vector. Neither looks at the bounds; [`bounded_offspring`]
//! wraps an operator with the retry-then-resample policy.

use super::geometry::{
    DEGENERATE_EPS, axpy, centroid, dot, norm, null_space_basis, orthonormalize,
    perpendicular_distance, sub,
};
use super::population::Population;
use super::rng::EvoRng;
use crate::schema::{Bounds, CrossoverKind};

/// Attempts per offspring before falling back to a uniform sample.
pub const MAX_CROSSOVER_ATTEMPTS: usize = 5;

/// Combined difference-vector magnitude under which UNDX returns the centroid.
const UNDX_DEGENERATE_EPS: f64 = 1e-5;

/// Crossover operator with its sampling widths.
#[derive(Debug, Clone, Copy)]
pub struct Crossover {
    kind: CrossoverKind,
    mu: usize,
    sigma_eta: f64,
    sigma_xi: f64,
}

impl Crossover {
    /// Create an operator for arity `mu` over a population of `num_parent`.
    ///
    /// Requires `mu < num_parent`.
    pub fn new(kind: CrossoverKind, mu: usize, num_parent: usize) -> Self {
        Self {
            kind,
            mu,
            sigma_eta: 1.0 / (mu as f64).sqrt(),
            sigma_xi: 0.35 / ((num_parent - mu) as f64).sqrt(),
        }
    }

    pub fn kind(&self) -> CrossoverKind {
        self.kind
    }

    pub fn sigma_eta(&self) -> f64 {
        self.sigma_eta
    }

    pub fn sigma_xi(&self) -> f64 {
        self.sigma_xi
    }

    /// Produce one offspring, ignoring bounds.
    pub fn generate(&self, population: &Population, rng: &mut EvoRng) -> Vec<f64> {
        match self.kind {
            CrossoverKind::Pcx => self.pcx(population, rng),
            CrossoverKind::Undx => self.undx(population, rng),
        }
    }

    /// Produce one offspring inside the bounds.
    ///
    /// Returns the vector and whether the uniform fallback was used.
    pub fn generate_bounded(
        &self,
        population: &Population,
        bounds: &Bounds,
        rng: &mut EvoRng,
    ) -> (Vec<f64>, bool) {
        bounded_offspring(bounds, rng, |rng| self.generate(population, rng))
    }

    /// Parent-centric crossover.
    fn pcx(&self, population: &Population, rng: &mut EvoRng) -> Vec<f64> {
        let (mut selected, _) = rng.pick_ids(population.len(), self.mu);
        let g = centroid(selected.iter().map(|&i| population.params(i)));

        let base = selected.swap_remove(rng.index(selected.len()));
        let x = population.params(base);
        let d = sub(x, &g);
        if norm(&d) < DEGENERATE_EPS {
            return x.to_vec();
        }

        let others: Vec<&[f64]> = selected.iter().map(|&i| population.params(i)).collect();
        let spread = others
            .iter()
            .map(|p| perpendicular_distance(p, &d))
            .sum::<f64>()
            / others.len() as f64;

        let mut columns: Vec<&[f64]> = Vec::with_capacity(self.mu);
        columns.push(d.as_slice());
        columns.extend(others.iter().copied());
        let basis = orthonormalize(&columns);

        let mut child = x.to_vec();
        axpy(&mut child, rng.normal(self.sigma_eta), &d);
        for direction in &basis[1..] {
            axpy(&mut child, spread * rng.normal(self.sigma_xi), direction);
        }
        child
    }

    /// Unimodal normal distribution crossover.
    fn undx(&self, population: &Population, rng: &mut EvoRng) -> Vec<f64> {
        let (selected, remaining) = rng.pick_ids(population.len(), self.mu);
        let g = centroid(selected.iter().map(|&i| population.params(i)));

        let diffs: Vec<Vec<f64>> = selected[..self.mu - 1]
            .iter()
            .map(|&i| sub(population.params(i), &g))
            .collect();
        let magnitude = diffs.iter().map(|d| norm(d).powi(2)).sum::<f64>().sqrt();
        if magnitude < UNDX_DEGENERATE_EPS {
            return g;
        }

        let basis = null_space_basis(&diffs, g.len());

        let outsider = remaining[rng.index(remaining.len())];
        let v = sub(population.params(outsider), &g);
        let spread = basis
            .iter()
            .map(|b| dot(&v, b).powi(2))
            .sum::<f64>()
            .sqrt();

        let mut child = g;
        for d in &diffs {
            axpy(&mut child, rng.normal(self.sigma_eta), d);
        }
        for direction in &basis {
            axpy(&mut child, spread * rng.normal(self.sigma_xi), direction);
        }
        child
    }
}

/// Retry `attempt` until it lands inside `bounds`.
///
/// After [`MAX_CROSSOVER_ATTEMPTS`] misses a uniform sample is returned
/// instead; the flag reports whether that happened.
pub fn bounded_offspring<F>(bounds: &Bounds, rng: &mut EvoRng, mut attempt: F) -> (Vec<f64>, bool)
where
    F: FnMut(&mut EvoRng) -> Vec<f64>,
{
    for _ in 0..MAX_CROSSOVER_ATTEMPTS {
        let child = attempt(rng);
        if bounds.contains(&child) {
            return (child, false);
        }
    }
    (rng.uniform_vector(bounds), true)
}
