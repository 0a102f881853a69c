//! Fixed-size population store.

use std::fmt;

use super::rng::EvoRng;
use crate::schema::Bounds;

/// Where an individual's current values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lineage {
    /// Drawn during initialization, never replaced.
    Initial,
    /// Produced by the offspring evaluated under this job id.
    Job(u64),
}

impl Lineage {
    /// Integer form used in the history log (`-1` for initial individuals).
    pub fn as_raw(self) -> i64 {
        match self {
            Lineage::Initial => -1,
            Lineage::Job(id) => id as i64,
        }
    }

    /// Inverse of [`Lineage::as_raw`]; any negative value is `Initial`.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Lineage::Initial
        } else {
            Lineage::Job(raw as u64)
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// One member of the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// Parameter vector.
    pub params: Vec<f64>,
    /// Fitness score; NaN until evaluated or when evaluation was invalid.
    pub fitness: f64,
    /// Lineage tag.
    pub lineage: Lineage,
}

/// Ordered collection of exactly `N` individuals addressed by slot.
#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Fill `size` slots with uniform samples inside the bounds.
    pub fn random(size: usize, bounds: &Bounds, rng: &mut EvoRng) -> Self {
        let individuals = (0..size)
            .map(|_| Individual {
                params: rng.uniform_vector(bounds),
                fitness: f64::NAN,
                lineage: Lineage::Initial,
            })
            .collect();
        Self { individuals }
    }

    /// Build from existing individuals.
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Read-only view of one slot.
    #[inline]
    pub fn get(&self, slot: usize) -> &Individual {
        &self.individuals[slot]
    }

    /// Parameter vector of one slot.
    #[inline]
    pub fn params(&self, slot: usize) -> &[f64] {
        &self.individuals[slot].params
    }

    /// Overwrite one slot.
    pub fn replace(&mut self, slot: usize, params: Vec<f64>, fitness: f64, lineage: Lineage) {
        self.individuals[slot] = Individual {
            params,
            fitness,
            lineage,
        };
    }

    /// Set the fitness of one slot without touching its vector or lineage.
    pub(crate) fn set_fitness(&mut self, slot: usize, fitness: f64) {
        self.individuals[slot].fitness = fitness;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    /// Slot holding the highest non-NaN fitness.
    pub fn best_slot(&self) -> Option<usize> {
        self.individuals
            .iter()
            .enumerate()
            .filter(|(_, ind)| !ind.fitness.is_nan())
            .max_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(slot, _)| slot)
    }

    /// Highest non-NaN fitness, if any.
    pub fn best_fitness(&self) -> Option<f64> {
        self.best_slot().map(|slot| self.individuals[slot].fitness)
    }

    /// Mean over non-NaN fitness values.
    pub fn mean_fitness(&self) -> Option<f64> {
        let valid: Vec<f64> = self
            .individuals
            .iter()
            .map(|ind| ind.fitness)
            .filter(|f| !f.is_nan())
            .collect();
        if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        }
    }
}
