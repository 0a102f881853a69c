//! Progress and result types produced by the evolution engine.

use serde::{Deserialize, Serialize};

/// Outcome of one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Generation counter after this step.
    pub generation: u64,
    /// Best non-NaN fitness in the population (NaN if none).
    pub best_fitness: f64,
    /// Mean non-NaN fitness in the population (NaN if none).
    pub mean_fitness: f64,
    /// Population slots overwritten by offspring.
    pub replacements: usize,
    /// Offspring that fell back to a uniform sample after repeated bound violations.
    pub fallbacks: usize,
    /// Genes perturbed by mutation.
    pub mutated_genes: usize,
    /// Job id of the first offspring in this generation.
    pub first_job_id: u64,
}

/// Per-generation fitness history for plotting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness per generation.
    pub mean_fitness: Vec<f64>,
}

impl EvolutionHistory {
    pub fn push(&mut self, best: f64, mean: f64) {
        self.best_fitness.push(best);
        self.mean_fitness.push(mean);
    }

    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSummary {
    /// Generation counter at the end of the run.
    pub generations: u64,
    /// Job ids handed out so far.
    pub evaluations: u64,
    /// Best fitness in the final population.
    pub best_fitness: f64,
    /// Parameters of the best individual.
    pub best_params: Vec<f64>,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}
