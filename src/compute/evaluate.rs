//! Objective functions and batch evaluation backends.

use std::fmt;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::schema::EvaluationMode;

/// A failure reported by an objective function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ObjectiveError(pub String);

impl ObjectiveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The function being maximized.
///
/// Implemented for any `Fn(&[f64], u64) -> f64` closure; implement it
/// directly when evaluation can fail.
pub trait Objective: Send + Sync {
    /// Score `params`. `job_id` is unique per evaluation within an engine.
    fn evaluate(&self, params: &[f64], job_id: u64) -> Result<f64, ObjectiveError>;
}

impl<F> Objective for F
where
    F: Fn(&[f64], u64) -> f64 + Send + Sync,
{
    fn evaluate(&self, params: &[f64], job_id: u64) -> Result<f64, ObjectiveError> {
        Ok(self(params, job_id))
    }
}

/// One pending evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Job<'a> {
    pub params: &'a [f64],
    pub job_id: u64,
}

/// Batch evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Objective failed for job {job_id}: {source}")]
    Objective {
        job_id: u64,
        #[source]
        source: ObjectiveError,
    },
    #[error("Failed to build evaluation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn run_job(objective: &dyn Objective, job: &Job<'_>) -> Result<f64, EvaluationError> {
    objective
        .evaluate(job.params, job.job_id)
        .map_err(|source| EvaluationError::Objective {
            job_id: job.job_id,
            source,
        })
}

/// Strategy for evaluating a batch of jobs.
///
/// Results are returned in job order. Any failure aborts the whole batch.
pub trait BatchEvaluator: Send + Sync {
    fn evaluate_batch(
        &self,
        objective: &dyn Objective,
        jobs: &[Job<'_>],
    ) -> Result<Vec<f64>, EvaluationError>;
}

/// Evaluates jobs one at a time on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialEvaluator;

impl BatchEvaluator for SequentialEvaluator {
    fn evaluate_batch(
        &self,
        objective: &dyn Objective,
        jobs: &[Job<'_>],
    ) -> Result<Vec<f64>, EvaluationError> {
        jobs.iter().map(|job| run_job(objective, job)).collect()
    }
}

/// Evaluates jobs on a dedicated rayon pool.
///
/// Jobs are dispatched in rounds of `workers * overlap`.
pub struct ParallelEvaluator {
    pool: ThreadPool,
    workers: usize,
    overlap: usize,
}

impl ParallelEvaluator {
    pub fn new(workers: usize, overlap: usize) -> Result<Self, EvaluationError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("genalg-eval-{i}"))
            .build()?;
        Ok(Self {
            pool,
            workers,
            overlap: overlap.max(1),
        })
    }

    /// Jobs dispatched per round.
    pub fn chunk_size(&self) -> usize {
        (self.workers * self.overlap).max(1)
    }
}

impl fmt::Debug for ParallelEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelEvaluator")
            .field("workers", &self.workers)
            .field("overlap", &self.overlap)
            .finish()
    }
}

impl BatchEvaluator for ParallelEvaluator {
    fn evaluate_batch(
        &self,
        objective: &dyn Objective,
        jobs: &[Job<'_>],
    ) -> Result<Vec<f64>, EvaluationError> {
        let mut results = Vec::with_capacity(jobs.len());
        for chunk in jobs.chunks(self.chunk_size()) {
            let scores = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|job| run_job(objective, job))
                    .collect::<Result<Vec<f64>, _>>()
            })?;
            results.extend(scores);
        }
        Ok(results)
    }
}

/// Build the evaluator described by `mode`.
pub fn evaluator_for(mode: EvaluationMode) -> Result<Box<dyn BatchEvaluator>, EvaluationError> {
    Ok(match mode {
        EvaluationMode::Sequential => Box::new(SequentialEvaluator),
        EvaluationMode::Parallel { workers, overlap } => {
            Box::new(ParallelEvaluator::new(workers, overlap)?)
        }
    })
}

/// Standard test functions, negated so that larger is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Benchmark {
    /// `-Σ x²`, maximum 0 at the origin.
    #[default]
    Sphere,
    /// Negated Rastrigin with `A = 10`, maximum 0 at the origin.
    Rastrigin,
    /// Negated generalized Rosenbrock, maximum 0 at `(1, ..., 1)`.
    Rosenbrock,
}

impl Benchmark {
    pub fn score(&self, x: &[f64]) -> f64 {
        match self {
            Benchmark::Sphere => -x.iter().map(|v| v * v).sum::<f64>(),
            Benchmark::Rastrigin => {
                const A: f64 = 10.0;
                let sum: f64 = x
                    .iter()
                    .map(|v| v * v - A * (2.0 * std::f64::consts::PI * v).cos())
                    .sum();
                -(A * x.len() as f64 + sum)
            }
            Benchmark::Rosenbrock => -x
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (w[0] - 1.0).powi(2))
                .sum::<f64>(),
        }
    }
}

impl Objective for Benchmark {
    fn evaluate(&self, params: &[f64], _job_id: u64) -> Result<f64, ObjectiveError> {
        Ok(self.score(params))
    }
}
