//! genalg - Real-coded genetic algorithm for black-box maximization.
//!
//! Offspring are produced by parent-centric (PCX) or unimodal normal
//! distribution (UNDX) crossover over randomly chosen parents, optionally
//! mutated, evaluated in batches, and then compete with a random subset of
//! the population for its slots using elitist roulette selection.
//!
//! # Architecture
//!
//! - `schema`: Configuration, run descriptions and reports
//! - `compute`: Population store, operators, evaluation and the engine
//! - `history`: Generation log and parameter snapshots for resuming runs
//!
//! # Example
//!
//! ```rust,no_run
//! use genalg::{
//!     compute::Evolver,
//!     schema::{Bounds, EvolverConfig},
//! };
//!
//! let config = EvolverConfig::new(3).with_bounds(Bounds::uniform(3, -5.0, 5.0)?);
//! let mut evolver = Evolver::new(config)?
//!     .with_objective(|x: &[f64], _job_id: u64| -x.iter().map(|v| v * v).sum::<f64>());
//!
//! let summary = evolver.run(200)?;
//! println!("Best fitness after 200 generations: {}", summary.best_fitness);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod history;
pub mod schema;

// Re-export commonly used types
pub use compute::{Benchmark, EvolveError, Evolver, Objective, Population};
pub use schema::{Bounds, CrossoverKind, EvolverConfig, RunConfig};
