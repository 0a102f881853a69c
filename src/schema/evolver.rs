//! Configuration types for the real-coded evolutionary optimizer.
//!
//! The engine is configured once, validated, and then driven generation by
//! generation. Everything here is plain data with serde support so a run can
//! be described in a JSON file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of top candidates that survive every selection unconditionally.
pub const ELITE_COUNT: usize = 2;

/// Top-level configuration for the evolution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolverConfig {
    /// Dimensionality of a parameter vector (P).
    pub num_params: usize,
    /// Population size (N).
    #[serde(default = "default_num_parent")]
    pub num_parent: usize,
    /// Offspring produced per generation (K).
    #[serde(default = "default_num_offspring")]
    pub num_offspring: usize,
    /// Population slots put at risk per generation (S).
    #[serde(default = "default_num_select")]
    pub num_select: usize,
    /// Crossover arity (number of parents sampled per offspring).
    #[serde(default = "default_mu")]
    pub mu: usize,
    /// Per-dimension parameter bounds.
    #[serde(default)]
    pub bounds: Option<Bounds>,
    /// Crossover operator.
    #[serde(default)]
    pub crossover: CrossoverKind,
    /// Whether offspring go through Gaussian mutation.
    #[serde(default = "default_mutate")]
    pub mutate: bool,
    /// Per-gene mutation probability. `None` uses `0.01 / num_params`.
    #[serde(default)]
    pub mutation_rate: Option<f64>,
    /// How offspring are evaluated.
    #[serde(default)]
    pub evaluation: EvaluationMode,
    /// Directory receiving the generation log and parameter snapshots.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Write a parameter snapshot every Nth generation.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl EvolverConfig {
    /// Configuration with default population settings for `num_params` dimensions.
    ///
    /// Bounds are left unset and must be supplied before running.
    pub fn new(num_params: usize) -> Self {
        Self {
            num_params,
            num_parent: default_num_parent(),
            num_offspring: default_num_offspring(),
            num_select: default_num_select(),
            mu: default_mu(),
            bounds: None,
            crossover: CrossoverKind::default(),
            mutate: default_mutate(),
            mutation_rate: None,
            evaluation: EvaluationMode::default(),
            log_dir: None,
            snapshot_interval: default_snapshot_interval(),
            random_seed: None,
        }
    }

    /// Set parameter bounds.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Per-gene mutation probability actually used by the engine.
    pub fn effective_mutation_rate(&self) -> f64 {
        self.mutation_rate
            .unwrap_or(0.01 / self.num_params.max(1) as f64)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_select > self.num_offspring {
            return Err(ConfigError::TooManySelected {
                select: self.num_select,
                offspring: self.num_offspring,
            });
        }
        if self.num_select < ELITE_COUNT {
            return Err(ConfigError::TooFewSelected(self.num_select));
        }
        if self.num_offspring > self.num_parent {
            return Err(ConfigError::OffspringExceedsPopulation {
                offspring: self.num_offspring,
                parent: self.num_parent,
            });
        }
        if self.mu >= self.num_params {
            return Err(ConfigError::ArityTooLarge {
                mu: self.mu,
                params: self.num_params,
            });
        }
        if self.mu < 2 {
            return Err(ConfigError::ArityTooSmall(self.mu));
        }
        if self.mu >= self.num_parent {
            return Err(ConfigError::PopulationTooSmall {
                parent: self.num_parent,
                mu: self.mu,
            });
        }

        let bounds = self.bounds.as_ref().ok_or(ConfigError::MissingBounds)?;
        bounds.validate()?;
        if bounds.len() != self.num_params {
            return Err(ConfigError::BoundsLength {
                expected: self.num_params,
                found: bounds.len(),
            });
        }

        if let Some(rate) = self.mutation_rate
            && !(0.0..=1.0).contains(&rate)
        {
            return Err(ConfigError::InvalidMutationRate(rate));
        }

        if let EvaluationMode::Parallel { workers, overlap } = self.evaluation
            && (workers == 0 || overlap == 0)
        {
            return Err(ConfigError::InvalidWorkers { workers, overlap });
        }

        if self.snapshot_interval == 0 {
            return Err(ConfigError::InvalidSnapshotInterval);
        }

        Ok(())
    }
}

fn default_num_parent() -> usize {
    10
}
fn default_num_offspring() -> usize {
    5
}
fn default_num_select() -> usize {
    2
}
fn default_mu() -> usize {
    2
}
fn default_mutate() -> bool {
    true
}
fn default_snapshot_interval() -> u64 {
    1
}

/// Box constraints on the parameter space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound per dimension.
    pub min: Vec<f64>,
    /// Upper bound per dimension.
    pub max: Vec<f64>,
}

impl Bounds {
    /// Create validated bounds.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self, ConfigError> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    /// The same `[lo, hi]` interval on every one of `dims` dimensions.
    pub fn uniform(dims: usize, lo: f64, hi: f64) -> Result<Self, ConfigError> {
        Self::new(vec![lo; dims], vec![hi; dims])
    }

    /// Check lengths and ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min.len() != self.max.len() {
            return Err(ConfigError::BoundsLength {
                expected: self.min.len(),
                found: self.max.len(),
            });
        }
        for (index, (&min, &max)) in self.min.iter().zip(&self.max).enumerate() {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(ConfigError::InvalidBounds { index, min, max });
            }
        }
        Ok(())
    }

    /// Number of dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.min.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    /// Width of dimension `i`.
    #[inline]
    pub fn range(&self, i: usize) -> f64 {
        self.max[i] - self.min[i]
    }

    /// True if every component lies inside `[min, max]`.
    pub fn contains(&self, params: &[f64]) -> bool {
        params.len() == self.len()
            && params
                .iter()
                .zip(self.min.iter().zip(&self.max))
                .all(|(&x, (&lo, &hi))| x >= lo && x <= hi)
    }

    /// Clamp a single gene to dimension `i`.
    #[inline]
    pub fn clamp(&self, i: usize, value: f64) -> f64 {
        value.clamp(self.min[i], self.max[i])
    }
}

/// Crossover operator selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossoverKind {
    /// Parent-centric crossover.
    #[default]
    Pcx,
    /// Unimodal normal distribution crossover.
    Undx,
}

impl fmt::Display for CrossoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossoverKind::Pcx => f.write_str("pcx"),
            CrossoverKind::Undx => f.write_str("undx"),
        }
    }
}

impl FromStr for CrossoverKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pcx" => Ok(CrossoverKind::Pcx),
            "undx" => Ok(CrossoverKind::Undx),
            _ => Err(ConfigError::UnknownCrossover(s.to_string())),
        }
    }
}

/// Evaluation backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Evaluate offspring one at a time on the calling thread.
    #[default]
    Sequential,
    /// Evaluate on a dedicated worker pool.
    Parallel {
        /// Worker pool width.
        #[serde(default = "default_workers")]
        workers: usize,
        /// Pool-width multiples dispatched per round.
        #[serde(default = "default_overlap")]
        overlap: usize,
    },
}

fn default_workers() -> usize {
    4
}
fn default_overlap() -> usize {
    1
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("num_select ({select}) cannot exceed num_offspring ({offspring})")]
    TooManySelected { select: usize, offspring: usize },
    #[error("num_select ({0}) must leave room for the two elite seats")]
    TooFewSelected(usize),
    #[error("num_offspring ({offspring}) cannot exceed num_parent ({parent})")]
    OffspringExceedsPopulation { offspring: usize, parent: usize },
    #[error("mu ({mu}) must be smaller than the number of parameters ({params})")]
    ArityTooLarge { mu: usize, params: usize },
    #[error("mu ({0}) must be at least 2")]
    ArityTooSmall(usize),
    #[error("num_parent ({parent}) must be larger than mu ({mu})")]
    PopulationTooSmall { parent: usize, mu: usize },
    #[error("Boundary is not defined")]
    MissingBounds,
    #[error("Expected {expected} bounds, found {found}")]
    BoundsLength { expected: usize, found: usize },
    #[error("Invalid bounds for parameter {index}: [{min}, {max}]")]
    InvalidBounds { index: usize, min: f64, max: f64 },
    #[error("Objective function is not defined")]
    MissingObjective,
    #[error("Crossover type must be pcx or undx, got {0:?}")]
    UnknownCrossover(String),
    #[error("Mutation rate must lie in [0, 1], got {0}")]
    InvalidMutationRate(f64),
    #[error("Parallel evaluation needs at least one worker and overlap ({workers}, {overlap})")]
    InvalidWorkers { workers: usize, overlap: usize },
    #[error("Snapshot interval must be positive")]
    InvalidSnapshotInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> EvolverConfig {
        EvolverConfig::new(4).with_bounds(Bounds::uniform(4, -1.0, 1.0).unwrap())
    }

    #[test]
    fn test_default_config_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_select_larger_than_offspring() {
        let config = EvolverConfig {
            num_select: 6,
            num_offspring: 5,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManySelected {
                select: 6,
                offspring: 5
            })
        );
    }

    #[test]
    fn test_offspring_larger_than_population() {
        let config = EvolverConfig {
            num_parent: 4,
            num_offspring: 5,
            num_select: 2,
            mu: 2,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OffspringExceedsPopulation {
                offspring: 5,
                parent: 4
            })
        );
    }

    #[test]
    fn test_mu_not_below_params() {
        let config = EvolverConfig {
            mu: 4,
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ArityTooLarge { mu: 4, params: 4 })
        ));
    }

    #[test]
    fn test_missing_bounds() {
        let config = EvolverConfig::new(4);
        assert_eq!(config.validate(), Err(ConfigError::MissingBounds));
    }

    #[test]
    fn test_bounds_length_mismatch() {
        let config = EvolverConfig::new(3).with_bounds(Bounds::uniform(4, 0.0, 1.0).unwrap());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BoundsLength {
                expected: 3,
                found: 4
            })
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = Bounds::new(vec![0.0, 1.0], vec![1.0, 0.5]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { index: 1, .. }));
    }

    #[test]
    fn test_crossover_from_str() {
        assert_eq!("PCX".parse::<CrossoverKind>(), Ok(CrossoverKind::Pcx));
        assert_eq!("undx".parse::<CrossoverKind>(), Ok(CrossoverKind::Undx));
        assert_eq!(
            "blx".parse::<CrossoverKind>(),
            Err(ConfigError::UnknownCrossover("blx".to_string()))
        );
    }

    #[test]
    fn test_parallel_requires_workers() {
        let config = EvolverConfig {
            evaluation: EvaluationMode::Parallel {
                workers: 0,
                overlap: 1,
            },
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers { .. })
        ));
    }

    #[test]
    fn test_effective_mutation_rate() {
        let config = valid_config();
        assert!((config.effective_mutation_rate() - 0.0025).abs() < 1e-12);

        let forced = EvolverConfig {
            mutation_rate: Some(1.0),
            ..valid_config()
        };
        assert_eq!(forced.effective_mutation_rate(), 1.0);
    }

    #[test]
    fn test_serialization() {
        let config = valid_config();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.num_parent, config.num_parent);
        assert_eq!(parsed.bounds, config.bounds);

        let minimal: EvolverConfig = serde_json::from_str(
            r#"{"num_params": 3, "crossover": "undx",
                "evaluation": {"mode": "parallel", "workers": 2}}"#,
        )
        .unwrap();
        assert_eq!(minimal.crossover, CrossoverKind::Undx);
        assert_eq!(
            minimal.evaluation,
            EvaluationMode::Parallel {
                workers: 2,
                overlap: 1
            }
        );
        assert_eq!(minimal.num_offspring, 5);
    }
}
