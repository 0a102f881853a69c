//! Run description consumed by the command line driver.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Bounds, ConfigError, EvaluationMode, EvolverConfig};
use crate::compute::Benchmark;

/// A complete optimization run: engine settings, objective and length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Engine configuration.
    pub evolver: EvolverConfig,
    /// Test function to maximize.
    #[serde(default)]
    pub benchmark: Benchmark,
    /// Generations to run.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Log directory of an earlier run to continue from.
    #[serde(default)]
    pub resume_from: Option<PathBuf>,
}

fn default_generations() -> usize {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        let num_params = 5;
        let mut evolver = EvolverConfig::new(num_params);
        evolver.bounds = Bounds::uniform(num_params, -5.0, 5.0).ok();
        evolver.evaluation = EvaluationMode::Parallel {
            workers: 4,
            overlap: 1,
        };
        evolver.log_dir = Some(PathBuf::from("log"));
        evolver.random_seed = Some(42);

        Self {
            evolver,
            benchmark: Benchmark::default(),
            generations: default_generations(),
            resume_from: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evolver.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_minimal_json() {
        let json = r#"{
            "evolver": {
                "num_params": 3,
                "bounds": { "min": [-1.0, -1.0, -1.0], "max": [1.0, 1.0, 1.0] },
                "crossover": "undx",
                "evaluation": { "mode": "parallel", "workers": 2 }
            },
            "benchmark": "rastrigin"
        }"#;
        let run: RunConfig = serde_json::from_str(json).unwrap();

        assert_eq!(run.generations, 100);
        assert_eq!(run.benchmark, Benchmark::Rastrigin);
        assert_eq!(run.evolver.num_parent, 10);
        assert_eq!(
            run.evolver.evaluation,
            EvaluationMode::Parallel {
                workers: 2,
                overlap: 1
            }
        );
        assert!(run.validate().is_ok());
    }

    #[test]
    fn test_example_roundtrips_through_json() {
        let run = RunConfig::default();
        let json = serde_json::to_string_pretty(&run).unwrap();
        let parsed: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.evolver.num_params, run.evolver.num_params);
        assert_eq!(parsed.evolver.bounds, run.evolver.bounds);
    }
}
