//! Generational evolution engine.
//!
//! Each [`Evolver::step`] produces `num_offspring` children by crossover and
//! optional mutation, evaluates them, puts `num_select` random population
//! slots at risk, and lets offspring and incumbents compete for those slots.
//! Nothing is written to the population until the whole batch has been
//! evaluated.

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};

use super::crossover::Crossover;
use super::evaluate::{BatchEvaluator, EvaluationError, Job, Objective, evaluator_for};
use super::mutation::Mutation;
use super::population::{Individual, Lineage, Population};
use super::rng::EvoRng;
use super::selection::{PoolEntry, plan_replacements, select_survivors};
use crate::history::{HistoryError, HistoryLog, HistoryRecorder};
use crate::schema::{
    Bounds, ConfigError, EvolutionHistory, EvolutionSummary, EvolverConfig, GenerationReport,
};

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EvolveError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("History error: {0}")]
    History(#[from] HistoryError),
    #[error("Population is not initialized")]
    NotInitialized,
}

/// Real-coded genetic algorithm driver.
pub struct Evolver {
    config: EvolverConfig,
    rng: EvoRng,
    objective: Option<Box<dyn Objective>>,
    evaluator: Box<dyn BatchEvaluator>,
    recorder: Option<HistoryRecorder>,
    population: Option<Population>,
    history: EvolutionHistory,
    job_id: u64,
    clock: u64,
}

impl Evolver {
    /// Create an engine. Bounds and objective may be supplied later.
    pub fn new(config: EvolverConfig) -> Result<Self, EvolveError> {
        let rng = match config.random_seed {
            Some(seed) => EvoRng::new(seed),
            None => EvoRng::random(),
        };
        let evaluator = evaluator_for(config.evaluation)?;
        let recorder = config
            .log_dir
            .as_ref()
            .map(|dir| HistoryRecorder::new(dir, config.snapshot_interval))
            .transpose()?;

        Ok(Self {
            config,
            rng,
            objective: None,
            evaluator,
            recorder,
            population: None,
            history: EvolutionHistory::default(),
            job_id: 0,
            clock: 0,
        })
    }

    /// Bind the objective function.
    pub fn with_objective<O: Objective + 'static>(mut self, objective: O) -> Self {
        self.set_objective(objective);
        self
    }

    pub fn set_objective<O: Objective + 'static>(&mut self, objective: O) {
        self.objective = Some(Box::new(objective));
    }

    /// Replace the evaluation backend chosen from the configuration.
    pub fn with_evaluator(mut self, evaluator: Box<dyn BatchEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Set parameter bounds; their length must match `num_params`.
    pub fn set_bounds(&mut self, min: Vec<f64>, max: Vec<f64>) -> Result<(), ConfigError> {
        let bounds = Bounds::new(min, max)?;
        if bounds.len() != self.config.num_params {
            return Err(ConfigError::BoundsLength {
                expected: self.config.num_params,
                found: bounds.len(),
            });
        }
        self.config.bounds = Some(bounds);
        Ok(())
    }

    /// Check that the engine is ready to run.
    pub fn check_setting(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        if self.objective.is_none() {
            return Err(ConfigError::MissingObjective);
        }
        Ok(())
    }

    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    /// Current population, if initialized or resumed.
    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Completed generations.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Job id the next evaluation will receive.
    pub fn next_job_id(&self) -> u64 {
        self.job_id
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Best individual in the population.
    pub fn best(&self) -> Option<&Individual> {
        let population = self.population.as_ref()?;
        population.best_slot().map(|slot| population.get(slot))
    }

    /// Draw a fresh uniform population and evaluate it.
    ///
    /// Initial individuals keep the `Initial` lineage. The population is only
    /// installed once every evaluation has succeeded.
    pub fn initialize(&mut self) -> Result<(), EvolveError> {
        self.check_setting()?;
        let (Some(bounds), Some(objective)) = (&self.config.bounds, &self.objective) else {
            return Err(EvolveError::NotInitialized);
        };

        let mut population = Population::random(self.config.num_parent, bounds, &mut self.rng);
        let first = self.job_id;
        self.job_id += population.len() as u64;

        let jobs: Vec<Job<'_>> = population
            .iter()
            .enumerate()
            .map(|(i, ind)| Job {
                params: &ind.params,
                job_id: first + i as u64,
            })
            .collect();
        let scores = self.evaluator.evaluate_batch(&**objective, &jobs)?;
        drop(jobs);
        for (slot, fitness) in scores.into_iter().enumerate() {
            population.set_fitness(slot, fitness);
        }

        info!(
            "Initialized population of {} ({} params, {} crossover), best fitness {:.6}",
            population.len(),
            self.config.num_params,
            self.config.crossover,
            population.best_fitness().unwrap_or(f64::NAN)
        );

        self.population = Some(population);
        self.history = EvolutionHistory::default();
        self.clock = 0;
        Ok(())
    }

    /// Run one generation.
    ///
    /// Configuration and evaluation errors leave the engine untouched. An
    /// [`EvolveError::History`] is raised after the commit: the generation
    /// counts, only its log line or snapshot is missing.
    pub fn step(&mut self) -> Result<GenerationReport, EvolveError> {
        self.check_setting()?;
        let config = &self.config;
        let (Some(bounds), Some(objective)) = (&config.bounds, &self.objective) else {
            return Err(EvolveError::NotInitialized);
        };
        let population = self.population.as_ref().ok_or(EvolveError::NotInitialized)?;
        let rng = &mut self.rng;

        // Offspring
        let crossover = Crossover::new(config.crossover, config.mu, config.num_parent);
        let mut fallbacks = 0;
        let mut offspring = Vec::with_capacity(config.num_offspring);
        for _ in 0..config.num_offspring {
            let (child, fell_back) = crossover.generate_bounded(population, bounds, rng);
            fallbacks += usize::from(fell_back);
            offspring.push(child);
        }
        if fallbacks > 0 {
            warn!(
                "Generation {}: {} offspring fell back to uniform samples",
                self.clock + 1,
                fallbacks
            );
        }

        let mutated_genes = if config.mutate {
            Mutation::new(config.effective_mutation_rate()).apply(&mut offspring, bounds, rng)
        } else {
            0
        };

        // Evaluation. Job ids are consumed even if the batch fails.
        let first_job_id = self.job_id;
        self.job_id += offspring.len() as u64;
        let jobs: Vec<Job<'_>> = offspring
            .iter()
            .enumerate()
            .map(|(i, params)| Job {
                params,
                job_id: first_job_id + i as u64,
            })
            .collect();
        let scores = self.evaluator.evaluate_batch(&**objective, &jobs)?;
        drop(jobs);

        // Competition between offspring and the incumbents of the at-risk slots.
        let (at_risk, _) = rng.pick_ids(config.num_parent, config.num_select);
        let mut pool: Vec<PoolEntry> = offspring
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(i, (params, fitness))| PoolEntry::Offspring {
                params,
                fitness,
                job_id: first_job_id + i as u64,
            })
            .collect();
        pool.extend(at_risk.iter().map(|&slot| PoolEntry::Incumbent {
            slot,
            fitness: population.get(slot).fitness,
        }));

        let pool_fitness: Vec<f64> = pool.iter().map(PoolEntry::fitness).collect();
        let winners = select_survivors(&pool_fitness, config.num_select, rng);
        if winners.len() < config.num_select {
            warn!(
                "Generation {}: only {} valid candidates for {} seats",
                self.clock + 1,
                winners.len(),
                config.num_select
            );
        }
        let plan = plan_replacements(&pool, &winners, &at_risk);

        // Commit
        let population = self.population.as_mut().ok_or(EvolveError::NotInitialized)?;
        for replacement in &plan {
            if let PoolEntry::Offspring {
                params,
                fitness,
                job_id,
            } = &mut pool[replacement.pool_index]
            {
                population.replace(
                    replacement.slot,
                    std::mem::take(params),
                    *fitness,
                    Lineage::Job(*job_id),
                );
            }
        }
        self.clock += 1;

        let best_fitness = population.best_fitness().unwrap_or(f64::NAN);
        let mean_fitness = population.mean_fitness().unwrap_or(f64::NAN);
        self.history.push(best_fitness, mean_fitness);

        debug!(
            "Generation {}: best={:.6} mean={:.6} replaced={} fallbacks={} mutated={}",
            self.clock,
            best_fitness,
            mean_fitness,
            plan.len(),
            fallbacks,
            mutated_genes
        );

        if let Some(recorder) = &self.recorder {
            recorder.record(self.clock, population, self.job_id)?;
        }

        Ok(GenerationReport {
            generation: self.clock,
            best_fitness,
            mean_fitness,
            replacements: plan.len(),
            fallbacks,
            mutated_genes,
            first_job_id,
        })
    }

    /// Run `max_iter` generations, initializing first if needed.
    pub fn run(&mut self, max_iter: usize) -> Result<EvolutionSummary, EvolveError> {
        self.run_with_callback(max_iter, |_| {})
    }

    /// Run `max_iter` generations with a progress callback.
    pub fn run_with_callback<F>(
        &mut self,
        max_iter: usize,
        mut callback: F,
    ) -> Result<EvolutionSummary, EvolveError>
    where
        F: FnMut(&GenerationReport),
    {
        let start_time = Instant::now();
        self.check_setting()?;
        if self.population.is_none() {
            self.initialize()?;
        }

        for _ in 0..max_iter {
            let report = self.step()?;
            callback(&report);
        }

        let best = self.best().cloned();
        let summary = EvolutionSummary {
            generations: self.clock,
            evaluations: self.job_id,
            best_fitness: best.as_ref().map_or(f64::NAN, |b| b.fitness),
            best_params: best.map(|b| b.params).unwrap_or_default(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
            history: self.history.clone(),
        };

        info!(
            "Finished at generation {} after {} evaluations: best fitness {:.6}",
            summary.generations, summary.evaluations, summary.best_fitness
        );
        Ok(summary)
    }

    /// Restore the newest snapshot recorded in `dir`.
    ///
    /// With `snapshot_interval > 1` the last logged generations may have no
    /// snapshot; the engine then resumes from the newest one and the log is
    /// cut back to it. Nothing is modified unless the stored history matches
    /// this engine's dimensions.
    pub fn resume<P: AsRef<Path>>(&mut self, dir: P) -> Result<(), EvolveError> {
        let dir = dir.as_ref();
        let mut log = HistoryLog::open(dir)?;
        let snapshot = log.latest_snapshot()?;
        let generation = snapshot.header.generation;

        let stored = snapshot.header.num_params as usize;
        if stored != self.config.num_params {
            return Err(HistoryError::DimensionMismatch {
                stored,
                expected: self.config.num_params,
            }
            .into());
        }
        let n = self.config.num_parent;
        for stored in [
            snapshot.params.len(),
            snapshot.lineage.len(),
            snapshot.fitness.len(),
        ] {
            if stored != n {
                return Err(HistoryError::PopulationMismatch {
                    stored,
                    expected: n,
                }
                .into());
            }
        }

        if generation < log.len() as u64 {
            warn!(
                "No snapshot after generation {}; resuming from generation {}",
                log.len(),
                generation
            );
        }
        log.truncate(generation as usize);

        let individuals = snapshot
            .params
            .into_iter()
            .zip(snapshot.lineage)
            .zip(snapshot.fitness)
            .map(|((params, lineage), fitness)| Individual {
                params,
                fitness,
                lineage,
            })
            .collect();

        if let Some(recorder) = &self.recorder {
            recorder.adopt_log(dir, log.len())?;
        }

        let mut history = EvolutionHistory::default();
        for (best, mean) in log.best_fitness().into_iter().zip(log.mean_fitness()) {
            history.push(best, mean);
        }

        self.population = Some(Population::from_individuals(individuals));
        self.history = history;
        self.clock = generation;
        self.job_id = snapshot.header.next_job_id;

        info!(
            "Resumed from {} at generation {} (next job id {})",
            dir.display(),
            self.clock,
            self.job_id
        );
        Ok(())
    }
}
