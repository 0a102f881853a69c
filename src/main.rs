//! genalg CLI - Run an optimization from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use genalg::{compute::Evolver, schema::RunConfig};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Maximize a benchmark function with the real-coded genetic algorithm.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!("  generations  Overrides the configured generation count");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut run: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });
    if let Some(generations) = args.get(2).and_then(|s| s.parse().ok()) {
        run.generations = generations;
    }

    if let Err(e) = run.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let config = &run.evolver;
    println!("Real-coded Genetic Algorithm");
    println!("============================");
    println!("Objective: {:?}", run.benchmark);
    println!("Parameters: {}", config.num_params);
    println!(
        "Population: {} parents, {} offspring, {} selected",
        config.num_parent, config.num_offspring, config.num_select
    );
    println!("Crossover: {} (mu = {})", config.crossover, config.mu);
    println!("Generations: {}", run.generations);
    println!();

    let mut evolver = Evolver::new(run.evolver.clone())
        .unwrap_or_else(|e| {
            eprintln!("Error creating engine: {}", e);
            std::process::exit(1);
        })
        .with_objective(run.benchmark);

    if let Some(dir) = &run.resume_from {
        if let Err(e) = evolver.resume(dir) {
            eprintln!("Error resuming from {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        println!(
            "Resumed at generation {} from {}",
            evolver.clock(),
            dir.display()
        );
    }

    println!("Running...");
    let start = Instant::now();
    let generations = run.generations;
    let interval = (generations / 10).max(1);
    let mut done = 0usize;

    let summary = evolver
        .run_with_callback(generations, |report| {
            done += 1;
            // Print progress every 10%
            if done % interval == 0 {
                let elapsed = start.elapsed().as_secs_f32();
                println!(
                    "  Generation {}: best={:.6}, mean={:.6}, {:.1} gen/s",
                    report.generation,
                    report.best_fitness,
                    report.mean_fitness,
                    done as f32 / elapsed
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("Final population:");
    println!("  Best fitness: {:.6}", summary.best_fitness);
    println!("  Best params: {:?}", summary.best_params);
    println!("  Evaluations: {}", summary.evaluations);
    println!(
        "Time: {:.2}s ({:.1} gen/s)",
        summary.elapsed_seconds,
        generations as f64 / summary.elapsed_seconds.max(f64::EPSILON)
    );
}

fn print_example_config() {
    let run = RunConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&run) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
