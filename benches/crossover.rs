//! Benchmarks for offspring generation and selection.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use genalg::{
    compute::{Crossover, EvoRng, Population, select_survivors},
    schema::{Bounds, CrossoverKind},
};

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");

    for kind in [CrossoverKind::Pcx, CrossoverKind::Undx] {
        for num_params in [5, 20, 80] {
            let bounds = Bounds::uniform(num_params, -5.0, 5.0).unwrap();
            let mut rng = EvoRng::new(7);
            let population = Population::random(50, &bounds, &mut rng);
            let crossover = Crossover::new(kind, 3, population.len());

            group.bench_with_input(
                BenchmarkId::new(kind.to_string(), format!("{}_params", num_params)),
                &num_params,
                |b, _| {
                    b.iter(|| {
                        black_box(crossover.generate_bounded(
                            black_box(&population),
                            &bounds,
                            &mut rng,
                        ));
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for pool in [8, 64, 512] {
        let fitness: Vec<f64> = (0..pool).map(|i| -((i * 37 % pool) as f64)).collect();
        let mut rng = EvoRng::new(11);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_candidates", pool)),
            &pool,
            |b, _| {
                b.iter(|| {
                    black_box(select_survivors(black_box(&fitness), pool / 4, &mut rng));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_crossover, bench_selection);
criterion_main!(benches);
