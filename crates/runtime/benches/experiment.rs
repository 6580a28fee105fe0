use criterion::{black_box, criterion_group, criterion_main, Criterion};
use core_sim::SimConfig;
use runtime::{logging::InMemoryRunLogWriter, ExecutionMode, ExperimentEngine};

const BENCH_RUNS: usize = 500;

fn bench_journaled_experiment(c: &mut Criterion) {
    let config = SimConfig {
        num_runs: BENCH_RUNS,
        ..SimConfig::default()
    }
    .with_seed(11);
    let engine = ExperimentEngine::new(config).expect("bench config should be valid");

    let outcome = engine
        .run(&mut InMemoryRunLogWriter::new())
        .expect("bench experiment should summarize");
    if let Some(report) = outcome.run_latency {
        println!(
            "runs_per_sec={} mean_nanos={} p50_nanos={} p95_nanos={} p99_nanos={} max_nanos={} samples={}",
            outcome.runs_per_sec,
            report.mean_nanos,
            report.p50_nanos,
            report.p95_nanos,
            report.p99_nanos,
            report.max_nanos,
            report.count
        );
    }

    c.bench_function("experiment_sequential_journaled", |b| {
        b.iter(|| {
            let mut log = InMemoryRunLogWriter::new();
            black_box(engine.run(&mut log).expect("experiment should summarize"));
        });
    });

    let parallel = engine.clone().with_mode(ExecutionMode::Parallel);
    c.bench_function("experiment_parallel", |b| {
        b.iter(|| {
            let mut log = InMemoryRunLogWriter::new();
            black_box(parallel.run(&mut log).expect("experiment should summarize"));
        });
    });
}

criterion_group!(benches, bench_journaled_experiment);
criterion_main!(benches);
