mod config;
mod wiring;

use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use core_sim::AggregateResult;
use runtime::export::{FinalDifferencesCsvWriter, TrajectoryCsvWriter};
use runtime::logging::{RunLogWriter, TracingRunLogWriter};
use runtime::report::{format_summary_report, render_histogram, Histogram, DEFAULT_HISTOGRAM_BINS};
use runtime::{ExecutionMode, ExperimentEngine, ExperimentOutcome};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, RunMode};

const TRAJECTORIES_FILE: &str = "trajectories.csv";
const FINAL_DIFFERENCES_FILE: &str = "final_differences.csv";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(mode = config.mode.as_str(), "drag-lab starting");

    match config.mode {
        RunMode::Report => print!("{}", run_report(&config)?),
        RunMode::Serve => {
            let listener = TcpListener::bind(config.listen_addr).await?;
            tracing::info!(addr = %config.listen_addr, "serving experiments");
            axum::serve(listener, wiring::build_app(config.simulation)).await?;
        }
    }
    Ok(())
}

fn run_report(config: &Config) -> Result<String, Box<dyn Error>> {
    let mode = if config.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };
    let engine = ExperimentEngine::new(config.simulation)?.with_mode(mode);
    let mut run_log = TracingRunLogWriter;
    let outcome = engine.run(&mut run_log)?;

    write_artifacts(Path::new(&config.output_dir), &outcome.aggregate, &mut run_log)?;
    Ok(render_report(&outcome, config.simulation.num_ticks))
}

fn write_artifacts(
    output_dir: &Path,
    aggregate: &AggregateResult,
    run_log: &mut dyn RunLogWriter,
) -> Result<(), std::io::Error> {
    fs::create_dir_all(output_dir)?;

    let trajectories = BufWriter::new(File::create(output_dir.join(TRAJECTORIES_FILE))?);
    TrajectoryCsvWriter::new(trajectories).write_aggregate_and_log(aggregate, run_log)?;

    let differences = BufWriter::new(File::create(output_dir.join(FINAL_DIFFERENCES_FILE))?);
    FinalDifferencesCsvWriter::new(differences)
        .write_all_and_log(aggregate.final_differences(), run_log)?;
    Ok(())
}

fn render_report(outcome: &ExperimentOutcome, num_ticks: usize) -> String {
    let mut report = format_summary_report(&outcome.summary, num_ticks);
    if let Some(base_seed) = outcome.aggregate.base_seed() {
        report.push_str(&format!("Base seed: {base_seed}\n"));
    }
    report.push_str(&format!("Throughput: {} runs/sec\n", outcome.runs_per_sec));
    if let Some(histogram) =
        Histogram::from_samples(outcome.aggregate.final_differences(), DEFAULT_HISTOGRAM_BINS)
    {
        report.push_str("\nDistribution of final differences\n");
        report.push_str(&render_histogram(&histogram));
    }
    report
}
