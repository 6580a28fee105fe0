use std::fmt;
use std::time::{Duration, Instant};

use core_sim::{
    AggregateResult, MonteCarloEngine, SimConfig, SimConfigError, StatsError, SummaryStatistics,
};

use crate::logging::{RunLogEvent, RunLogEventKind, RunLogWriter};
use crate::metrics::{duration_nanos, RunLatencySummary, RunTimings};

pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentError {
    Config(SimConfigError),
    Stats(StatsError),
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid simulation config: {err}"),
            Self::Stats(err) => write!(f, "cannot summarize experiment: {err}"),
        }
    }
}

impl std::error::Error for ExperimentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Stats(err) => Some(err),
        }
    }
}

impl From<SimConfigError> for ExperimentError {
    fn from(err: SimConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<StatsError> for ExperimentError {
    fn from(err: StatsError) -> Self {
        Self::Stats(err)
    }
}

#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub aggregate: AggregateResult,
    pub summary: SummaryStatistics,
    pub elapsed: Duration,
    pub runs_per_sec: u64,
    /// Only measured for sequential execution.
    pub run_latency: Option<RunLatencySummary>,
}

/// Drives a [`MonteCarloEngine`] and journals its progress.
#[derive(Debug, Clone)]
pub struct ExperimentEngine {
    engine: MonteCarloEngine,
    mode: ExecutionMode,
    progress_interval: usize,
}

impl ExperimentEngine {
    pub fn new(config: SimConfig) -> Result<Self, ExperimentError> {
        Ok(Self {
            engine: MonteCarloEngine::new(config)?,
            mode: ExecutionMode::Sequential,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        })
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// `0` disables progress entries.
    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn config(&self) -> &SimConfig {
        self.engine.config()
    }

    pub fn base_seed(&self) -> u64 {
        self.engine.base_seed()
    }

    pub fn run(&self, log: &mut dyn RunLogWriter) -> Result<ExperimentOutcome, ExperimentError> {
        let num_runs = self.engine.config().num_runs;
        log.write(RunLogEvent::new(0, RunLogEventKind::ExperimentStarted));

        let started = Instant::now();
        let (aggregate, run_latency) = match self.mode {
            ExecutionMode::Sequential => {
                let (aggregate, timings) = self.run_sequential(log);
                (aggregate, timings.summary())
            }
            ExecutionMode::Parallel => (self.engine.run_parallel(), None),
        };
        let elapsed = started.elapsed();

        let summary = aggregate.summary()?;
        let mut completed = RunLogEvent::new(num_runs as u64, RunLogEventKind::ExperimentCompleted);
        completed.elapsed_nanos = Some(duration_nanos(elapsed));
        log.write(completed);

        Ok(ExperimentOutcome {
            aggregate,
            summary,
            elapsed,
            runs_per_sec: runs_per_sec(num_runs, elapsed),
            run_latency,
        })
    }

    fn run_sequential(&self, log: &mut dyn RunLogWriter) -> (AggregateResult, RunTimings) {
        let mut timings = RunTimings::with_capacity(self.engine.config().num_runs);
        let mut last = Instant::now();

        let aggregate = self.engine.run_observed(|run_index, run| {
            let now = Instant::now();
            let took = now.duration_since(last);
            last = now;

            timings.record(took);
            log.write(RunLogEvent::run_completed(
                run_index as u64,
                run.final_difference(),
                duration_nanos(took),
            ));

            let completed_runs = run_index + 1;
            if self.progress_interval > 0 && completed_runs % self.progress_interval == 0 {
                log.write(RunLogEvent::new(
                    completed_runs as u64,
                    RunLogEventKind::ProgressReported,
                ));
            }
        });

        (aggregate, timings)
    }
}

/// Whole runs per second, rounded down; `0` when no time was measured.
fn runs_per_sec(completed_runs: usize, elapsed: Duration) -> u64 {
    let seconds = elapsed.as_secs_f64();
    if seconds == 0.0 {
        return 0;
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    (completed_runs as f64 / seconds) as u64
}
