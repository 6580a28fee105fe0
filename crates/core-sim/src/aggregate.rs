use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{SimConfig, SimConfigError};
use crate::run::{simulate_validated, RunResult};
use crate::sampler::{daily_return_distribution, NormalReturnSampler, ReturnSampler};
use crate::stats::{StatsError, SummaryStatistics};

/// All runs of one experiment plus the per-run final differences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    runs: Vec<RunResult>,
    final_differences: Vec<f64>,
    base_seed: Option<u64>,
}

impl AggregateResult {
    pub fn with_capacity(num_runs: usize, base_seed: Option<u64>) -> Self {
        Self {
            runs: Vec::with_capacity(num_runs),
            final_differences: Vec::with_capacity(num_runs),
            base_seed,
        }
    }

    pub fn push(&mut self, run: RunResult) {
        self.final_differences.push(run.final_difference());
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[RunResult] {
        &self.runs
    }

    pub fn final_differences(&self) -> &[f64] {
        &self.final_differences
    }

    /// Seed the per-run streams were derived from. `None` when the runs
    /// shared a caller-supplied sampler.
    pub fn base_seed(&self) -> Option<u64> {
        self.base_seed
    }

    pub fn summary(&self) -> Result<SummaryStatistics, StatsError> {
        SummaryStatistics::from_samples(&self.final_differences)
    }
}

impl FromIterator<RunResult> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = RunResult>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut aggregate = Self::with_capacity(iter.size_hint().0, None);
        for run in iter {
            aggregate.push(run);
        }
        aggregate
    }
}

/// Runs `num_runs` independent simulations of one validated config.
#[derive(Debug, Clone)]
pub struct MonteCarloEngine {
    config: SimConfig,
    distribution: Normal<f64>,
    base_seed: u64,
}

impl MonteCarloEngine {
    pub fn new(config: SimConfig) -> Result<Self, SimConfigError> {
        config.validate()?;
        let distribution =
            daily_return_distribution(config.mean_daily_change, config.stdev_daily_change)?;
        let base_seed = config
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen::<u64>());

        Ok(Self {
            config,
            distribution,
            base_seed,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    pub fn run_seed(&self, run_index: usize) -> u64 {
        self.base_seed.wrapping_add(run_index as u64)
    }

    /// Every run draws from the same sampler; the stream is never reset.
    pub fn run_with_sampler<S: ReturnSampler>(&self, sampler: &mut S) -> AggregateResult {
        let mut aggregate = AggregateResult::with_capacity(self.config.num_runs, None);
        for _ in 0..self.config.num_runs {
            aggregate.push(simulate_validated(&self.config, sampler));
        }
        aggregate
    }

    pub fn run(&self) -> AggregateResult {
        self.run_observed(|_, _| {})
    }

    /// Sequential run that calls `observer(run_index, &run)` as each run
    /// finishes.
    pub fn run_observed<F>(&self, mut observer: F) -> AggregateResult
    where
        F: FnMut(usize, &RunResult),
    {
        let mut aggregate =
            AggregateResult::with_capacity(self.config.num_runs, Some(self.base_seed));
        for run_index in 0..self.config.num_runs {
            let run = self.simulate_indexed(run_index);
            observer(run_index, &run);
            aggregate.push(run);
        }
        aggregate
    }

    /// Same per-run seeding as [`MonteCarloEngine::run`], spread over the
    /// rayon pool. Output order follows run index.
    pub fn run_parallel(&self) -> AggregateResult {
        let runs: Vec<RunResult> = (0..self.config.num_runs)
            .into_par_iter()
            .map(|run_index| self.simulate_indexed(run_index))
            .collect();

        let mut aggregate = AggregateResult::with_capacity(runs.len(), Some(self.base_seed));
        for run in runs {
            aggregate.push(run);
        }
        aggregate
    }

    fn simulate_indexed(&self, run_index: usize) -> RunResult {
        let mut sampler = self.sampler_for_run(run_index);
        simulate_validated(&self.config, &mut sampler)
    }

    fn sampler_for_run(&self, run_index: usize) -> NormalReturnSampler {
        NormalReturnSampler::from_distribution(
            self.distribution,
            ChaCha8Rng::seed_from_u64(self.run_seed(run_index)),
        )
    }
}
