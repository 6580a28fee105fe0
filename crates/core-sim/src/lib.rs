//! Monte Carlo core for comparing a base asset with its leveraged
//! counterpart under normally distributed daily returns.

mod aggregate;
mod config;
mod run;
mod sampler;
mod state;
mod stats;
mod tick;

pub use aggregate::{AggregateResult, MonteCarloEngine};
pub use config::{
    SimConfig, SimConfigError, DEFAULT_INITIAL_VALUE, DEFAULT_LEVERAGE, DEFAULT_MEAN_DAILY_CHANGE,
    DEFAULT_NUM_RUNS, DEFAULT_NUM_TICKS, DEFAULT_STDEV_DAILY_CHANGE, MAX_NUM_RUNS, MAX_NUM_TICKS,
    MAX_TOTAL_SAMPLES,
};
pub use run::{simulate_run, RunResult, TickSample};
pub use sampler::{daily_return_distribution, FixedReturnSampler, NormalReturnSampler, ReturnSampler};
pub use state::AssetState;
pub use stats::{StatsError, SummaryStatistics};
pub use tick::TickEngine;
