use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MEAN_DAILY_CHANGE: f64 = 0.0002;
pub const DEFAULT_STDEV_DAILY_CHANGE: f64 = 0.06;
pub const DEFAULT_INITIAL_VALUE: f64 = 1000.0;
pub const DEFAULT_NUM_TICKS: usize = 100;
pub const DEFAULT_LEVERAGE: f64 = 2.0;
pub const DEFAULT_NUM_RUNS: usize = 500;

pub const MAX_NUM_TICKS: usize = 100_000;
pub const MAX_NUM_RUNS: usize = 100_000;
/// Upper bound on `num_runs * (num_ticks + 1)`; every sample is kept in memory.
pub const MAX_TOTAL_SAMPLES: usize = 10_000_000;

/// Parameters shared by every run of an experiment.
///
/// Changes are fractions (`0.01` is +1%). `seed = None` lets the engine pick
/// a fresh base seed; the chosen seed is reported back on the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub mean_daily_change: f64,
    pub stdev_daily_change: f64,
    pub initial_value: f64,
    pub num_ticks: usize,
    pub leverage: f64,
    pub num_runs: usize,
    pub seed: Option<u64>,
    pub floor_at_zero: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mean_daily_change: DEFAULT_MEAN_DAILY_CHANGE,
            stdev_daily_change: DEFAULT_STDEV_DAILY_CHANGE,
            initial_value: DEFAULT_INITIAL_VALUE,
            num_ticks: DEFAULT_NUM_TICKS,
            leverage: DEFAULT_LEVERAGE,
            num_runs: DEFAULT_NUM_RUNS,
            seed: None,
            floor_at_zero: false,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if !self.mean_daily_change.is_finite() {
            return Err(SimConfigError::InvalidMeanDailyChange);
        }
        if !self.stdev_daily_change.is_finite() || self.stdev_daily_change < 0.0 {
            return Err(SimConfigError::InvalidStdevDailyChange);
        }
        if !self.initial_value.is_finite() || self.initial_value <= 0.0 {
            return Err(SimConfigError::InvalidInitialValue);
        }
        if !self.leverage.is_finite() {
            return Err(SimConfigError::InvalidLeverage);
        }
        if self.num_ticks == 0 {
            return Err(SimConfigError::ZeroTicks);
        }
        if self.num_ticks > MAX_NUM_TICKS {
            return Err(SimConfigError::TooManyTicks);
        }
        if self.num_runs == 0 {
            return Err(SimConfigError::ZeroRuns);
        }
        if self.num_runs > MAX_NUM_RUNS {
            return Err(SimConfigError::TooManyRuns);
        }
        if self.num_runs.saturating_mul(self.num_ticks + 1) > MAX_TOTAL_SAMPLES {
            return Err(SimConfigError::TooManySamples);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimConfigError {
    InvalidMeanDailyChange,
    InvalidStdevDailyChange,
    InvalidInitialValue,
    InvalidLeverage,
    ZeroTicks,
    TooManyTicks,
    ZeroRuns,
    TooManyRuns,
    TooManySamples,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMeanDailyChange => write!(f, "mean_daily_change must be finite"),
            Self::InvalidStdevDailyChange => {
                write!(f, "stdev_daily_change must be finite and non-negative")
            }
            Self::InvalidInitialValue => write!(f, "initial_value must be finite and positive"),
            Self::InvalidLeverage => write!(f, "leverage must be finite"),
            Self::ZeroTicks => write!(f, "num_ticks must be at least 1"),
            Self::TooManyTicks => write!(f, "num_ticks must be at most {MAX_NUM_TICKS}"),
            Self::ZeroRuns => write!(f, "num_runs must be at least 1"),
            Self::TooManyRuns => write!(f, "num_runs must be at most {MAX_NUM_RUNS}"),
            Self::TooManySamples => write!(
                f,
                "num_runs * (num_ticks + 1) must be at most {MAX_TOTAL_SAMPLES}"
            ),
        }
    }
}

impl std::error::Error for SimConfigError {}
