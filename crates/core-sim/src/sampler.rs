use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::config::SimConfigError;

/// Source of daily fractional changes, drawn strictly in order.
pub trait ReturnSampler {
    fn next_return(&mut self) -> f64;
}

impl<S: ReturnSampler + ?Sized> ReturnSampler for &mut S {
    fn next_return(&mut self) -> f64 {
        (**self).next_return()
    }
}

#[derive(Debug, Clone)]
pub struct NormalReturnSampler<R = ChaCha8Rng> {
    rng: R,
    distribution: Normal<f64>,
}

impl NormalReturnSampler<ChaCha8Rng> {
    pub fn seeded(mean: f64, stdev: f64, seed: u64) -> Result<Self, SimConfigError> {
        Self::with_rng(mean, stdev, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> NormalReturnSampler<R> {
    pub fn with_rng(mean: f64, stdev: f64, rng: R) -> Result<Self, SimConfigError> {
        Ok(Self::from_distribution(daily_return_distribution(mean, stdev)?, rng))
    }

    pub fn from_distribution(distribution: Normal<f64>, rng: R) -> Self {
        Self { rng, distribution }
    }
}

pub fn daily_return_distribution(mean: f64, stdev: f64) -> Result<Normal<f64>, SimConfigError> {
    if !mean.is_finite() {
        return Err(SimConfigError::InvalidMeanDailyChange);
    }
    if !stdev.is_finite() || stdev < 0.0 {
        return Err(SimConfigError::InvalidStdevDailyChange);
    }

    Normal::new(mean, stdev).map_err(|_| SimConfigError::InvalidStdevDailyChange)
}

impl<R: Rng> ReturnSampler for NormalReturnSampler<R> {
    fn next_return(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng)
    }
}

/// Replays a fixed list of returns, wrapping around at the end.
#[derive(Debug, Clone, Default)]
pub struct FixedReturnSampler {
    returns: Vec<f64>,
    cursor: usize,
}

impl FixedReturnSampler {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns, cursor: 0 }
    }

    pub fn constant(daily_return: f64) -> Self {
        Self::new(vec![daily_return])
    }
}

impl ReturnSampler for FixedReturnSampler {
    fn next_return(&mut self) -> f64 {
        if self.returns.is_empty() {
            return 0.0;
        }

        let value = self.returns[self.cursor];
        self.cursor = (self.cursor + 1) % self.returns.len();
        value
    }
}
