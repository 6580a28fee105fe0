use serde::Serialize;

use crate::config::{SimConfig, SimConfigError};
use crate::sampler::ReturnSampler;
use crate::state::AssetState;
use crate::tick::TickEngine;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickSample {
    pub tick: usize,
    pub daily_change: f64,
    pub base_value: f64,
    pub leveraged_value: f64,
}

impl TickSample {
    pub fn difference(&self) -> f64 {
        self.leveraged_value - self.base_value
    }
}

/// Trajectory of one run: `num_ticks + 1` samples, index 0 being the
/// untouched initial state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    samples: Vec<TickSample>,
}

impl RunResult {
    pub fn samples(&self) -> &[TickSample] {
        &self.samples
    }

    pub fn base_values(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.base_value).collect()
    }

    pub fn leveraged_values(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|sample| sample.leveraged_value)
            .collect()
    }

    pub fn differences(&self) -> Vec<f64> {
        self.samples.iter().map(TickSample::difference).collect()
    }

    pub fn final_sample(&self) -> &TickSample {
        // A run always holds at least the tick-0 sample.
        &self.samples[self.samples.len() - 1]
    }

    pub fn final_difference(&self) -> f64 {
        self.final_sample().difference()
    }
}

pub fn simulate_run<S: ReturnSampler>(
    config: &SimConfig,
    sampler: &mut S,
) -> Result<RunResult, SimConfigError> {
    config.validate()?;
    Ok(simulate_validated(config, sampler))
}

pub(crate) fn simulate_validated<S: ReturnSampler>(config: &SimConfig, sampler: &mut S) -> RunResult {
    let engine = TickEngine::new(config.leverage).with_floor_at_zero(config.floor_at_zero);
    let mut base = AssetState::new(config.initial_value);
    let mut leveraged = AssetState::new(config.initial_value);

    let mut samples = Vec::with_capacity(config.num_ticks + 1);
    samples.push(TickSample {
        tick: 0,
        daily_change: 0.0,
        base_value: base.value,
        leveraged_value: leveraged.value,
    });

    for tick in 1..=config.num_ticks {
        let daily_change = sampler.next_return();
        engine.advance(&mut base, &mut leveraged, daily_change);
        samples.push(TickSample {
            tick,
            daily_change,
            base_value: base.value,
            leveraged_value: leveraged.value,
        });
    }

    RunResult { samples }
}
