use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;

// Relative variance threshold below which a sample is treated as constant.
const ZERO_VARIANCE_RESOLUTION: f64 = 1e-15;

/// Moments of the final (leveraged - base) differences.
///
/// `std_dev` is the sample deviation (divides by `n - 1`) and is NaN for a
/// single sample. `skewness` and `kurtosis` are the biased third and fourth
/// standardized moments, kurtosis reported as excess over the normal
/// distribution. Both are NaN when fewer than two samples are given or the
/// samples have zero variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    EmptySample,
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySample => write!(f, "summary statistics need at least one sample"),
        }
    }
}

impl std::error::Error for StatsError {}

impl SummaryStatistics {
    pub fn from_samples(samples: &[f64]) -> Result<Self, StatsError> {
        if samples.is_empty() {
            return Err(StatsError::EmptySample);
        }

        let count = samples.len();
        let mean = samples.mean();
        let std_dev = samples.std_dev();
        let (skewness, kurtosis) = standardized_moments(samples, mean);

        Ok(Self {
            count,
            mean,
            std_dev,
            skewness,
            kurtosis,
            min: samples.min(),
            max: samples.max(),
        })
    }
}

/// Two-pass central moments: `(m3 / m2^1.5, m4 / m2^2 - 3)`.
fn standardized_moments(samples: &[f64], mean: f64) -> (f64, f64) {
    if samples.len() < 2 {
        return (f64::NAN, f64::NAN);
    }

    let n = samples.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for value in samples {
        let deviation = value - mean;
        let squared = deviation * deviation;
        m2 += squared;
        m3 += squared * deviation;
        m4 += squared * squared;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 <= (ZERO_VARIANCE_RESOLUTION * mean).powi(2) {
        return (f64::NAN, f64::NAN);
    }

    (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
}
