use std::time::Duration;

use serde::Serialize;

/// Distribution of per-run wall-clock time, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunLatencySummary {
    pub count: usize,
    pub min_nanos: u64,
    pub mean_nanos: u64,
    pub p50_nanos: u64,
    pub p95_nanos: u64,
    pub p99_nanos: u64,
    pub max_nanos: u64,
}

#[derive(Debug, Default, Clone)]
pub struct RunTimings {
    durations: Vec<Duration>,
}

impl RunTimings {
    pub fn with_capacity(num_runs: usize) -> Self {
        Self {
            durations: Vec::with_capacity(num_runs),
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.durations.push(duration);
    }

    pub fn summary(&self) -> Option<RunLatencySummary> {
        if self.durations.is_empty() {
            return None;
        }

        let mut nanos: Vec<u64> = self.durations.iter().map(|d| duration_nanos(*d)).collect();
        nanos.sort_unstable();
        let total: u128 = nanos.iter().map(|n| u128::from(*n)).sum();
        let count = nanos.len();

        Some(RunLatencySummary {
            count,
            min_nanos: nanos[0],
            mean_nanos: u64::try_from(total / count as u128).unwrap_or(u64::MAX),
            p50_nanos: quantile(&nanos, 0.50),
            p95_nanos: quantile(&nanos, 0.95),
            p99_nanos: quantile(&nanos, 0.99),
            max_nanos: nanos[count - 1],
        })
    }
}

pub(crate) fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Nearest-rank quantile of an ascending, non-empty slice.
fn quantile(ascending: &[u64], q: f64) -> u64 {
    let rank = (q * ascending.len() as f64).ceil() as usize;
    ascending[rank.clamp(1, ascending.len()) - 1]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{quantile, RunTimings};

    #[test]
    fn summary_covers_spread_and_tail() {
        let mut timings = RunTimings::with_capacity(5);
        for nanos in [4, 1, 100, 3, 2] {
            timings.record(Duration::from_nanos(nanos));
        }

        let summary = timings.summary().expect("recorded runs should summarize");

        assert_eq!(summary.count, 5);
        assert_eq!(summary.min_nanos, 1);
        assert_eq!(summary.mean_nanos, 22);
        assert_eq!(summary.p50_nanos, 3);
        assert_eq!(summary.p95_nanos, 100);
        assert_eq!(summary.max_nanos, 100);
    }

    #[test]
    fn no_runs_means_no_summary() {
        assert!(RunTimings::default().summary().is_none());
    }

    #[test]
    fn quantile_uses_nearest_rank() {
        let values: Vec<u64> = (1..=100).collect();

        assert_eq!(quantile(&values, 0.50), 50);
        assert_eq!(quantile(&values, 0.99), 99);
        assert_eq!(quantile(&values, 0.0), 1);
        assert_eq!(quantile(&[7], 0.95), 7);
    }
}
