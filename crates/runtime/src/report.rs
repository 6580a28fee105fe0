use std::fmt::Write;

use core_sim::SummaryStatistics;

pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
const RULE_WIDTH: usize = 60;
const MAX_BAR_WIDTH: usize = 40;

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Returns `None` for an empty sample, zero bins or non-finite values.
    pub fn from_samples(samples: &[f64], bins: usize) -> Option<Self> {
        if samples.is_empty() || bins == 0 || samples.iter().any(|value| !value.is_finite()) {
            return None;
        }

        let mut low = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mut high = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if low == high {
            low -= 0.5;
            high += 0.5;
        }

        let width = (high - low) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| low + width * i as f64).collect();
        let mut counts = vec![0; bins];
        for value in samples {
            let index = (((value - low) / width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }

        Some(Self { edges, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub fn format_summary_report(summary: &SummaryStatistics, num_ticks: usize) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut report = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(report, "{rule}");
    let _ = writeln!(report, "SUMMARY STATISTICS OF FINAL DIFFERENCES");
    let _ = writeln!(
        report,
        "(Leveraged - Base value after {num_ticks} ticks, {} runs)",
        summary.count
    );
    let _ = writeln!(report, "{rule}");
    let _ = writeln!(report, "Mean:              {:>12.2}", summary.mean);
    let _ = writeln!(report, "Standard Deviation:{:>12.2}", summary.std_dev);
    let _ = writeln!(report, "Skewness:          {:>12.2}", summary.skewness);
    let _ = writeln!(report, "Kurtosis:          {:>12.2}", summary.kurtosis);
    let _ = writeln!(report, "{rule}");
    report
}

pub fn render_histogram(histogram: &Histogram) -> String {
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut rendered = String::new();

    for (index, count) in histogram.counts.iter().enumerate() {
        let bar = "#".repeat(count * MAX_BAR_WIDTH / peak);
        let _ = writeln!(
            rendered,
            "{:>12.2} .. {:>12.2} | {bar:<width$} {count}",
            histogram.edges[index],
            histogram.edges[index + 1],
            width = MAX_BAR_WIDTH
        );
    }
    rendered
}

#[cfg(test)]
mod tests {
    use core_sim::SummaryStatistics;

    use super::{format_summary_report, render_histogram, Histogram};

    #[test]
    fn histogram_counts_every_sample_once() {
        let samples = [-10.0, -5.0, 0.0, 0.0, 5.0, 10.0];

        let histogram = Histogram::from_samples(&samples, 4).unwrap();

        assert_eq!(histogram.edges, vec![-10.0, -5.0, 0.0, 5.0, 10.0]);
        assert_eq!(histogram.counts, vec![1, 1, 2, 2]);
        assert_eq!(histogram.total(), samples.len());
    }

    #[test]
    fn constant_sample_gets_a_unit_range() {
        let histogram = Histogram::from_samples(&[0.0; 10], 2).unwrap();

        assert_eq!(histogram.edges, vec![-0.5, 0.0, 0.5]);
        assert_eq!(histogram.counts, vec![0, 10]);
    }

    #[test]
    fn degenerate_inputs_have_no_histogram() {
        assert!(Histogram::from_samples(&[], 30).is_none());
        assert!(Histogram::from_samples(&[1.0], 0).is_none());
        assert!(Histogram::from_samples(&[1.0, f64::NAN], 30).is_none());
    }

    #[test]
    fn report_prints_four_moments_with_two_decimals() {
        let summary = SummaryStatistics::from_samples(&[300.0, 150.0, -150.0, 600.0]).unwrap();

        let report = format_summary_report(&summary, 100);

        assert!(report.contains("SUMMARY STATISTICS OF FINAL DIFFERENCES"));
        assert!(report.contains("after 100 ticks, 4 runs"));
        assert!(report.contains("Mean:                    225.00"));
        assert!(report.contains("Standard Deviation:      312.25"));
        assert!(report.contains("Skewness:                  0.00"));
        assert!(report.contains("Kurtosis:                 -1.15"));
    }

    #[test]
    fn report_shows_undefined_moments_as_nan() {
        let summary = SummaryStatistics::from_samples(&[0.0; 10]).unwrap();

        let report = format_summary_report(&summary, 100);

        assert!(report.contains("Skewness:                   NaN"));
    }

    #[test]
    fn rendered_histogram_has_one_line_per_bin() {
        let histogram = Histogram::from_samples(&[1.0, 2.0, 2.0, 3.0], 3).unwrap();

        let rendered = render_histogram(&histogram);

        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.lines().nth(1).unwrap().ends_with(" 2"));
    }
}
