//! Summary statistics for simulated outcomes

use crate::model::{DistributionStats, MonteCarloSummary};

/// Percentile of an ascending slice with linear interpolation between ranks.
///
/// `p` is in percent (0-100). Returns NaN for an empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n as f64 - 1.0);
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let w = rank - lower as f64;
                sorted[lower] * (1.0 - w) + sorted[upper] * w
            }
        }
    }
}

/// Summarize the finite values of a sample; non-finite values are dropped
pub fn summarize<I>(values: I) -> MonteCarloSummary
where
    I: IntoIterator<Item = f64>,
{
    let mut clean: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if clean.is_empty() {
        return MonteCarloSummary {
            count: 0,
            stats: None,
        };
    }

    clean.sort_by(f64::total_cmp);
    let n = clean.len() as f64;
    let mean = clean.iter().sum::<f64>() / n;
    let variance = clean.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    MonteCarloSummary {
        count: clean.len(),
        stats: Some(DistributionStats {
            mean,
            median: percentile_sorted(&clean, 50.0),
            std: variance.sqrt(),
            p5: percentile_sorted(&clean, 5.0),
            p25: percentile_sorted(&clean, 25.0),
            p75: percentile_sorted(&clean, 75.0),
            p95: percentile_sorted(&clean, 95.0),
            min: clean[0],
            max: clean[clean.len() - 1],
        }),
    }
}
