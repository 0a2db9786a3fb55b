//! Small statistics over fetched series

use crate::model::{MarketData, PricePoint};

/// Cap on the average growth derived from a cash flow history
pub const MAX_HISTORICAL_GROWTH: f64 = 0.5;

/// Trading days used to annualise daily volatility
const TRADING_DAYS: f64 = 252.0;

/// Mean year-over-year growth across the positive entries of `fcf`,
/// capped at ±50%. Fewer than two positive entries give 0.
pub fn calculate_growth_rate(fcf: &[f64]) -> f64 {
    let positive: Vec<f64> = fcf.iter().copied().filter(|v| *v > 0.0).collect();
    if positive.len() < 2 {
        return 0.0;
    }

    let rates: Vec<f64> = positive
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0].abs())
        .collect();

    let avg = rates.iter().sum::<f64>() / rates.len() as f64;
    avg.clamp(-MAX_HISTORICAL_GROWTH, MAX_HISTORICAL_GROWTH)
}

impl MarketData {
    /// Derive volatility, range and volume from a daily series in date order.
    ///
    /// Returns `None` for an empty series. Beta has no index to regress
    /// against and is reported as 1.
    pub fn from_prices(prices: &[PricePoint]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let returns: Vec<f64> = prices
            .windows(2)
            .filter(|w| w[0].price != 0.0)
            .map(|w| w[1].price / w[0].price - 1.0)
            .collect();

        let volatility = sample_std(&returns).unwrap_or(0.0) * TRADING_DAYS.sqrt();

        let high = prices.iter().map(|p| p.price).fold(f64::MIN, f64::max);
        let low = prices.iter().map(|p| p.price).fold(f64::MAX, f64::min);
        let avg_volume =
            prices.iter().map(|p| p.volume as f64).sum::<f64>() / prices.len() as f64;

        Some(Self {
            volatility,
            beta: 1.0,
            week_52_high: high,
            week_52_low: low,
            avg_volume,
        })
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Round to cents
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(day: u32, price: f64, volume: u64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            price,
            volume,
        }
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(calculate_growth_rate(&[]), 0.0);
        assert_eq!(calculate_growth_rate(&[100.0]), 0.0);
        assert_eq!(calculate_growth_rate(&[100.0, -5.0, 0.0]), 0.0);

        // 10% then 20%
        let g = calculate_growth_rate(&[100.0, 110.0, 132.0]);
        assert!((g - 0.15).abs() < 1e-12);

        // non-positive entries are skipped, not treated as breaks
        let g = calculate_growth_rate(&[100.0, -40.0, 120.0]);
        assert!((g - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_growth_rate_is_capped() {
        assert_eq!(calculate_growth_rate(&[1.0, 10.0]), 0.5);
        assert_eq!(calculate_growth_rate(&[10.0, 1.0]), -0.5);
    }

    #[test]
    fn test_market_data_from_prices() {
        let prices = vec![
            point(1, 100.0, 1_000),
            point(2, 110.0, 2_000),
            point(3, 99.0, 3_000),
        ];
        let data = MarketData::from_prices(&prices).unwrap();

        // returns +10% and -10%: sample std = sqrt(0.02)
        let expected = 0.02_f64.sqrt() * 252.0_f64.sqrt();
        assert!((data.volatility - expected).abs() < 1e-12);
        assert_eq!(data.beta, 1.0);
        assert_eq!(data.week_52_high, 110.0);
        assert_eq!(data.week_52_low, 99.0);
        assert_eq!(data.avg_volume, 2_000.0);
    }

    #[test]
    fn test_market_data_degenerate_series() {
        assert!(MarketData::from_prices(&[]).is_none());

        let single = MarketData::from_prices(&[point(1, 50.0, 10)]).unwrap();
        assert_eq!(single.volatility, 0.0);
        assert_eq!(single.week_52_high, 50.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.005_1), -0.01);
    }
}
