//! Request validation and the fetch-then-value pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use finsense_dcf::{DcfCalculator, DcfInputs, DcfValuation, ValuationMetrics};
use finsense_market::{FinancialDataFetcher, StockData};

use crate::error::{AnalysisError, Result};

pub const DEFAULT_GROWTH_RATE: f64 = 0.05;
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.10;
pub const DEFAULT_TERMINAL_GROWTH: f64 = 0.03;
pub const DEFAULT_MONTE_CARLO_RUNS: usize = 1000;

/// Upper bound on scenarios per valuation
pub const MAX_MONTE_CARLO_RUNS: usize = 100_000;

/// Share count used when the data source has none
pub const FALLBACK_SHARES_OUTSTANDING: f64 = 1e9;

const MAX_TICKER_LEN: usize = 5;

/// Uppercased ticker of 1-5 ASCII letters
pub fn validate_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    let valid = (1..=MAX_TICKER_LEN).contains(&ticker.len())
        && ticker.bytes().all(|b| b.is_ascii_uppercase());
    if valid {
        Ok(ticker)
    } else {
        Err(AnalysisError::InvalidTicker(raw.to_string()))
    }
}

/// Optional overrides for a valuation; `None` means use the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub growth_rate: Option<f64>,
    pub discount_rate: Option<f64>,
    pub terminal_growth: Option<f64>,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<()> {
        if self.growth_rate.is_some_and(|g| !(-0.5..=2.0).contains(&g)) {
            return Err(AnalysisError::InvalidRequest(
                "Growth rate must be between -50% and 200%".to_string(),
            ));
        }

        if self.discount_rate.is_some_and(|r| !(r > 0.0 && r <= 0.5)) {
            return Err(AnalysisError::InvalidRequest(
                "Discount rate must be between 0% and 50%".to_string(),
            ));
        }

        if self.terminal_growth.is_some_and(|t| !(0.0..=0.1).contains(&t)) {
            return Err(AnalysisError::InvalidRequest(
                "Terminal growth rate must be between 0% and 10%".to_string(),
            ));
        }

        Ok(())
    }

    pub fn growth_rate(&self) -> f64 {
        self.growth_rate.unwrap_or(DEFAULT_GROWTH_RATE)
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate.unwrap_or(DEFAULT_DISCOUNT_RATE)
    }

    pub fn terminal_growth(&self) -> f64 {
        self.terminal_growth.unwrap_or(DEFAULT_TERMINAL_GROWTH)
    }
}

/// Stock data, valuation and market comparison for one ticker
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub stock_data: StockData,
    pub dcf_results: DcfValuation,
    pub valuation_metrics: Option<ValuationMetrics>,
    pub timestamp: DateTime<Utc>,
}

/// Wires the fetcher to the DCF engine
pub struct Analyzer {
    fetcher: Arc<FinancialDataFetcher>,
    calculator: DcfCalculator,
    monte_carlo_runs: usize,
}

impl Analyzer {
    pub fn new(fetcher: Arc<FinancialDataFetcher>, calculator: DcfCalculator) -> Self {
        Self {
            fetcher,
            calculator,
            monte_carlo_runs: DEFAULT_MONTE_CARLO_RUNS,
        }
    }

    #[must_use]
    pub fn with_monte_carlo_runs(mut self, runs: usize) -> Self {
        self.monte_carlo_runs = runs;
        self
    }

    pub async fn analyze(&self, ticker: &str, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let ticker = validate_ticker(ticker)?;
        request.validate()?;
        if self.monte_carlo_runs > MAX_MONTE_CARLO_RUNS {
            return Err(AnalysisError::InvalidRequest(format!(
                "Monte Carlo runs must not exceed {MAX_MONTE_CARLO_RUNS}"
            )));
        }

        info!(%ticker, ?request, "Analysis request");

        let stock_data = self.fetcher.get_stock_data(&ticker).await?;
        let inputs = dcf_inputs(&stock_data, request, self.monte_carlo_runs);
        let dcf_results = self.calculator.calculate_dcf_valuation(&inputs)?;

        let valuation_metrics = dcf_results
            .base_case
            .equity_value_per_share
            .and_then(|dcf_price| {
                self.calculator.calculate_valuation_metrics(
                    stock_data.current_price,
                    dcf_price,
                    stock_data.market_cap,
                    &stock_data.fcf_data,
                )
            });

        Ok(AnalysisReport {
            ticker,
            stock_data,
            dcf_results,
            valuation_metrics,
            timestamp: Utc::now(),
        })
    }
}

/// DCF inputs from fetched data plus request overrides
pub fn dcf_inputs(stock: &StockData, request: &AnalysisRequest, runs: usize) -> DcfInputs {
    let shares = if stock.shares_outstanding > 0.0 {
        stock.shares_outstanding
    } else {
        FALLBACK_SHARES_OUTSTANDING
    };

    DcfInputs::new(stock.fcf_data.clone(), request.growth_rate())
        .with_wacc(request.discount_rate())
        .with_terminal_growth(request.terminal_growth())
        .with_shares_outstanding(shares)
        .with_monte_carlo_runs(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsense_dcf::DcfError;
    use finsense_market::{DemoDataGenerator, MarketConfig};

    fn analyzer(seed: u64) -> Analyzer {
        let config = MarketConfig::builder().build().unwrap();
        let fetcher = FinancialDataFetcher::new(config)
            .unwrap()
            .with_demo_generator(DemoDataGenerator::with_seed(99));
        Analyzer::new(Arc::new(fetcher), DcfCalculator::default().with_seed(seed))
    }

    #[test]
    fn test_validate_ticker() {
        assert_eq!(validate_ticker("aapl").unwrap(), "AAPL");
        assert_eq!(validate_ticker(" msft ").unwrap(), "MSFT");
        assert_eq!(validate_ticker("A").unwrap(), "A");

        for bad in ["", "TOOLONG", "BRK.B", "A1", "ÄPFEL"] {
            assert!(
                matches!(validate_ticker(bad), Err(AnalysisError::InvalidTicker(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_request_bounds() {
        assert!(AnalysisRequest::default().validate().is_ok());

        let ok = AnalysisRequest {
            growth_rate: Some(-0.5),
            discount_rate: Some(0.5),
            terminal_growth: Some(0.0),
        };
        assert!(ok.validate().is_ok());

        let bad = [
            AnalysisRequest { growth_rate: Some(2.01), ..Default::default() },
            AnalysisRequest { growth_rate: Some(f64::NAN), ..Default::default() },
            AnalysisRequest { discount_rate: Some(0.0), ..Default::default() },
            AnalysisRequest { discount_rate: Some(0.51), ..Default::default() },
            AnalysisRequest { terminal_growth: Some(-0.01), ..Default::default() },
            AnalysisRequest { terminal_growth: Some(0.11), ..Default::default() },
        ];
        for request in bad {
            assert!(
                matches!(request.validate(), Err(AnalysisError::InvalidRequest(_))),
                "{request:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dcf_inputs_defaults_and_share_fallback() {
        let mut stock = StockData::empty_live("XYZ");
        stock.fcf_data = vec![1e9, 1.1e9];

        let inputs = dcf_inputs(&stock, &AnalysisRequest::default(), 500);
        assert_eq!(inputs.growth_rate, 0.05);
        assert_eq!(inputs.wacc, 0.10);
        assert_eq!(inputs.terminal_growth, 0.03);
        assert_eq!(inputs.shares_outstanding, 1e9);
        assert_eq!(inputs.monte_carlo_runs, 500);
        assert_eq!(inputs.fcf_history, vec![1e9, 1.1e9]);

        stock.shares_outstanding = 2.5e9;
        let request = AnalysisRequest {
            growth_rate: Some(0.0),
            ..Default::default()
        };
        let inputs = dcf_inputs(&stock, &request, 500);
        // an explicit zero is honoured, not replaced by the default
        assert_eq!(inputs.growth_rate, 0.0);
        assert_eq!(inputs.shares_outstanding, 2.5e9);
    }

    #[tokio::test]
    async fn test_analyze_demo_ticker() {
        let report = analyzer(7).analyze("aapl", &AnalysisRequest::default()).await.unwrap();

        assert_eq!(report.ticker, "AAPL");
        assert!(report.stock_data.is_demo);
        assert_eq!(report.dcf_results.monte_carlo.count, 1000);
        assert_eq!(report.dcf_results.assumptions.wacc, 0.10);
        assert_eq!(report.dcf_results.assumptions.terminal_growth, 0.03);
        assert_eq!(report.dcf_results.assumptions.shares_outstanding_start, 15.4e9);
        assert!(report.dcf_results.sample_scenarios.len() <= 10);

        let metrics = report.valuation_metrics.unwrap();
        assert!(metrics.upside_downside_multiple > 0.0);
        assert!(metrics.fcf_yield > 0.0);
    }

    #[tokio::test]
    async fn test_analyze_is_reproducible_with_seed() {
        let request = AnalysisRequest {
            growth_rate: Some(0.08),
            discount_rate: Some(0.09),
            terminal_growth: Some(0.02),
        };
        let a = analyzer(3).analyze("NVDA", &request).await.unwrap();
        let b = analyzer(3).analyze("NVDA", &request).await.unwrap();

        assert_eq!(a.dcf_results.base_case, b.dcf_results.base_case);
        assert_eq!(a.dcf_results.monte_carlo, b.dcf_results.monte_carlo);
    }

    #[tokio::test]
    async fn test_analyze_rejects_bad_input() {
        let analyzer = analyzer(1);

        let err = analyzer.analyze("123", &AnalysisRequest::default()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidTicker(_)));

        let request = AnalysisRequest {
            discount_rate: Some(0.6),
            ..Default::default()
        };
        let err = analyzer.analyze("AAPL", &request).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRequest(_)));

        let err = self::analyzer(1)
            .with_monte_carlo_runs(MAX_MONTE_CARLO_RUNS + 1)
            .analyze("AAPL", &AnalysisRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRequest(_)));

        // within bounds individually, but WACC below terminal growth
        let request = AnalysisRequest {
            discount_rate: Some(0.02),
            ..Default::default()
        };
        let err = analyzer.analyze("AAPL", &request).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Dcf(DcfError::WaccNotAboveTerminalGrowth { .. })
        ));
    }
}
