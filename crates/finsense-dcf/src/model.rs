//! Input and output types for the DCF engine

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Adjustments that bridge enterprise value to equity value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalBridge {
    /// Debt minus cash
    pub net_debt: f64,
    /// Equity investments, excess cash
    pub non_operating_assets: f64,
    /// Subtracted from enterprise value
    pub minority_interest: f64,
    /// Pension deficit and similar, signed
    pub other_adjustments: f64,
}

impl CapitalBridge {
    /// Apply the bridge to an enterprise value
    pub fn equity_value(&self, enterprise_value: f64) -> f64 {
        enterprise_value - self.net_debt + self.non_operating_assets - self.minority_interest
            + self.other_adjustments
    }
}

/// Inputs for a single valuation run
///
/// `fcf_history` is ordered oldest first; the last element is the most recent
/// period. Rates are nominal unless `real_mode` is set, in which case growth,
/// WACC and terminal growth are real and converted with `inflation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfInputs {
    pub fcf_history: Vec<f64>,
    pub growth_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub shares_outstanding: f64,
    pub monte_carlo_runs: usize,
    pub years: u32,
    pub bridge: CapitalBridge,
    /// Positive for dilution, negative for buybacks
    pub annual_share_change: f64,
    pub treat_sbc_as_cash_cost: bool,
    pub sbc_percent_of_fcf: f64,
    pub real_mode: bool,
    pub inflation: f64,
    pub recession_prob: f64,
}

impl Default for DcfInputs {
    fn default() -> Self {
        Self {
            fcf_history: Vec::new(),
            growth_rate: 0.05,
            wacc: 0.10,
            terminal_growth: 0.025,
            shares_outstanding: 1e9,
            monte_carlo_runs: 1000,
            years: 5,
            bridge: CapitalBridge::default(),
            annual_share_change: 0.0,
            treat_sbc_as_cash_cost: true,
            sbc_percent_of_fcf: 0.0,
            real_mode: false,
            inflation: 0.03,
            recession_prob: 0.15,
        }
    }
}

impl DcfInputs {
    /// Create inputs from a cash flow history and base growth rate
    pub fn new(fcf_history: Vec<f64>, growth_rate: f64) -> Self {
        Self {
            fcf_history,
            growth_rate,
            ..Self::default()
        }
    }

    pub fn with_wacc(mut self, wacc: f64) -> Self {
        self.wacc = wacc;
        self
    }

    pub fn with_terminal_growth(mut self, terminal_growth: f64) -> Self {
        self.terminal_growth = terminal_growth;
        self
    }

    pub fn with_shares_outstanding(mut self, shares: f64) -> Self {
        self.shares_outstanding = shares;
        self
    }

    pub fn with_monte_carlo_runs(mut self, runs: usize) -> Self {
        self.monte_carlo_runs = runs;
        self
    }

    pub fn with_years(mut self, years: u32) -> Self {
        self.years = years;
        self
    }

    pub fn with_bridge(mut self, bridge: CapitalBridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_annual_share_change(mut self, change: f64) -> Self {
        self.annual_share_change = change;
        self
    }

    /// Haircut the base cash flow by stock-based compensation
    pub fn with_sbc(mut self, percent_of_fcf: f64, treat_as_cash_cost: bool) -> Self {
        self.sbc_percent_of_fcf = percent_of_fcf;
        self.treat_sbc_as_cash_cost = treat_as_cash_cost;
        self
    }

    /// Interpret growth, WACC and terminal growth as real rates
    pub fn with_real_mode(mut self, inflation: f64) -> Self {
        self.real_mode = true;
        self.inflation = inflation;
        self
    }

    pub fn with_recession_prob(mut self, prob: f64) -> Self {
        self.recession_prob = prob;
        self
    }
}

/// Point-estimate valuation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseCase {
    pub enterprise_value: f64,
    pub equity_value: f64,
    /// Absent when the end-of-horizon share count is not positive
    pub equity_value_per_share: Option<f64>,
    pub pv_explicit_period: f64,
    pub pv_terminal_value: f64,
    pub terminal_value_gordon: f64,
    /// Absent when enterprise value is not positive
    pub terminal_value_share_of_ev: Option<f64>,
    pub fcf_projections: Vec<f64>,
    pub pv_fcf_projections: Vec<f64>,
    pub terminal_fcf_year: f64,
    pub shares_end_year: f64,
}

/// Descriptive statistics of the per-share distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub p5: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

/// Summary of the Monte Carlo sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    /// Number of finite per-share outcomes
    pub count: usize,
    /// Absent when no scenario produced a finite value
    #[serde(flatten)]
    pub stats: Option<DistributionStats>,
}

/// One sampled scenario, kept for transparency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDetail {
    pub base_fcf: f64,
    pub growth_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub enterprise_value: f64,
    pub equity_value_per_share: Option<f64>,
    pub recession: bool,
}

/// Model health warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthFlag {
    WaccNotAboveTerminalGrowth,
    NonPositiveEnterpriseValue,
    ShortDuration,
    TerminalValueDominant,
}

impl HealthFlag {
    pub fn message(self) -> &'static str {
        match self {
            Self::WaccNotAboveTerminalGrowth => "WACC not greater than terminal growth",
            Self::NonPositiveEnterpriseValue => "Enterprise value non positive",
            Self::ShortDuration => "Short duration implies heavy back loading",
            Self::TerminalValueDominant => "Terminal value dominates the enterprise value",
        }
    }
}

impl fmt::Display for HealthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for HealthFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Model health checks on the base case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub terminal_value_share: Option<f64>,
    pub terminal_value_dominant: bool,
    /// Macaulay-style duration of the discounted explicit cash flows
    pub duration_years_pv_cashflows: Option<f64>,
    pub pv_explicit_to_pv_terminal_ratio: Option<f64>,
    pub health_flags: Vec<HealthFlag>,
}

/// Effective assumptions after normalization (rates are nominal)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assumptions {
    pub base_fcf: f64,
    pub growth_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub years: u32,
    pub shares_outstanding_start: f64,
    pub annual_share_change: f64,
    pub treat_sbc_as_cash_cost: bool,
    pub sbc_percent_of_fcf: f64,
    pub real_mode: bool,
    pub inflation: f64,
    pub recession_prob: f64,
}

/// Full result of a valuation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcfValuation {
    pub base_case: BaseCase,
    pub monte_carlo: MonteCarloSummary,
    pub diagnostics: Diagnostics,
    pub assumptions: Assumptions,
    #[serde(rename = "mc_sample_scenarios")]
    pub sample_scenarios: Vec<ScenarioDetail>,
}

/// Market-relative metrics for a DCF price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationMetrics {
    pub dcf_vs_current: f64,
    pub upside_downside_multiple: f64,
    pub fcf_yield: f64,
    pub price_to_fcf: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_equity_value() {
        let bridge = CapitalBridge {
            net_debt: 200.0,
            non_operating_assets: 50.0,
            minority_interest: 10.0,
            other_adjustments: -5.0,
        };
        assert_eq!(bridge.equity_value(1000.0), 835.0);
        assert_eq!(CapitalBridge::default().equity_value(1000.0), 1000.0);
    }

    #[test]
    fn test_inputs_defaults() {
        let inputs = DcfInputs::new(vec![1.0, 2.0], 0.07);
        assert_eq!(inputs.growth_rate, 0.07);
        assert_eq!(inputs.wacc, 0.10);
        assert_eq!(inputs.terminal_growth, 0.025);
        assert_eq!(inputs.years, 5);
        assert_eq!(inputs.monte_carlo_runs, 1000);
        assert!(inputs.treat_sbc_as_cash_cost);
        assert!(!inputs.real_mode);
    }

    #[test]
    fn test_inputs_deserialize_partial() {
        let inputs: DcfInputs =
            serde_json::from_str(r#"{"fcf_history": [10.0], "growth_rate": 0.1, "years": 7}"#)
                .unwrap();
        assert_eq!(inputs.years, 7);
        assert_eq!(inputs.wacc, 0.10);
        assert_eq!(inputs.bridge, CapitalBridge::default());
    }

    #[test]
    fn test_health_flag_serializes_as_message() {
        let json = serde_json::to_value(vec![HealthFlag::TerminalValueDominant]).unwrap();
        assert_eq!(json[0], "Terminal value dominates the enterprise value");
    }

    #[test]
    fn test_empty_summary_serializes_count_only() {
        let summary = MonteCarloSummary {
            count: 0,
            stats: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json.get("mean").is_none());
    }
}
