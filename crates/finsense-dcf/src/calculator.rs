//! DCF calculator: validation, base case, Monte Carlo and helpers

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::diagnose;
use crate::error::{DcfError, Result};
use crate::model::{Assumptions, BaseCase, DcfInputs, DcfValuation, ValuationMetrics};
use crate::monte_carlo::{self, SweepParams};
use crate::sampling::Sampler;
use crate::stats::summarize;
use crate::valuation::{
    per_share, pick_base_fcf, project_fcf, pv_series, shares_path, terminal_value,
};

/// Number of sampled scenarios reported alongside the summary
const REPORTED_SCENARIOS: usize = 10;

/// DCF calculator with market defaults for the cost of capital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfCalculator {
    pub risk_free_rate: f64,
    pub market_risk_premium: f64,
    pub default_beta: f64,
    /// Fixed seed for reproducible Monte Carlo runs
    pub seed: Option<u64>,
}

impl Default for DcfCalculator {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            market_risk_premium: 0.06,
            default_beta: 1.0,
            seed: None,
        }
    }
}

/// Inputs for [`DcfCalculator::calculate_wacc`]
///
/// `None` rates fall back to the calculator's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaccInputs {
    pub beta: Option<f64>,
    pub risk_free_rate: Option<f64>,
    pub market_risk_premium: Option<f64>,
    pub cost_of_debt: f64,
    pub tax_rate: f64,
    pub debt_to_equity: f64,
}

impl Default for WaccInputs {
    fn default() -> Self {
        Self {
            beta: None,
            risk_free_rate: None,
            market_risk_premium: None,
            cost_of_debt: 0.05,
            tax_rate: 0.25,
            debt_to_equity: 0.3,
        }
    }
}

impl DcfCalculator {
    pub fn new(risk_free_rate: f64, market_risk_premium: f64, default_beta: f64) -> Self {
        Self {
            risk_free_rate,
            market_risk_premium,
            default_beta,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the base case, the Monte Carlo sweep and diagnostics
    pub fn calculate_dcf_valuation(&self, inputs: &DcfInputs) -> Result<DcfValuation> {
        validate(inputs)?;

        let mut base_fcf = pick_base_fcf(&inputs.fcf_history);
        if inputs.treat_sbc_as_cash_cost && inputs.sbc_percent_of_fcf > 0.0 {
            base_fcf *= 1.0 - inputs.sbc_percent_of_fcf;
        }

        let (growth, wacc, terminal_growth) = if inputs.real_mode {
            let nominal = |real: f64| (1.0 + real) * (1.0 + inputs.inflation) - 1.0;
            (
                nominal(inputs.growth_rate),
                nominal(inputs.wacc),
                nominal(inputs.terminal_growth),
            )
        } else {
            (inputs.growth_rate, inputs.wacc, inputs.terminal_growth)
        };

        debug!(
            base_fcf,
            growth, wacc, terminal_growth, runs = inputs.monte_carlo_runs, "running DCF valuation"
        );

        let base_case = base_case(inputs, base_fcf, growth, wacc, terminal_growth);

        let mut sampler = Sampler::new(self.rng());
        let sweep = monte_carlo::run(
            &SweepParams {
                base_fcf,
                growth,
                wacc,
                terminal_growth,
                years: inputs.years,
                shares: inputs.shares_outstanding,
                annual_share_change: inputs.annual_share_change,
                bridge: inputs.bridge,
                runs: inputs.monte_carlo_runs,
                recession_prob: inputs.recession_prob,
            },
            &mut sampler,
        );

        let diagnostics = diagnose(&base_case, wacc, terminal_growth);
        let mut sample_scenarios = sweep.details;
        sample_scenarios.truncate(REPORTED_SCENARIOS);

        Ok(DcfValuation {
            base_case,
            monte_carlo: summarize(sweep.per_share),
            diagnostics,
            assumptions: Assumptions {
                base_fcf,
                growth_rate: growth,
                wacc,
                terminal_growth,
                years: inputs.years,
                shares_outstanding_start: inputs.shares_outstanding,
                annual_share_change: inputs.annual_share_change,
                treat_sbc_as_cash_cost: inputs.treat_sbc_as_cash_cost,
                sbc_percent_of_fcf: inputs.sbc_percent_of_fcf,
                real_mode: inputs.real_mode,
                inflation: inputs.inflation,
                recession_prob: inputs.recession_prob,
            },
            sample_scenarios,
        })
    }

    /// CAPM cost of equity blended with after-tax cost of debt
    pub fn calculate_wacc(&self, inputs: &WaccInputs) -> f64 {
        let rf = inputs.risk_free_rate.unwrap_or(self.risk_free_rate);
        let mrp = inputs.market_risk_premium.unwrap_or(self.market_risk_premium);
        let beta = inputs.beta.unwrap_or(self.default_beta);

        let cost_of_equity = rf + beta * mrp;
        let after_tax_cost_of_debt = inputs.cost_of_debt * (1.0 - inputs.tax_rate);

        let total = 1.0 + inputs.debt_to_equity;
        let weight_equity = 1.0 / total;
        let weight_debt = inputs.debt_to_equity / total;
        weight_equity * cost_of_equity + weight_debt * after_tax_cost_of_debt
    }

    /// Compare a DCF price with the market.
    ///
    /// Returns `None` without cash flow history or a positive current price.
    pub fn calculate_valuation_metrics(
        &self,
        current_price: f64,
        dcf_price: f64,
        market_cap: f64,
        fcf_history: &[f64],
    ) -> Option<ValuationMetrics> {
        if fcf_history.is_empty() || current_price <= 0.0 {
            return None;
        }

        let current_fcf = pick_base_fcf(fcf_history);
        Some(ValuationMetrics {
            dcf_vs_current: (dcf_price - current_price) / current_price,
            upside_downside_multiple: dcf_price / current_price,
            fcf_yield: if market_cap > 0.0 {
                current_fcf / market_cap
            } else {
                0.0
            },
            price_to_fcf: if current_fcf > 0.0 {
                current_price / (current_fcf / 1e9)
            } else {
                0.0
            },
        })
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

fn base_case(
    inputs: &DcfInputs,
    base_fcf: f64,
    growth: f64,
    wacc: f64,
    terminal_growth: f64,
) -> BaseCase {
    let fcf = project_fcf(base_fcf, growth, inputs.years);
    let pv = pv_series(&fcf, wacc);
    let pv_explicit: f64 = pv.iter().sum();

    let terminal_fcf = fcf.last().copied().unwrap_or(base_fcf);
    let tv = terminal_value(terminal_fcf, wacc, terminal_growth);
    let pv_tv = tv / (1.0 + wacc).powi(inputs.years as i32);

    let ev = pv_explicit + pv_tv;
    let equity_value = inputs.bridge.equity_value(ev);
    let end_shares = shares_path(
        inputs.shares_outstanding,
        inputs.annual_share_change,
        inputs.years,
    );

    BaseCase {
        enterprise_value: ev,
        equity_value,
        equity_value_per_share: per_share(equity_value, end_shares),
        pv_explicit_period: pv_explicit,
        pv_terminal_value: pv_tv,
        terminal_value_gordon: tv,
        terminal_value_share_of_ev: (ev > 0.0).then(|| pv_tv / ev),
        fcf_projections: fcf,
        pv_fcf_projections: pv,
        terminal_fcf_year: terminal_fcf,
        shares_end_year: end_shares,
    }
}

fn validate(inputs: &DcfInputs) -> Result<()> {
    let scalars = [
        ("growth_rate", inputs.growth_rate),
        ("wacc", inputs.wacc),
        ("terminal_growth", inputs.terminal_growth),
        ("shares_outstanding", inputs.shares_outstanding),
        ("annual_share_change", inputs.annual_share_change),
        ("sbc_percent_of_fcf", inputs.sbc_percent_of_fcf),
        ("inflation", inputs.inflation),
        ("recession_prob", inputs.recession_prob),
        ("net_debt", inputs.bridge.net_debt),
        ("non_operating_assets", inputs.bridge.non_operating_assets),
        ("minority_interest", inputs.bridge.minority_interest),
        ("other_adjustments", inputs.bridge.other_adjustments),
    ];
    if let Some((field, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
        return Err(DcfError::NonFinite(*field));
    }
    if inputs.fcf_history.iter().any(|v| !v.is_finite()) {
        return Err(DcfError::NonFinite("fcf_history"));
    }

    if !(3..=10).contains(&inputs.years) {
        return Err(DcfError::InvalidHorizon(inputs.years));
    }
    if inputs.wacc <= inputs.terminal_growth {
        return Err(DcfError::WaccNotAboveTerminalGrowth {
            wacc: inputs.wacc,
            terminal_growth: inputs.terminal_growth,
        });
    }
    if inputs.wacc < 0.0 || inputs.terminal_growth < 0.0 {
        return Err(DcfError::NegativeRate);
    }

    if !(0.0..=1.0).contains(&inputs.recession_prob) {
        return Err(DcfError::OutOfRange {
            field: "recession_prob",
            value: inputs.recession_prob,
        });
    }
    if !(0.0..1.0).contains(&inputs.sbc_percent_of_fcf) {
        return Err(DcfError::OutOfRange {
            field: "sbc_percent_of_fcf",
            value: inputs.sbc_percent_of_fcf,
        });
    }
    if inputs.inflation <= -1.0 {
        return Err(DcfError::OutOfRange {
            field: "inflation",
            value: inputs.inflation,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapitalBridge, HealthFlag};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn seeded() -> DcfCalculator {
        DcfCalculator::default().with_seed(42)
    }

    /// Flat cash flows and zero terminal growth: EV is the perpetuity FCF / WACC
    fn perpetuity_inputs() -> DcfInputs {
        DcfInputs::new(vec![80.0, 90.0, 100.0], 0.0)
            .with_wacc(0.10)
            .with_terminal_growth(0.0)
            .with_years(3)
            .with_shares_outstanding(10.0)
            .with_monte_carlo_runs(200)
    }

    #[test]
    fn test_base_case_perpetuity() {
        let valuation = seeded()
            .calculate_dcf_valuation(&perpetuity_inputs())
            .unwrap();
        let base = &valuation.base_case;

        assert_approx(base.enterprise_value, 1000.0);
        assert_approx(base.equity_value, 1000.0);
        assert_approx(base.equity_value_per_share.unwrap(), 100.0);
        assert_approx(base.terminal_value_gordon, 1000.0);
        assert_approx(base.pv_terminal_value, 1000.0 / 1.331);
        assert_approx(base.pv_explicit_period + base.pv_terminal_value, 1000.0);
        assert_eq!(base.fcf_projections, vec![100.0, 100.0, 100.0]);
        assert_eq!(base.pv_fcf_projections.len(), 3);
        assert_approx(base.terminal_fcf_year, 100.0);
        assert_approx(base.shares_end_year, 10.0);
    }

    #[test]
    fn test_diagnostics_flag_back_loaded_model() {
        let valuation = seeded()
            .calculate_dcf_valuation(&perpetuity_inputs())
            .unwrap();
        let diag = &valuation.diagnostics;

        assert!(diag.terminal_value_dominant);
        assert_approx(diag.terminal_value_share.unwrap(), 1.0 / 1.331);
        let duration = diag.duration_years_pv_cashflows.unwrap();
        assert!(duration > 1.9 && duration < 2.0, "duration {duration}");
        assert_eq!(
            diag.health_flags,
            vec![HealthFlag::ShortDuration, HealthFlag::TerminalValueDominant]
        );
    }

    #[test]
    fn test_bridge_and_share_change() {
        let inputs = perpetuity_inputs()
            .with_bridge(CapitalBridge {
                net_debt: 200.0,
                non_operating_assets: 50.0,
                minority_interest: 10.0,
                other_adjustments: 5.0,
            })
            .with_annual_share_change(0.1);
        let base = seeded().calculate_dcf_valuation(&inputs).unwrap().base_case;

        assert_approx(base.equity_value, 845.0);
        assert_approx(base.shares_end_year, 13.31);
        assert_approx(base.equity_value_per_share.unwrap(), 845.0 / 13.31);
    }

    #[test]
    fn test_sbc_haircut_and_real_mode() {
        let inputs = perpetuity_inputs().with_sbc(0.2, true);
        let valuation = seeded().calculate_dcf_valuation(&inputs).unwrap();
        assert_approx(valuation.assumptions.base_fcf, 80.0);

        let inputs = perpetuity_inputs().with_sbc(0.2, false);
        let valuation = seeded().calculate_dcf_valuation(&inputs).unwrap();
        assert_approx(valuation.assumptions.base_fcf, 100.0);

        let inputs = DcfInputs::new(vec![100.0], 0.02)
            .with_wacc(0.06)
            .with_terminal_growth(0.01)
            .with_real_mode(0.03)
            .with_monte_carlo_runs(10);
        let assumptions = seeded().calculate_dcf_valuation(&inputs).unwrap().assumptions;
        assert!(assumptions.real_mode);
        assert_approx(assumptions.growth_rate, 1.02 * 1.03 - 1.0);
        assert_approx(assumptions.wacc, 1.06 * 1.03 - 1.0);
        assert_approx(assumptions.terminal_growth, 1.01 * 1.03 - 1.0);
    }

    #[test]
    fn test_negative_history_uses_fallback_base() {
        let inputs = DcfInputs::new(vec![-5.0, -3.0], 0.05).with_monte_carlo_runs(10);
        let valuation = seeded().calculate_dcf_valuation(&inputs).unwrap();
        assert_approx(valuation.assumptions.base_fcf, 1e9);
    }

    #[test]
    fn test_monte_carlo_summary_and_samples() {
        let inputs = DcfInputs::new(vec![90e9, 95e9, 100e9], 0.06)
            .with_wacc(0.09)
            .with_shares_outstanding(15e9);
        let valuation = seeded().calculate_dcf_valuation(&inputs).unwrap();

        assert_eq!(valuation.monte_carlo.count, 1000);
        let stats = valuation.monte_carlo.stats.unwrap();
        assert!(stats.min <= stats.p5);
        assert!(stats.p5 <= stats.p25);
        assert!(stats.p25 <= stats.median);
        assert!(stats.median <= stats.p75);
        assert!(stats.p75 <= stats.p95);
        assert!(stats.p95 <= stats.max);
        assert!(stats.std > 0.0);
        assert_eq!(valuation.sample_scenarios.len(), 10);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let inputs = DcfInputs::new(vec![100.0, 110.0], 0.05).with_monte_carlo_runs(300);
        let a = seeded().calculate_dcf_valuation(&inputs).unwrap();
        let b = seeded().calculate_dcf_valuation(&inputs).unwrap();
        assert_eq!(a, b);

        let c = DcfCalculator::default()
            .with_seed(43)
            .calculate_dcf_valuation(&inputs)
            .unwrap();
        assert_ne!(a.monte_carlo, c.monte_carlo);
    }

    #[test]
    fn test_zero_runs() {
        let inputs = DcfInputs::new(vec![100.0], 0.05).with_monte_carlo_runs(0);
        let valuation = seeded().calculate_dcf_valuation(&inputs).unwrap();
        assert_eq!(valuation.monte_carlo.count, 0);
        assert!(valuation.monte_carlo.stats.is_none());
        assert!(valuation.sample_scenarios.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let calc = seeded();
        let base = DcfInputs::new(vec![100.0], 0.05);

        assert_eq!(
            calc.calculate_dcf_valuation(&base.clone().with_years(2)),
            Err(DcfError::InvalidHorizon(2))
        );
        assert_eq!(
            calc.calculate_dcf_valuation(&base.clone().with_years(11)),
            Err(DcfError::InvalidHorizon(11))
        );
        assert!(matches!(
            calc.calculate_dcf_valuation(&base.clone().with_wacc(0.02).with_terminal_growth(0.03)),
            Err(DcfError::WaccNotAboveTerminalGrowth { .. })
        ));
        assert!(matches!(
            calc.calculate_dcf_valuation(&base.clone().with_wacc(0.02).with_terminal_growth(0.02)),
            Err(DcfError::WaccNotAboveTerminalGrowth { .. })
        ));
        assert_eq!(
            calc.calculate_dcf_valuation(&base.clone().with_terminal_growth(-0.01)),
            Err(DcfError::NegativeRate)
        );
        assert_eq!(
            calc.calculate_dcf_valuation(&DcfInputs::new(vec![100.0], f64::NAN)),
            Err(DcfError::NonFinite("growth_rate"))
        );
        assert_eq!(
            calc.calculate_dcf_valuation(&DcfInputs::new(vec![f64::INFINITY], 0.05)),
            Err(DcfError::NonFinite("fcf_history"))
        );
        assert!(matches!(
            calc.calculate_dcf_valuation(&base.clone().with_recession_prob(1.5)),
            Err(DcfError::OutOfRange {
                field: "recession_prob",
                ..
            })
        ));
        assert!(matches!(
            calc.calculate_dcf_valuation(&base.with_sbc(1.0, true)),
            Err(DcfError::OutOfRange {
                field: "sbc_percent_of_fcf",
                ..
            })
        ));
    }

    #[test]
    fn test_calculate_wacc() {
        let calc = DcfCalculator::default();
        // 0.105 cost of equity, 0.0375 after-tax debt, 1/1.3 vs 0.3/1.3 weights
        let expected = 0.105 / 1.3 + 0.0375 * 0.3 / 1.3;
        assert_approx(calc.calculate_wacc(&WaccInputs::default()), expected);

        let all_equity = WaccInputs {
            beta: Some(1.5),
            risk_free_rate: Some(0.04),
            debt_to_equity: 0.0,
            ..WaccInputs::default()
        };
        assert_approx(calc.calculate_wacc(&all_equity), 0.04 + 1.5 * 0.06);

        let high_beta_default = DcfCalculator::new(0.045, 0.06, 2.0);
        let wacc = high_beta_default.calculate_wacc(&WaccInputs {
            debt_to_equity: 0.0,
            ..WaccInputs::default()
        });
        assert_approx(wacc, 0.165);
    }

    #[test]
    fn test_calculate_valuation_metrics() {
        let calc = DcfCalculator::default();
        let metrics = calc
            .calculate_valuation_metrics(100.0, 120.0, 1e12, &[5e9, 6e9])
            .unwrap();
        assert_approx(metrics.dcf_vs_current, 0.2);
        assert_approx(metrics.upside_downside_multiple, 1.2);
        assert_approx(metrics.fcf_yield, 0.006);
        assert_approx(metrics.price_to_fcf, 100.0 / 6.0);

        let no_cap = calc
            .calculate_valuation_metrics(100.0, 80.0, 0.0, &[5e9])
            .unwrap();
        assert_eq!(no_cap.fcf_yield, 0.0);
        assert_approx(no_cap.dcf_vs_current, -0.2);

        assert!(calc.calculate_valuation_metrics(100.0, 120.0, 1e12, &[]).is_none());
        assert!(calc.calculate_valuation_metrics(0.0, 120.0, 1e12, &[1.0]).is_none());
    }
}
