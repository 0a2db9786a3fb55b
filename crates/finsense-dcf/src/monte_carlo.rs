//! Monte Carlo sweep with fat tails and a simple recession regime

use rand::Rng;
use rand::seq::index;

use crate::model::{CapitalBridge, ScenarioDetail};
use crate::sampling::Sampler;
use crate::valuation::{enterprise_value, per_share, shares_path};

const GROWTH_CORE_SD: f64 = 0.02;
const GROWTH_TAIL_SCALE: f64 = 0.04;
const GROWTH_TAIL_DF: u32 = 5;
const GROWTH_RECESSION_HAIRCUT: f64 = 0.03;
const GROWTH_BOUNDS: (f64, f64) = (-0.30, 0.40);

const WACC_CORE_SD: f64 = 0.01;
const WACC_TAIL_SCALE: f64 = 0.02;
const WACC_TAIL_DF: u32 = 6;
const WACC_RECESSION_BUMP: f64 = 0.01;
const WACC_BOUNDS: (f64, f64) = (0.05, 0.20);

const TERMINAL_SD: f64 = 0.003;
const TERMINAL_BOUNDS: (f64, f64) = (0.005, 0.04);
const TERMINAL_WACC_GAP: f64 = 1e-4;

const FCF_SIGMA: f64 = 0.10;
const FCF_RECESSION_CUT: f64 = 0.9;

/// Blend weight of the normal core against the Student-t tail
const CORE_WEIGHT: f64 = 0.7;

/// Scenarios drawn for the detail sample
const DETAIL_SAMPLE: usize = 25;

/// Centre of the sweep; rates are nominal
#[derive(Debug, Clone, Copy)]
pub struct SweepParams {
    pub base_fcf: f64,
    pub growth: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub years: u32,
    pub shares: f64,
    pub annual_share_change: f64,
    pub bridge: CapitalBridge,
    pub runs: usize,
    pub recession_prob: f64,
}

/// Per-share outcomes plus a random subset of scenario details
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub per_share: Vec<f64>,
    pub details: Vec<ScenarioDetail>,
}

/// Run the sweep. Missing per-share values are reported as NaN.
pub fn run<R: Rng>(params: &SweepParams, sampler: &mut Sampler<R>) -> SweepOutcome {
    let end_shares = shares_path(params.shares, params.annual_share_change, params.years);

    let scenarios: Vec<ScenarioDetail> = (0..params.runs)
        .map(|_| sample_scenario(params, end_shares, sampler))
        .collect();

    let take = DETAIL_SAMPLE.min(scenarios.len());
    let details = index::sample(sampler.rng_mut(), scenarios.len(), take)
        .iter()
        .map(|i| scenarios[i].clone())
        .collect();

    let per_share = scenarios
        .iter()
        .map(|s| s.equity_value_per_share.unwrap_or(f64::NAN))
        .collect();

    SweepOutcome { per_share, details }
}

fn sample_scenario<R: Rng>(
    params: &SweepParams,
    end_shares: f64,
    sampler: &mut Sampler<R>,
) -> ScenarioDetail {
    let recession = sampler.bernoulli(params.recession_prob);

    let core_g = sampler.normal(params.growth, GROWTH_CORE_SD);
    let tail_g = params.growth + GROWTH_TAIL_SCALE * sampler.student_t(GROWTH_TAIL_DF);
    let growth = if recession {
        core_g.min(params.growth - GROWTH_RECESSION_HAIRCUT)
    } else {
        CORE_WEIGHT * core_g + (1.0 - CORE_WEIGHT) * tail_g
    }
    .clamp(GROWTH_BOUNDS.0, GROWTH_BOUNDS.1);

    let core_w = sampler.normal(params.wacc, WACC_CORE_SD);
    let tail_w = params.wacc + WACC_TAIL_SCALE * sampler.student_t(WACC_TAIL_DF);
    let mut wacc = CORE_WEIGHT * core_w + (1.0 - CORE_WEIGHT) * tail_w;
    if recession {
        wacc += WACC_RECESSION_BUMP;
    }
    let wacc = wacc.clamp(WACC_BOUNDS.0, WACC_BOUNDS.1);

    let terminal_growth = sampler
        .normal(params.terminal_growth, TERMINAL_SD)
        .clamp(TERMINAL_BOUNDS.0, TERMINAL_BOUNDS.1)
        .min(wacc - TERMINAL_WACC_GAP);

    // Lognormal keeps the starting cash flow positive
    let mut base_fcf = params.base_fcf * sampler.normal(0.0, (1.0 + FCF_SIGMA).ln()).exp();
    if recession {
        base_fcf *= FCF_RECESSION_CUT;
    }

    let ev = enterprise_value(base_fcf, growth, wacc, terminal_growth, params.years);
    let equity = params.bridge.equity_value(ev);

    ScenarioDetail {
        base_fcf,
        growth_rate: growth,
        wacc,
        terminal_growth,
        enterprise_value: ev,
        equity_value_per_share: per_share(equity, end_shares),
        recession,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(runs: usize, recession_prob: f64) -> SweepParams {
        SweepParams {
            base_fcf: 100e9,
            growth: 0.06,
            wacc: 0.09,
            terminal_growth: 0.025,
            years: 5,
            shares: 15e9,
            annual_share_change: 0.0,
            bridge: CapitalBridge::default(),
            runs,
            recession_prob,
        }
    }

    fn sweep(runs: usize, recession_prob: f64, seed: u64) -> SweepOutcome {
        let mut sampler = Sampler::new(StdRng::seed_from_u64(seed));
        run(&params(runs, recession_prob), &mut sampler)
    }

    #[test]
    fn test_sampled_inputs_respect_bounds() {
        let mut sampler = Sampler::new(StdRng::seed_from_u64(1));
        let p = params(0, 0.15);
        for _ in 0..5_000 {
            let s = sample_scenario(&p, 15e9, &mut sampler);
            assert!((-0.30..=0.40).contains(&s.growth_rate));
            assert!((0.05..=0.20).contains(&s.wacc));
            assert!(s.terminal_growth <= 0.04);
            assert!(s.terminal_growth < s.wacc);
            assert!(s.base_fcf > 0.0);
            assert!(s.enterprise_value.is_finite());
        }
    }

    #[test]
    fn test_recession_regime() {
        let all = sweep(500, 1.0, 5);
        assert_eq!(all.details.len(), 25);
        for d in &all.details {
            assert!(d.recession);
            assert!(d.growth_rate <= 0.06 - 0.03 + 1e-12);
        }

        let none = sweep(500, 0.0, 5);
        assert!(none.details.iter().all(|d| !d.recession));
    }

    #[test]
    fn test_detail_sample_size() {
        assert_eq!(sweep(1000, 0.15, 9).details.len(), 25);
        assert_eq!(sweep(4, 0.15, 9).details.len(), 4);
        let empty = sweep(0, 0.15, 9);
        assert!(empty.details.is_empty());
        assert!(empty.per_share.is_empty());
    }

    #[test]
    fn test_distribution_centres_near_base_case() {
        let outcome = sweep(4_000, 0.0, 21);
        let mut values = outcome.per_share.clone();
        values.sort_by(f64::total_cmp);
        let median = values[values.len() / 2];

        let base_ev = enterprise_value(100e9, 0.06, 0.09, 0.025, 5);
        let base_ps = base_ev / 15e9;
        assert!(
            (median / base_ps - 1.0).abs() < 0.25,
            "median {median} vs base {base_ps}"
        );
    }

    #[test]
    fn test_non_positive_shares_give_nan() {
        let mut p = params(10, 0.15);
        p.shares = 0.0;
        let mut sampler = Sampler::new(StdRng::seed_from_u64(2));
        let outcome = run(&p, &mut sampler);
        assert!(outcome.per_share.iter().all(|v| v.is_nan()));
        assert!(outcome.details.iter().all(|d| d.equity_value_per_share.is_none()));
    }
}
