//! Model health checks for the base case

use crate::model::{BaseCase, Diagnostics, HealthFlag};

/// Share of EV above which the terminal value is considered dominant
pub const TERMINAL_DOMINANCE_THRESHOLD: f64 = 0.7;

/// Durations below this many years are flagged as back loaded
pub const SHORT_DURATION_YEARS: f64 = 2.0;

/// Inspect a base case for the usual DCF modelling mistakes
pub fn diagnose(base: &BaseCase, wacc: f64, terminal_growth: f64) -> Diagnostics {
    let ev = base.enterprise_value;

    let terminal_value_share = (ev > 0.0).then(|| base.pv_terminal_value / ev);
    let terminal_value_dominant =
        terminal_value_share.is_some_and(|share| share > TERMINAL_DOMINANCE_THRESHOLD);

    let duration = value_duration(&base.pv_fcf_projections);

    let mut health_flags = Vec::new();
    if wacc <= terminal_growth {
        health_flags.push(HealthFlag::WaccNotAboveTerminalGrowth);
    }
    if !ev.is_finite() || ev <= 0.0 {
        health_flags.push(HealthFlag::NonPositiveEnterpriseValue);
    }
    // zero means the PVs did not sum positive; negative durations still count
    if duration.is_some_and(|d| d != 0.0 && d < SHORT_DURATION_YEARS) {
        health_flags.push(HealthFlag::ShortDuration);
    }
    if terminal_value_dominant {
        health_flags.push(HealthFlag::TerminalValueDominant);
    }

    Diagnostics {
        terminal_value_share,
        terminal_value_dominant,
        duration_years_pv_cashflows: duration,
        pv_explicit_to_pv_terminal_ratio: (base.pv_terminal_value > 0.0)
            .then(|| base.pv_explicit_period / base.pv_terminal_value),
        health_flags,
    }
}

/// PV-weighted mean year of the explicit cash flows.
///
/// Absent for an empty or non-finite series; zero when the PVs do not sum
/// to a positive value.
pub fn value_duration(pv_cashflows: &[f64]) -> Option<f64> {
    if pv_cashflows.is_empty() || !pv_cashflows.iter().all(|v| v.is_finite()) {
        return None;
    }

    let total: f64 = pv_cashflows.iter().sum();
    if total <= 0.0 {
        return Some(0.0);
    }

    Some(
        pv_cashflows
            .iter()
            .zip(1_u32..)
            .map(|(pv, t)| f64::from(t) * pv / total)
            .sum(),
    )
}
