//! Closed-form DCF building blocks
//!
//! Everything here is deterministic; the Monte Carlo sweep reuses these
//! functions once per sampled scenario.

/// Base cash flow used when no usable history is available ($1B)
pub const FALLBACK_BASE_FCF: f64 = 1_000_000_000.0;

/// Pick the starting cash flow from a history ordered oldest first.
///
/// Prefers the most recent value when positive, then the largest positive
/// value (cyclical companies, one-off charges), then [`FALLBACK_BASE_FCF`].
pub fn pick_base_fcf(fcf_history: &[f64]) -> f64 {
    match fcf_history.last() {
        None => FALLBACK_BASE_FCF,
        Some(&recent) if recent > 0.0 => recent,
        Some(_) => fcf_history
            .iter()
            .copied()
            .filter(|v| *v > 0.0)
            .max_by(f64::total_cmp)
            .unwrap_or(FALLBACK_BASE_FCF),
    }
}

/// Project cash flows for years 1..=years at constant growth
pub fn project_fcf(base_fcf: f64, growth: f64, years: u32) -> Vec<f64> {
    (1..=years)
        .map(|t| base_fcf * (1.0 + growth).powi(t as i32))
        .collect()
}

/// Discount a series of year-end cash flows (first element is year 1)
pub fn pv_series(cashflows: &[f64], rate: f64) -> Vec<f64> {
    cashflows
        .iter()
        .zip(1_i32..)
        .map(|(cf, t)| cf / (1.0 + rate).powi(t))
        .collect()
}

/// Gordon growth terminal value at the end of the explicit period
pub fn terminal_value(last_fcf: f64, wacc: f64, terminal_growth: f64) -> f64 {
    let tg = if wacc <= terminal_growth {
        terminal_growth.min(wacc - 1e-6)
    } else {
        terminal_growth
    };
    last_fcf * (1.0 + tg) / (wacc - tg)
}

/// Share count at the end of the horizon
pub fn shares_path(start_shares: f64, annual_change: f64, years: u32) -> f64 {
    start_shares * (1.0 + annual_change).powi(years as i32)
}

/// Per-share value, absent when the share count is not positive
pub fn per_share(equity_value: f64, shares: f64) -> Option<f64> {
    (shares > 0.0).then(|| equity_value / shares)
}

/// Enterprise value without materializing the projection vectors
pub fn enterprise_value(base_fcf: f64, growth: f64, wacc: f64, terminal_growth: f64, years: u32) -> f64 {
    let mut fcf = base_fcf;
    let mut discount = 1.0;
    let mut pv_explicit = 0.0;
    for _ in 0..years {
        fcf *= 1.0 + growth;
        discount *= 1.0 + wacc;
        pv_explicit += fcf / discount;
    }
    pv_explicit + terminal_value(fcf, wacc, terminal_growth) / discount
}
