//! Discounted cash flow engine
//!
//! Five-year (configurable 3-10) free cash flow forecast plus a Gordon growth
//! terminal value, bridged from enterprise value to a per-share equity value.
//! On top of the point estimate, a Monte Carlo sweep samples growth, WACC,
//! terminal growth and the starting cash flow under a simple recession regime
//! to produce a distribution of per-share outcomes.
//!
//! # Example
//!
//! ```rust
//! use finsense_dcf::{DcfCalculator, DcfInputs};
//!
//! let calculator = DcfCalculator::default().with_seed(7);
//! let inputs = DcfInputs::new(vec![90e9, 95e9, 100e9], 0.06)
//!     .with_wacc(0.09)
//!     .with_terminal_growth(0.025)
//!     .with_shares_outstanding(15e9);
//!
//! let valuation = calculator.calculate_dcf_valuation(&inputs).unwrap();
//! assert!(valuation.base_case.enterprise_value > 0.0);
//! assert_eq!(valuation.monte_carlo.count, 1000);
//! ```

pub mod calculator;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod monte_carlo;
pub mod sampling;
pub mod stats;
pub mod valuation;

pub use calculator::{DcfCalculator, WaccInputs};
pub use error::{DcfError, Result};
pub use model::{
    Assumptions, BaseCase, CapitalBridge, DcfInputs, DcfValuation, Diagnostics,
    DistributionStats, HealthFlag, MonteCarloSummary, ScenarioDetail, ValuationMetrics,
};
