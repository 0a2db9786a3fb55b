//! Error types for DCF valuation

use thiserror::Error;

/// Input validation failures for the DCF engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DcfError {
    /// Forecast horizon outside the supported 3-10 year window
    #[error("years must be between 3 and 10, got {0}")]
    InvalidHorizon(u32),

    /// Gordon growth requires the discount rate to exceed terminal growth
    #[error("WACC ({wacc}) must be strictly greater than terminal growth ({terminal_growth})")]
    WaccNotAboveTerminalGrowth { wacc: f64, terminal_growth: f64 },

    /// WACC or terminal growth below zero
    #[error("WACC and terminal growth must be non negative")]
    NegativeRate,

    /// NaN or infinite input
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    /// Finite input outside its allowed range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Result type alias for DCF operations
pub type Result<T> = std::result::Result<T, DcfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DcfError::InvalidHorizon(12);
        assert_eq!(err.to_string(), "years must be between 3 and 10, got 12");

        let err = DcfError::WaccNotAboveTerminalGrowth {
            wacc: 0.02,
            terminal_growth: 0.03,
        };
        assert_eq!(
            err.to_string(),
            "WACC (0.02) must be strictly greater than terminal growth (0.03)"
        );

        let err = DcfError::NonFinite("growth_rate");
        assert_eq!(err.to_string(), "growth_rate must be a finite number");
    }
}
