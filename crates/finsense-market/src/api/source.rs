//! Provider-neutral interface the fetcher talks to

use async_trait::async_trait;

use super::alpha_vantage::{CompanyOverview, GlobalQuote};
use crate::error::Result;
use crate::model::PricePoint;

/// A live market data provider.
///
/// Symbols are passed uppercased. Implementations report a spent quota as
/// [`MarketError::RateLimitExceeded`](crate::MarketError::RateLimitExceeded)
/// so the fetcher can switch to demo data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest quote for a symbol
    async fn quote(&self, symbol: &str) -> Result<GlobalQuote>;

    /// Descriptive fundamentals
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview>;

    /// Annual free cash flow, oldest first
    async fn free_cash_flow_history(&self, symbol: &str) -> Result<Vec<f64>>;

    /// Daily closes in date order
    async fn daily_prices(&self, symbol: &str) -> Result<Vec<PricePoint>>;
}
