//! API clients for market data providers

pub mod alpha_vantage;
pub mod source;

pub use alpha_vantage::{AlphaVantageClient, CompanyOverview, GlobalQuote};
pub use source::MarketDataSource;

#[cfg(test)]
pub use source::MockMarketDataSource;
