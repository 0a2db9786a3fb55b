//! Market data for FinSense valuations
//!
//! This crate provides:
//! - An Alpha Vantage client limited to the free-tier endpoints, with
//!   request spacing, retries and payload classification
//! - A TTL cache shared by all fetches
//! - A deterministic demo data generator used when no key is configured,
//!   when demo mode is switched on, or when the provider quota runs out
//! - [`FinancialDataFetcher`], the entry point that combines the above
//!
//! # Example
//!
//! ```no_run
//! use finsense_market::{FinancialDataFetcher, MarketConfig};
//!
//! # async fn run() -> finsense_market::Result<()> {
//! let config = MarketConfig::default().with_env_api_key();
//! let fetcher = FinancialDataFetcher::new(config)?;
//!
//! let data = fetcher.get_stock_data("AAPL").await?;
//! println!("{} trades at {:.2} ({})", data.ticker, data.current_price, data.data_source);
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod demo;
pub mod error;
pub mod fetcher;
pub mod model;

pub use api::{AlphaVantageClient, CompanyOverview, GlobalQuote, MarketDataSource};
pub use cache::{CacheKey, StockCache};
pub use config::{DailyOutputSize, MarketConfig, MarketConfigBuilder};
pub use demo::DemoDataGenerator;
pub use error::{MarketError, Result};
pub use fetcher::FinancialDataFetcher;
pub use model::{
    BalanceSheet, CashFlowStatement, CompanyInfo, DataSource, DemoStatus, IncomeStatement,
    MarketData, PricePoint, StockData, TickerSummary,
};
