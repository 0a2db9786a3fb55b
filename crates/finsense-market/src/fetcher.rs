//! Data fetcher with caching and demo-mode fallback

use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

use crate::analytics::calculate_growth_rate;
use crate::api::{AlphaVantageClient, CompanyOverview, MarketDataSource};
use crate::cache::{CacheKey, StockCache};
use crate::config::MarketConfig;
use crate::demo::{self, DemoDataGenerator};
use crate::error::{MarketError, Result};
use crate::model::{CompanyInfo, DemoStatus, MarketData, StockData, TickerSummary};

/// Trending rows served in demo mode
const DEMO_TICKER_COUNT: usize = 3;

/// Entry point for stock data.
///
/// Serves live data when a provider is configured and demo mode is off.
/// A spent provider quota flips the fetcher into demo mode until
/// [`disable_demo_mode`](Self::disable_demo_mode) is called.
pub struct FinancialDataFetcher {
    config: MarketConfig,
    source: Option<Arc<dyn MarketDataSource>>,
    demo: DemoDataGenerator,
    manual_demo_mode: AtomicBool,
    api_limit_exceeded: AtomicBool,
    stock_cache: StockCache<StockData>,
    market_cache: StockCache<MarketData>,
}

impl FinancialDataFetcher {
    /// Build a fetcher backed by Alpha Vantage when the config carries a key
    pub fn new(config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let source: Option<Arc<dyn MarketDataSource>> = if config.alpha_vantage_api_key.is_some() {
            let client: Arc<dyn MarketDataSource> =
                Arc::new(AlphaVantageClient::from_config(&config)?);
            Some(client)
        } else {
            warn!("No Alpha Vantage API key configured, serving demo data only");
            None
        };

        Ok(Self::assemble(config, source))
    }

    /// Build a fetcher around an explicit provider
    pub fn with_source(config: MarketConfig, source: Arc<dyn MarketDataSource>) -> Self {
        Self::assemble(config, Some(source))
    }

    /// Replace the demo generator, e.g. with a fixed-seed one
    #[must_use]
    pub fn with_demo_generator(mut self, generator: DemoDataGenerator) -> Self {
        self.demo = generator;
        self
    }

    fn assemble(config: MarketConfig, source: Option<Arc<dyn MarketDataSource>>) -> Self {
        if config.demo_mode {
            info!("Running in demo mode with generated market data");
        }

        Self {
            manual_demo_mode: AtomicBool::new(config.demo_mode),
            api_limit_exceeded: AtomicBool::new(false),
            stock_cache: StockCache::new(config.cache_ttl),
            market_cache: StockCache::new(config.cache_ttl),
            demo: DemoDataGenerator::new(),
            source,
            config,
        }
    }

    /// Manual demo mode, an exceeded limit, or no provider at all
    pub fn is_demo_mode(&self) -> bool {
        self.source.is_none()
            || self.manual_demo_mode.load(Ordering::SeqCst)
            || self.api_limit_exceeded.load(Ordering::SeqCst)
    }

    pub fn enable_demo_mode(&self) {
        self.manual_demo_mode.store(true, Ordering::SeqCst);
        info!("Demo mode enabled");
    }

    /// Resume live calls; also forgets an earlier rate-limit hit
    pub fn disable_demo_mode(&self) {
        self.manual_demo_mode.store(false, Ordering::SeqCst);
        self.api_limit_exceeded.store(false, Ordering::SeqCst);
        if self.source.is_none() {
            warn!("Demo mode disabled but no provider is configured");
        } else {
            info!("Demo mode disabled, resuming API calls");
        }
    }

    /// Flip demo mode and return the effective state afterwards
    pub fn toggle_demo_mode(&self) -> bool {
        if self.is_demo_mode() {
            self.disable_demo_mode();
        } else {
            self.enable_demo_mode();
        }
        self.is_demo_mode()
    }

    pub fn demo_status(&self) -> DemoStatus {
        DemoStatus {
            demo_mode: self.is_demo_mode(),
            api_limit_exceeded: self.api_limit_exceeded.load(Ordering::SeqCst),
            manual_demo_mode: self.manual_demo_mode.load(Ordering::SeqCst),
            api_key_configured: self.source.is_some(),
        }
    }

    /// Drop every cached live record, returning how many were held
    pub async fn clear_cache(&self) -> usize {
        let dropped = self.stock_cache.len().await + self.market_cache.len().await;
        self.stock_cache.clear().await;
        self.market_cache.clear().await;
        debug!(dropped, "Market data cache cleared");
        dropped
    }

    fn live_source(&self) -> Option<&Arc<dyn MarketDataSource>> {
        if self.is_demo_mode() {
            None
        } else {
            self.source.as_ref()
        }
    }

    fn note_rate_limit(&self, error: &MarketError) {
        warn!(%error, "API limit detected, switching to demo mode");
        self.api_limit_exceeded.store(true, Ordering::SeqCst);
    }

    /// Quote, fundamentals and cash flow history for one ticker
    #[instrument(skip(self))]
    pub async fn get_stock_data(&self, ticker: &str) -> Result<StockData> {
        let symbol = normalize_symbol(ticker)?;

        let Some(source) = self.live_source() else {
            debug!(%symbol, "Using demo data");
            return Ok(self.demo.demo_stock_data(&symbol));
        };

        let key = CacheKey::plain(&symbol, "stock_data");
        let fetched = self
            .stock_cache
            .get_or_fetch(key, || fetch_live(source.as_ref(), &symbol))
            .await;

        match fetched {
            Ok(data) => Ok(data),
            Err(e) if e.is_rate_limit() => {
                self.note_rate_limit(&e);
                Ok(self.demo.demo_stock_data(&symbol))
            }
            Err(e) => Err(e),
        }
    }

    /// Trending tickers: generated in demo mode, live quotes otherwise.
    ///
    /// Symbols whose quote fails (other than by rate limit) are reported
    /// with zero price and change.
    pub async fn get_popular_tickers(&self) -> Vec<TickerSummary> {
        let Some(source) = self.live_source() else {
            debug!("Using demo data for popular tickers");
            return self.demo.demo_tickers(DEMO_TICKER_COUNT);
        };

        let symbols = &self.config.popular_tickers;
        let quotes = join_all(symbols.iter().map(|s| source.quote(s))).await;

        let now = chrono::Utc::now();
        let mut rows = Vec::with_capacity(symbols.len());
        for (symbol, quote) in symbols.iter().zip(quotes) {
            let (price, change) = match quote {
                Ok(q) => {
                    debug!(%symbol, price = q.price, "Got live price");
                    (q.price, q.change_percent.unwrap_or(0.0))
                }
                Err(e) if e.is_rate_limit() => {
                    self.note_rate_limit(&e);
                    return self.demo.demo_tickers(DEMO_TICKER_COUNT);
                }
                Err(e) => {
                    warn!(%symbol, error = %e, "Could not fetch quote");
                    (0.0, 0.0)
                }
            };

            rows.push(TickerSummary {
                symbol: symbol.clone(),
                name: demo::company_name(symbol).unwrap_or(symbol.as_str()).to_string(),
                price,
                change,
                market_cap: 0.0,
                timestamp: now,
                is_demo: false,
            });
        }
        rows
    }

    /// Volatility, trading range and volume for context
    #[instrument(skip(self))]
    pub async fn get_market_data(&self, ticker: &str) -> Result<MarketData> {
        let symbol = normalize_symbol(ticker)?;

        let Some(source) = self.live_source() else {
            return self.demo_market_data(&symbol);
        };

        let key = CacheKey::plain(&symbol, "market_data");
        let fetched = self
            .market_cache
            .get_or_fetch(key, || async {
                let prices = source.daily_prices(&symbol).await?;
                MarketData::from_prices(&prices).ok_or_else(|| MarketError::DataUnavailable {
                    symbol: symbol.clone(),
                    reason: "empty price history".to_string(),
                })
            })
            .await;

        match fetched {
            Err(e) if e.is_rate_limit() => {
                self.note_rate_limit(&e);
                self.demo_market_data(&symbol)
            }
            other => other,
        }
    }

    fn demo_market_data(&self, symbol: &str) -> Result<MarketData> {
        self.demo
            .demo_market_data(symbol)
            .ok_or_else(|| MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "empty demo price history".to_string(),
            })
    }
}

/// Trimmed, uppercased symbol; blank input is rejected
fn normalize_symbol(ticker: &str) -> Result<String> {
    let symbol = ticker.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(MarketError::InvalidSymbol(ticker.to_string()));
    }
    Ok(symbol)
}

/// The quote is required. Overview and cash flow are best effort, except
/// that a rate-limit error from either aborts the whole fetch.
async fn fetch_live(source: &dyn MarketDataSource, symbol: &str) -> Result<StockData> {
    let quote = source.quote(symbol).await?;

    let mut data = StockData::empty_live(symbol);
    data.current_price = quote.price;

    match source.company_overview(symbol).await {
        Ok(overview) => apply_overview(&mut data, &overview),
        Err(e) if e.is_rate_limit() => return Err(e),
        Err(e) => warn!(%symbol, error = %e, "Company overview unavailable"),
    }

    match source.free_cash_flow_history(symbol).await {
        Ok(fcf) => {
            data.fcf_growth_rate = calculate_growth_rate(&fcf);
            data.fcf_data = fcf;
        }
        Err(e) if e.is_rate_limit() => return Err(e),
        Err(e) => warn!(%symbol, error = %e, "Cash flow history unavailable"),
    }

    if data.market_cap <= 0.0 && data.shares_outstanding > 0.0 {
        data.market_cap = data.current_price * data.shares_outstanding;
    }

    info!(
        %symbol,
        price = data.current_price,
        fcf_years = data.fcf_data.len(),
        "Fetched live stock data"
    );
    Ok(data)
}

fn apply_overview(data: &mut StockData, overview: &CompanyOverview) {
    if let Some(name) = overview.display_name() {
        data.company_name = name.to_string();
    }
    data.market_cap = overview.market_cap().unwrap_or(0.0);
    data.shares_outstanding = overview.shares_outstanding().unwrap_or(0.0);
    data.info = CompanyInfo {
        sector: overview.sector().map(ToString::to_string),
        industry: overview.industry().map(ToString::to_string),
        employee_count: overview.employee_count(),
        exchange: overview.exchange().map(ToString::to_string),
        beta: overview.beta(),
    };
}
