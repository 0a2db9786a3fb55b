//! Synthetic market data for demo mode
//!
//! Values are drawn from ranges typical of large US companies and rotate
//! every hour. Within one hour a given ticker always produces the same
//! numbers, so repeated calls agree with each other.

use chrono::{Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::analytics::round2;
use crate::model::{
    BalanceSheet, CashFlowStatement, CompanyInfo, DataSource, IncomeStatement, MarketData,
    PricePoint, StockData, TickerSummary,
};

const DEFAULT_SECTOR: &str = "Technology";
const DEFAULT_INDUSTRY: &str = "Technology";

const HISTORY_DAYS: i64 = 30;
const TICKER_LIST_SALT: &str = "__popular__";

struct Profile {
    symbol: &'static str,
    name: &'static str,
    base_price: f64,
    market_cap: f64,
    shares: f64,
    sector: &'static str,
    industry: &'static str,
}

#[rustfmt::skip]
static PROFILES: [Profile; 10] = [
    Profile { symbol: "AAPL", name: "Apple Inc.", base_price: 247.66, market_cap: 3.8e12, shares: 15.4e9, sector: "Technology", industry: "Consumer Electronics" },
    Profile { symbol: "MSFT", name: "Microsoft Corporation", base_price: 514.05, market_cap: 3.2e12, shares: 7.4e9, sector: "Technology", industry: "Software" },
    Profile { symbol: "GOOGL", name: "Alphabet Inc. Class A", base_price: 244.15, market_cap: 1.8e12, shares: 12.6e9, sector: "Technology", industry: "Internet Content & Information" },
    Profile { symbol: "AMZN", name: "Amazon.com Inc.", base_price: 185.50, market_cap: 1.9e12, shares: 10.6e9, sector: "Consumer Discretionary", industry: "Internet Retail" },
    Profile { symbol: "TSLA", name: "Tesla Inc.", base_price: 248.42, market_cap: 7.9e11, shares: 3.2e9, sector: "Consumer Discretionary", industry: "Auto Manufacturers" },
    Profile { symbol: "META", name: "Meta Platforms Inc.", base_price: 520.80, market_cap: 1.3e12, shares: 2.5e9, sector: "Technology", industry: "Social Media" },
    Profile { symbol: "NVDA", name: "NVIDIA Corporation", base_price: 183.00, market_cap: 4.5e12, shares: 2.4e9, sector: "Technology", industry: "Semiconductors" },
    Profile { symbol: "NFLX", name: "Netflix Inc.", base_price: 485.35, market_cap: 2.1e11, shares: 430e6, sector: "Communication Services", industry: "Entertainment" },
    Profile { symbol: "AMD", name: "Advanced Micro Devices Inc.", base_price: 142.67, market_cap: 2.3e11, shares: 1.6e9, sector: "Technology", industry: "Semiconductors" },
    Profile { symbol: "INTC", name: "Intel Corporation", base_price: 43.82, market_cap: 1.8e11, shares: 4.1e9, sector: "Technology", industry: "Semiconductors" },
];

fn profile(symbol: &str) -> Option<&'static Profile> {
    PROFILES.iter().find(|p| p.symbol == symbol)
}

/// Display name of a known ticker
pub(crate) fn company_name(symbol: &str) -> Option<&'static str> {
    profile(symbol).map(|p| p.name)
}

/// Where the generator takes its base seed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeedSource {
    /// Hours since the Unix epoch; data changes every hour
    Hourly,
    /// Constant seed, for tests and reproducible demos
    Fixed(u64),
}

/// Generates realistic mock data when live data is unavailable
#[derive(Debug, Clone)]
pub struct DemoDataGenerator {
    seed_source: SeedSource,
}

impl Default for DemoDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDataGenerator {
    /// Generator rotating every hour
    pub fn new() -> Self {
        Self {
            seed_source: SeedSource::Hourly,
        }
    }

    /// Generator with a constant seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed_source: SeedSource::Fixed(seed),
        }
    }

    /// Base seed for the current rotation
    pub fn rotation_seed(&self) -> u64 {
        match self.seed_source {
            SeedSource::Hourly => current_hour(),
            SeedSource::Fixed(seed) => seed,
        }
    }

    fn rng_for(&self, salt: &str) -> StdRng {
        StdRng::seed_from_u64(derive_seed(self.rotation_seed(), salt))
    }

    /// `min(count, 10)` distinct known tickers with varied prices
    pub fn demo_tickers(&self, count: usize) -> Vec<TickerSummary> {
        let mut rng = self.rng_for(TICKER_LIST_SALT);
        let selected: Vec<&Profile> = PROFILES.choose_multiple(&mut rng, count).collect();

        let now = Utc::now();
        selected
            .into_iter()
            .map(|p| {
                let price = p.base_price * (1.0 + rng.gen_range(-0.05..0.05));
                let change = rng.gen_range(-3.0..3.0);
                let market_cap = (p.market_cap * rng.gen_range(0.8..1.2)).trunc();
                TickerSummary {
                    symbol: p.symbol.to_string(),
                    name: p.name.to_string(),
                    price: round2(price),
                    change: round2(change),
                    market_cap,
                    timestamp: now,
                    is_demo: true,
                }
            })
            .collect()
    }

    /// Full demo record for any ticker; unknown tickers get random fundamentals
    pub fn demo_stock_data(&self, ticker: &str) -> StockData {
        let ticker = ticker.trim().to_uppercase();
        let known = profile(&ticker);
        let mut rng = self.rng_for(&ticker);

        debug!(%ticker, known = known.is_some(), "generating demo stock data");

        let (base_price, company_name) = match known {
            Some(p) => (p.base_price, p.name.to_string()),
            None => (rng.gen_range(10.0..1000.0), format!("{ticker} Corporation")),
        };

        let current_price = base_price * (1.0 + rng.gen_range(-0.05..0.05));

        let market_cap = match known {
            Some(p) => (p.market_cap * rng.gen_range(0.8..1.2)).trunc(),
            None => (current_price * random_share_count(&mut rng)).trunc(),
        };
        let shares_outstanding = known.map_or_else(|| random_share_count(&mut rng), |p| p.shares);

        let fcf_data = quarterly_fcf(&mut rng, market_cap);
        let fcf_growth_rate = rng.gen_range(0.02..0.15);

        let financials = IncomeStatement {
            revenue: whole(&mut rng, 10e9, 500e9),
            net_income: whole(&mut rng, 1e9, 50e9),
            gross_profit: whole(&mut rng, 5e9, 250e9),
            operating_income: whole(&mut rng, 2e9, 100e9),
            total_expenses: whole(&mut rng, 5e9, 200e9),
        };
        let balance_sheet = BalanceSheet {
            total_assets: whole(&mut rng, 50e9, 1000e9),
            total_liabilities: whole(&mut rng, 10e9, 500e9),
            shareholders_equity: whole(&mut rng, 20e9, 600e9),
            cash_and_equivalents: whole(&mut rng, 1e9, 100e9),
            total_debt: whole(&mut rng, 1e9, 200e9),
        };
        let cashflow = CashFlowStatement {
            operating_cash_flow: whole(&mut rng, 5e9, 100e9),
            investing_cash_flow: whole(&mut rng, -50e9, -1e9),
            financing_cash_flow: whole(&mut rng, -20e9, 20e9),
            free_cash_flow: whole(&mut rng, 1e9, 80e9),
        };

        let price_history = price_walk(&mut rng, current_price);

        let info = CompanyInfo {
            sector: Some(known.map_or(DEFAULT_SECTOR, |p| p.sector).to_string()),
            industry: Some(known.map_or(DEFAULT_INDUSTRY, |p| p.industry).to_string()),
            employee_count: Some(rng.gen_range(1_000..=500_000)),
            exchange: None,
            beta: None,
        };

        StockData {
            ticker,
            company_name,
            current_price: round2(current_price),
            market_cap,
            shares_outstanding,
            fcf_data,
            fcf_growth_rate,
            financials: Some(financials),
            balance_sheet: Some(balance_sheet),
            cashflow: Some(cashflow),
            price_history,
            info,
            data_source: DataSource::Demo,
            is_demo: true,
            fetched_at: Utc::now(),
        }
    }

    /// Market context computed from the demo price history
    pub fn demo_market_data(&self, ticker: &str) -> Option<MarketData> {
        MarketData::from_prices(&self.demo_stock_data(ticker).price_history)
    }
}

/// Hours since the Unix epoch
fn current_hour() -> u64 {
    Utc::now().timestamp().max(0).unsigned_abs() / 3600
}

fn random_share_count(rng: &mut StdRng) -> f64 {
    whole(rng, 100e6, 10e9)
}

fn whole(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    rng.gen_range(low..=high).round()
}

/// Four quarters of FCF at 5-15% of market cap a year with a slight upward trend
fn quarterly_fcf(rng: &mut StdRng, market_cap: f64) -> Vec<f64> {
    let base = market_cap * rng.gen_range(0.05..0.15) / 4.0;
    (0..4)
        .map(|i| round2(base * rng.gen_range(0.8..1.3) * 1.05_f64.powi(i)))
        .collect()
}

/// Daily random walk of ±2% ending yesterday
fn price_walk(rng: &mut StdRng, start: f64) -> Vec<PricePoint> {
    let today = Utc::now().date_naive();
    let mut price = start;
    (1..=HISTORY_DAYS)
        .rev()
        .map(|days_ago| {
            price *= 1.0 + rng.gen_range(-0.02..0.02);
            PricePoint {
                date: today - ChronoDuration::days(days_ago),
                price: round2(price),
                volume: rng.gen_range(1_000_000..=100_000_000),
            }
        })
        .collect()
}

/// Mix the rotation seed with a per-request salt
fn derive_seed(base_seed: u64, salt: &str) -> u64 {
    splitmix64(base_seed ^ fnv1a(salt.as_bytes()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
