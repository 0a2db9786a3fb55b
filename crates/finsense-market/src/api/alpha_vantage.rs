//! Alpha Vantage API client
//!
//! Only free-tier endpoints are used: `GLOBAL_QUOTE`, `OVERVIEW`,
//! `CASH_FLOW` and `TIME_SERIES_DAILY`. The free tier allows five calls a
//! minute, so every request waits on a governor limiter first.

use async_trait::async_trait;
use chrono::NaiveDate;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::source::MarketDataSource;
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::model::PricePoint;

const PROVIDER: &str = "Alpha Vantage";

/// Most recent annual reports kept from `CASH_FLOW`
const MAX_CASH_FLOW_YEARS: usize = 4;

/// Roughly one trading year of daily closes; only reached with full output
const MAX_DAILY_POINTS: usize = 252;

/// Phrases the provider uses when a quota is spent
const RATE_LIMIT_MARKERS: [&str; 5] = ["frequency", "limit", "premium", "exceeded", "per minute"];

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    config: MarketConfig,
    rate_limiter: SharedRateLimiter,
}

/// Latest quote from `GLOBAL_QUOTE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalQuote {
    pub symbol: String,
    pub price: f64,
    pub volume: u64,
    pub latest_trading_day: Option<NaiveDate>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    /// Change in percent, e.g. `1.25` for +1.25%
    pub change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume", default)]
    volume: String,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: String,
    #[serde(rename = "08. previous close", default)]
    previous_close: String,
    #[serde(rename = "09. change", default)]
    change: String,
    #[serde(rename = "10. change percent", default)]
    change_percent: String,
}

/// Company overview data
///
/// Alpha Vantage sends every value as a string, with `"None"` for gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    pub market_cap: Option<String>,
    pub shares_outstanding: Option<String>,
    pub beta: Option<String>,
    pub full_time_employees: Option<String>,
}

impl CompanyOverview {
    pub fn market_cap(&self) -> Option<f64> {
        self.market_cap.as_deref().and_then(parse_number)
    }

    pub fn shares_outstanding(&self) -> Option<f64> {
        self.shares_outstanding.as_deref().and_then(parse_number)
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta.as_deref().and_then(parse_number)
    }

    pub fn employee_count(&self) -> Option<u64> {
        self.full_time_employees
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
    }

    /// Display name, absent when the provider left it blank
    pub fn display_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty() && name != "None").then_some(name)
    }

    pub fn sector(&self) -> Option<&str> {
        present(self.sector.as_deref())
    }

    pub fn industry(&self) -> Option<&str> {
        present(self.industry.as_deref())
    }

    pub fn exchange(&self) -> Option<&str> {
        present(self.exchange.as_deref())
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "None")
}

/// Parse a provider number, tolerating `%` suffixes and `"None"`
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%');
    if trimmed.is_empty() || trimmed == "None" || trimmed == "-" {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl AlphaVantageClient {
    /// Create a client honouring the interval, timeout and retry settings of `config`
    pub fn new(api_key: impl Into<String>, config: &MarketConfig) -> Result<Self> {
        let quota = Quota::with_period(config.min_request_interval).ok_or_else(|| {
            MarketError::ConfigError("min_request_interval must be greater than 0".to_string())
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("finsense/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config: config.clone(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Create a client from the key held in `config`
    pub fn from_config(config: &MarketConfig) -> Result<Self> {
        let api_key = config.alpha_vantage_api_key.as_deref().ok_or_else(|| {
            MarketError::ConfigError(format!(
                "{} environment variable not set",
                crate::config::API_KEY_ENV
            ))
        })?;
        Self::new(api_key, config)
    }

    /// Run one query with rate limiting and retries, returning the checked payload
    async fn query(&self, symbol: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.until_ready().await;

            match self.send(params).await {
                Ok(payload) => return check_payload(symbol, payload),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_backoff(attempt);
                    warn!(
                        symbol,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Alpha Vantage request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, params: &[(&str, &str)]) -> Result<Value> {
        debug!(?params, "Alpha Vantage request");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::HttpStatus {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    async fn quote(&self, symbol: &str) -> Result<GlobalQuote> {
        let payload = self
            .query(symbol, &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        parse_global_quote(symbol, &payload)
    }

    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let payload = self
            .query(symbol, &[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn free_cash_flow_history(&self, symbol: &str) -> Result<Vec<f64>> {
        let payload = self
            .query(symbol, &[("function", "CASH_FLOW"), ("symbol", symbol)])
            .await?;
        parse_cash_flow(symbol, &payload)
    }

    async fn daily_prices(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let payload = self
            .query(
                symbol,
                &[
                    ("function", "TIME_SERIES_DAILY"),
                    ("symbol", symbol),
                    ("outputsize", self.config.daily_output_size.as_param()),
                ],
            )
            .await?;
        parse_daily(symbol, &payload)
    }
}

/// Classify provider-level failures hidden inside a 200 response
pub fn check_payload(symbol: &str, payload: Value) -> Result<Value> {
    if let Some(message) = payload.get("Error Message") {
        return Err(MarketError::AlphaVantageError(text(message)));
    }

    for key in ["Note", "Information"] {
        if let Some(message) = payload.get(key) {
            let message = text(message);
            let lower = message.to_lowercase();
            if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
                return Err(MarketError::RateLimitExceeded {
                    provider: PROVIDER.to_string(),
                    message,
                });
            }
            return Err(MarketError::AlphaVantageError(message));
        }
    }

    if payload.as_object().is_some_and(serde_json::Map::is_empty) {
        return Err(MarketError::InvalidSymbol(symbol.to_string()));
    }

    Ok(payload)
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}

/// Parse a `GLOBAL_QUOTE` payload
pub fn parse_global_quote(symbol: &str, payload: &Value) -> Result<GlobalQuote> {
    let quote = payload
        .get("Global Quote")
        .filter(|q| q.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| MarketError::InvalidSymbol(symbol.to_string()))?;

    let raw: RawGlobalQuote = serde_json::from_value(quote.clone())?;

    let price = parse_number(&raw.price).ok_or_else(|| MarketError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: format!("unparseable price {:?}", raw.price),
    })?;

    Ok(GlobalQuote {
        symbol: raw.symbol,
        price,
        volume: raw.volume.trim().parse().unwrap_or(0),
        latest_trading_day: NaiveDate::parse_from_str(raw.latest_trading_day.trim(), "%Y-%m-%d")
            .ok(),
        previous_close: parse_number(&raw.previous_close),
        change: parse_number(&raw.change),
        change_percent: parse_number(&raw.change_percent),
    })
}

/// Free cash flow from the most recent annual `CASH_FLOW` reports, oldest first.
///
/// FCF = operating cash flow − capital expenditures. Reports without an
/// operating cash flow are skipped; a missing capex counts as zero.
pub fn parse_cash_flow(symbol: &str, payload: &Value) -> Result<Vec<f64>> {
    let reports = payload
        .get("annualReports")
        .and_then(Value::as_array)
        .ok_or_else(|| MarketError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no annual cash flow reports".to_string(),
        })?;

    // Reports arrive newest first
    let mut fcf: Vec<f64> = reports
        .iter()
        .filter_map(|report| {
            let operating = report
                .get("operatingCashflow")
                .and_then(Value::as_str)
                .and_then(parse_number)?;
            let capex = report
                .get("capitalExpenditures")
                .and_then(Value::as_str)
                .and_then(parse_number)
                .unwrap_or(0.0);
            Some(operating - capex)
        })
        .take(MAX_CASH_FLOW_YEARS)
        .collect();

    fcf.reverse();
    Ok(fcf)
}

/// Parse `TIME_SERIES_DAILY` into date order, keeping about one trading year
pub fn parse_daily(symbol: &str, payload: &Value) -> Result<Vec<PricePoint>> {
    let series = payload
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .ok_or_else(|| MarketError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no daily time series".to_string(),
        })?;

    let mut points: Vec<PricePoint> = series
        .iter()
        .filter_map(|(date, values)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            let price = values
                .get("4. close")
                .and_then(Value::as_str)
                .and_then(parse_number)?;
            let volume = values
                .get("5. volume")
                .and_then(Value::as_str)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            Some(PricePoint {
                date,
                price,
                volume,
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    if points.len() > MAX_DAILY_POINTS {
        points.drain(..points.len() - MAX_DAILY_POINTS);
    }
    Ok(points)
}
