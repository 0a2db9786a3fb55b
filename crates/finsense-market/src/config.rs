//! Configuration for market data operations

use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Alpha Vantage query endpoint
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Environment variable holding the Alpha Vantage key
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// `outputsize` for `TIME_SERIES_DAILY`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyOutputSize {
    /// Latest 100 sessions, available on the free tier
    #[default]
    Compact,
    /// Full history, trimmed to one trading year (premium keys)
    Full,
}

impl DailyOutputSize {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

/// Configuration for market data operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Alpha Vantage API key (optional; without it only demo data is served)
    pub alpha_vantage_api_key: Option<String>,

    /// Provider endpoint
    pub base_url: String,

    /// Minimum spacing between provider calls
    pub min_request_interval: Duration,

    /// How long fetched data stays cached
    pub cache_ttl: Duration,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// History depth behind the high/low range and volatility
    pub daily_output_size: DailyOutputSize,

    /// Start in demo mode
    pub demo_mode: bool,

    /// Symbols shown as trending when live data is used
    pub popular_tickers: Vec<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            min_request_interval: Duration::from_secs(12), // free tier: 5 calls per minute
            cache_ttl: Duration::from_secs(300),           // 5 minutes
            max_retries: 2,
            retry_backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            daily_output_size: DailyOutputSize::Compact,
            demo_mode: true,
            popular_tickers: vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()],
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_api_key() {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_request_interval.is_zero() {
            return Err(MarketError::ConfigError(
                "min_request_interval must be greater than 0".to_string(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(MarketError::ConfigError(
                "cache_ttl must be greater than 0".to_string(),
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(MarketError::ConfigError("base_url must not be empty".to_string()));
        }

        if self
            .alpha_vantage_api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            return Err(MarketError::ConfigError(
                "Alpha Vantage API key must not be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Get retry backoff duration for attempt number
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff_base * 2_u32.saturating_pow(attempt)
    }
}

fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    alpha_vantage_api_key: Option<String>,
    base_url: Option<String>,
    min_request_interval: Option<Duration>,
    cache_ttl: Option<Duration>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    request_timeout: Option<Duration>,
    daily_output_size: Option<DailyOutputSize>,
    demo_mode: Option<bool>,
    popular_tickers: Option<Vec<String>>,
}

impl MarketConfigBuilder {
    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Some(key) = env_api_key() {
            self.alpha_vantage_api_key = Some(key);
        }
        self
    }

    /// Override the provider endpoint
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set minimum spacing between provider calls
    pub fn min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = Some(interval);
        self
    }

    /// Set cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the daily series depth
    pub fn daily_output_size(mut self, size: DailyOutputSize) -> Self {
        self.daily_output_size = Some(size);
        self
    }

    /// Start in (or out of) demo mode
    pub fn demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = Some(enabled);
        self
    }

    /// Set the trending symbols
    pub fn popular_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.popular_tickers = Some(tickers.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            base_url: self.base_url.unwrap_or(defaults.base_url),
            min_request_interval: self
                .min_request_interval
                .unwrap_or(defaults.min_request_interval),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            daily_output_size: self.daily_output_size.unwrap_or(defaults.daily_output_size),
            demo_mode: self.demo_mode.unwrap_or(defaults.demo_mode),
            popular_tickers: self.popular_tickers.unwrap_or(defaults.popular_tickers),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MarketConfig::default();
        assert_eq!(config.min_request_interval, Duration::from_secs(12));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.demo_mode);
        assert_eq!(config.daily_output_size.as_param(), "compact");
        assert_eq!(config.popular_tickers, vec!["AAPL", "MSFT", "GOOGL"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MarketConfig::builder()
            .alpha_vantage_api_key("test_key")
            .demo_mode(false)
            .max_retries(5)
            .request_timeout(Duration::from_secs(60))
            .popular_tickers(["NVDA"])
            .daily_output_size(DailyOutputSize::Full)
            .build()
            .unwrap();

        assert_eq!(config.alpha_vantage_api_key.as_deref(), Some("test_key"));
        assert!(!config.demo_mode);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.popular_tickers, vec!["NVDA"]);
        assert_eq!(config.daily_output_size, DailyOutputSize::Full);
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let result = MarketConfig::builder()
            .min_request_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(MarketError::ConfigError(_))));
    }

    #[test]
    fn test_validation_rejects_blank_key() {
        let config = MarketConfig {
            alpha_vantage_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_backoff() {
        let config = MarketConfig::default();
        assert_eq!(config.retry_backoff(0), Duration::from_secs(1));
        assert_eq!(config.retry_backoff(1), Duration::from_secs(2));
        assert_eq!(config.retry_backoff(2), Duration::from_secs(4));
    }
}
