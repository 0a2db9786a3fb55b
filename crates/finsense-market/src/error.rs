//! Error types for market data operations

use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Provider refused the call because of its quota
    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimitExceeded { provider: String, message: String },

    /// Non-success HTTP status
    #[error("HTTP {status} from {provider}")]
    HttpStatus { provider: String, status: u16 },

    /// Network or HTTP error, with the request URL stripped
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// The request URL carries the API key as a query parameter
impl From<reqwest::Error> for MarketError {
    fn from(error: reqwest::Error) -> Self {
        Self::NetworkError(error.without_url())
    }
}

impl MarketError {
    /// Whether the provider's quota is exhausted, which switches the fetcher to demo data
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Transient failures worth another attempt after a backoff
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = MarketError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }

    #[test]
    fn test_error_classification() {
        let limit = MarketError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
            message: "5 calls per minute".to_string(),
        };
        assert!(limit.is_rate_limit());
        assert!(!limit.is_retryable());

        let server = MarketError::HttpStatus {
            provider: "Alpha Vantage".to_string(),
            status: 503,
        };
        assert!(server.is_retryable());
        assert!(!server.is_rate_limit());

        let client = MarketError::HttpStatus {
            provider: "Alpha Vantage".to_string(),
            status: 404,
        };
        assert!(!client.is_retryable());
        assert!(!MarketError::InvalidSymbol("X".to_string()).is_retryable());
    }
}
