//! Errors surfaced by the analysis layer

use finsense_dcf::DcfError;
use finsense_market::MarketError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Ticker failed the 1-5 letter check
    #[error("Invalid ticker {0:?}: expected 1-5 letters")]
    InvalidTicker(String),

    /// A request parameter is out of bounds
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Dcf(#[from] DcfError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
