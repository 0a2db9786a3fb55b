//! Market data records shared by the live client, the demo generator and the fetcher

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    #[serde(rename = "Alpha Vantage Free Tier")]
    AlphaVantage,
    #[serde(rename = "Demo Data (API Limit Exceeded)")]
    Demo,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::AlphaVantage => "Alpha Vantage Free Tier",
            Self::Demo => "Demo Data (API Limit Exceeded)",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One daily close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: f64,
    pub net_income: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub total_expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub shareholders_equity: f64,
    pub cash_and_equivalents: f64,
    pub total_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub operating_cash_flow: f64,
    pub investing_cash_flow: f64,
    pub financing_cash_flow: f64,
    pub free_cash_flow: f64,
}

/// Descriptive company attributes; every field is optional because
/// the live overview endpoint may be unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
}

/// Everything the valuation needs about one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub ticker: String,
    pub company_name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub shares_outstanding: f64,
    /// Free cash flow history, oldest first. Empty when unavailable.
    pub fcf_data: Vec<f64>,
    pub fcf_growth_rate: f64,
    pub financials: Option<IncomeStatement>,
    pub balance_sheet: Option<BalanceSheet>,
    pub cashflow: Option<CashFlowStatement>,
    pub price_history: Vec<PricePoint>,
    pub info: CompanyInfo,
    pub data_source: DataSource,
    pub is_demo: bool,
    pub fetched_at: DateTime<Utc>,
}

impl StockData {
    /// Skeleton record for a live fetch before any endpoint has answered
    pub fn empty_live(ticker: impl Into<String>) -> Self {
        let ticker = ticker.into();
        Self {
            company_name: ticker.clone(),
            ticker,
            current_price: 0.0,
            market_cap: 0.0,
            shares_outstanding: 0.0,
            fcf_data: Vec::new(),
            fcf_growth_rate: 0.0,
            financials: None,
            balance_sheet: None,
            cashflow: None,
            price_history: Vec::new(),
            info: CompanyInfo::default(),
            data_source: DataSource::AlphaVantage,
            is_demo: false,
            fetched_at: Utc::now(),
        }
    }
}

/// Row of the trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Daily change in percent
    pub change: f64,
    pub market_cap: f64,
    pub timestamp: DateTime<Utc>,
    pub is_demo: bool,
}

/// Price-derived context for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    /// Annualised volatility of daily returns
    pub volatility: f64,
    pub beta: f64,
    /// Highest close in the fetched window. Live data covers the last 100
    /// sessions unless full daily output is configured.
    #[serde(rename = "52_week_high")]
    pub week_52_high: f64,
    /// Lowest close in the same window
    #[serde(rename = "52_week_low")]
    pub week_52_low: f64,
    pub avg_volume: f64,
}

/// Demo-mode flags as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoStatus {
    /// Effective mode: manual OR limit exceeded
    pub demo_mode: bool,
    pub api_limit_exceeded: bool,
    pub manual_demo_mode: bool,
    pub api_key_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_serializes_as_label() {
        let json = serde_json::to_string(&DataSource::Demo).unwrap();
        assert_eq!(json, "\"Demo Data (API Limit Exceeded)\"");
        assert_eq!(DataSource::AlphaVantage.to_string(), "Alpha Vantage Free Tier");
    }

    #[test]
    fn test_market_data_field_names() {
        let data = MarketData {
            volatility: 0.25,
            beta: 1.0,
            week_52_high: 200.0,
            week_52_low: 100.0,
            avg_volume: 1e6,
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["52_week_high"], 200.0);
        assert_eq!(value["52_week_low"], 100.0);
    }

    #[test]
    fn test_empty_live_record() {
        let data = StockData::empty_live("IBM");
        assert_eq!(data.company_name, "IBM");
        assert!(data.fcf_data.is_empty());
        assert!(!data.is_demo);
        assert_eq!(data.data_source, DataSource::AlphaVantage);
    }
}
