//! Command-line interface for FinSense

mod analysis;
mod error;
mod output;

use std::sync::Arc;

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use finsense_dcf::{DcfCalculator, WaccInputs};
use finsense_market::{DailyOutputSize, FinancialDataFetcher, MarketConfig};
use finsense_utils::{AppConfig, LogFormat, init_tracing_with};

use crate::analysis::{
    AnalysisRequest, Analyzer, DEFAULT_MONTE_CARLO_RUNS, MAX_MONTE_CARLO_RUNS, validate_ticker,
};

#[derive(Parser, Debug)]
#[command(name = "finsense")]
#[command(about = "DCF valuation with Monte Carlo analysis", long_about = None, version)]
struct Cli {
    /// Fetch live data from Alpha Vantage (needs ALPHA_VANTAGE_API_KEY)
    #[arg(long, global = true)]
    live: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Request the full daily series (premium Alpha Vantage keys)
    #[arg(long, global = true)]
    full_history: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a DCF valuation with a Monte Carlo sweep
    Analyze {
        /// Stock ticker (1-5 letters)
        ticker: String,

        /// FCF growth rate, e.g. 0.08 for 8%
        #[arg(long, allow_negative_numbers = true)]
        growth: Option<f64>,

        /// Discount rate (WACC)
        #[arg(long)]
        discount: Option<f64>,

        /// Terminal growth rate
        #[arg(long)]
        terminal: Option<f64>,

        /// Monte Carlo scenarios
        #[arg(
            long,
            default_value_t = DEFAULT_MONTE_CARLO_RUNS,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_MONTE_CARLO_RUNS as u64)
        )]
        runs: usize,

        /// Seed for reproducible simulations
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the fetched data for a ticker
    Stock { ticker: String },
    /// Show volatility and trading range for a ticker
    Market { ticker: String },
    /// List trending tickers
    Tickers,
    /// Compute a WACC from CAPM inputs
    Wacc {
        #[arg(long)]
        beta: Option<f64>,
        #[arg(long)]
        risk_free_rate: Option<f64>,
        #[arg(long)]
        market_risk_premium: Option<f64>,
        #[arg(long, default_value_t = 0.05)]
        cost_of_debt: f64,
        #[arg(long, default_value_t = 0.25)]
        tax_rate: f64,
        #[arg(long, default_value_t = 0.3)]
        debt_to_equity: f64,
    },
    /// Show demo-mode status
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, table: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", table(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = AppConfig::from_env();
    let directive = if cli.verbose {
        "debug"
    } else {
        app.default_log_directive()
    };
    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing_with(directive, log_format);

    info!(app = %app.app_name, environment = %app.environment, "Starting finsense");

    let config = MarketConfig::builder()
        .with_env_api_key()
        .demo_mode(!cli.live)
        .daily_output_size(if cli.full_history {
            DailyOutputSize::Full
        } else {
            DailyOutputSize::Compact
        })
        .build()
        .context("invalid market configuration")?;
    let fetcher = Arc::new(FinancialDataFetcher::new(config)?);

    match cli.command {
        Commands::Analyze {
            ticker,
            growth,
            discount,
            terminal,
            runs,
            seed,
        } => {
            let calculator = match seed {
                Some(seed) => DcfCalculator::default().with_seed(seed),
                None => DcfCalculator::default(),
            };
            let analyzer = Analyzer::new(Arc::clone(&fetcher), calculator).with_monte_carlo_runs(runs);
            let request = AnalysisRequest {
                growth_rate: growth,
                discount_rate: discount,
                terminal_growth: terminal,
            };
            let report = analyzer
                .analyze(&ticker, &request)
                .await
                .with_context(|| format!("analysis of {ticker} failed"))?;
            emit(cli.format, &report, output::render_report)?;
        }
        Commands::Stock { ticker } => {
            let ticker = validate_ticker(&ticker)?;
            let data = fetcher.get_stock_data(&ticker).await?;
            emit(cli.format, &data, output::render_stock)?;
        }
        Commands::Market { ticker } => {
            let ticker = validate_ticker(&ticker)?;
            let data = fetcher.get_market_data(&ticker).await?;
            emit(cli.format, &data, |d| output::render_market(&ticker, d))?;
        }
        Commands::Tickers => {
            let rows = fetcher.get_popular_tickers().await;
            emit(cli.format, &rows, |r| output::render_tickers(r))?;
        }
        Commands::Wacc {
            beta,
            risk_free_rate,
            market_risk_premium,
            cost_of_debt,
            tax_rate,
            debt_to_equity,
        } => {
            let inputs = WaccInputs {
                beta,
                risk_free_rate,
                market_risk_premium,
                cost_of_debt,
                tax_rate,
                debt_to_equity,
            };
            let wacc = DcfCalculator::default().calculate_wacc(&inputs);
            emit(
                cli.format,
                &serde_json::json!({ "inputs": inputs, "wacc": wacc }),
                |_| format!("WACC: {:.2}%", wacc * 100.0),
            )?;
        }
        Commands::Status => {
            let status = fetcher.demo_status();
            emit(cli.format, &status, output::render_status)?;
        }
    }

    Ok(())
}
