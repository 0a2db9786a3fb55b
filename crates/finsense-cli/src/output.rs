//! Terminal rendering for command results

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use finsense_market::{DemoStatus, MarketData, StockData, TickerSummary};

use crate::analysis::AnalysisReport;

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(Cell::new));
    table
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn optional_money(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), money)
}

/// Scale large values to K/M/B/T
fn compact(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (value / 1e12, "T")
    } else if abs >= 1e9 {
        (value / 1e9, "B")
    } else if abs >= 1e6 {
        (value / 1e6, "M")
    } else if abs >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    format!("{scaled:.2}{suffix}")
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn render_report(report: &AnalysisReport) -> String {
    let stock = &report.stock_data;
    let dcf = &report.dcf_results;
    let base = &dcf.base_case;

    let mut summary = table(&["Metric", "Value"]);
    summary
        .add_row(vec!["Ticker".to_string(), report.ticker.clone()])
        .add_row(vec!["Company".to_string(), stock.company_name.clone()])
        .add_row(vec!["Data source".to_string(), stock.data_source.to_string()])
        .add_row(vec!["Current price".to_string(), money(stock.current_price)])
        .add_row(vec![
            "DCF value / share".to_string(),
            optional_money(base.equity_value_per_share),
        ])
        .add_row(vec!["Enterprise value".to_string(), compact(base.enterprise_value)])
        .add_row(vec!["Equity value".to_string(), compact(base.equity_value)])
        .add_row(vec![
            "PV explicit period".to_string(),
            compact(base.pv_explicit_period),
        ])
        .add_row(vec!["PV terminal value".to_string(), compact(base.pv_terminal_value)])
        .add_row(vec!["Base FCF".to_string(), compact(dcf.assumptions.base_fcf)])
        .add_row(vec!["Growth".to_string(), pct(dcf.assumptions.growth_rate)])
        .add_row(vec!["WACC".to_string(), pct(dcf.assumptions.wacc)])
        .add_row(vec![
            "Terminal growth".to_string(),
            pct(dcf.assumptions.terminal_growth),
        ]);

    if let Some(metrics) = &report.valuation_metrics {
        summary
            .add_row(vec!["DCF vs current".to_string(), pct(metrics.dcf_vs_current)])
            .add_row(vec!["FCF yield".to_string(), pct(metrics.fcf_yield)])
            .add_row(vec![
                "Price / FCF".to_string(),
                format!("{:.2}", metrics.price_to_fcf),
            ]);
    }

    let mut out = summary.to_string();

    out.push_str("\n\nMonte Carlo");
    match &dcf.monte_carlo.stats {
        Some(stats) => {
            let mut mc = table(&["Runs", "Mean", "Median", "Std", "P5", "P25", "P75", "P95"]);
            mc.add_row(vec![
                dcf.monte_carlo.count.to_string(),
                money(stats.mean),
                money(stats.median),
                money(stats.std),
                money(stats.p5),
                money(stats.p25),
                money(stats.p75),
                money(stats.p95),
            ]);
            out.push('\n');
            out.push_str(&mc.to_string());
        }
        None => out.push_str(": no finite outcomes"),
    }

    if !dcf.sample_scenarios.is_empty() {
        let mut scenarios =
            table(&["Base FCF", "Growth", "WACC", "Terminal", "EV", "Value / share", "Recession"]);
        for s in &dcf.sample_scenarios {
            scenarios.add_row(vec![
                compact(s.base_fcf),
                pct(s.growth_rate),
                pct(s.wacc),
                pct(s.terminal_growth),
                compact(s.enterprise_value),
                optional_money(s.equity_value_per_share),
                if s.recession { "yes" } else { "no" }.to_string(),
            ]);
        }
        out.push_str("\n\nSample scenarios\n");
        out.push_str(&scenarios.to_string());
    }

    let diagnostics = &dcf.diagnostics;
    out.push_str("\n\nDiagnostics\n");
    let mut diag = table(&["Check", "Value"]);
    diag.add_row(vec![
        "Terminal share of EV".to_string(),
        diagnostics
            .terminal_value_share
            .map_or_else(|| "n/a".to_string(), pct),
    ])
    .add_row(vec![
        "Duration (years)".to_string(),
        diagnostics
            .duration_years_pv_cashflows
            .map_or_else(|| "n/a".to_string(), |d| format!("{d:.2}")),
    ]);
    for flag in &diagnostics.health_flags {
        diag.add_row(vec!["Warning".to_string(), flag.to_string()]);
    }
    out.push_str(&diag.to_string());

    out
}

pub fn render_stock(stock: &StockData) -> String {
    let mut t = table(&["Field", "Value"]);
    t.add_row(vec!["Ticker".to_string(), stock.ticker.clone()])
        .add_row(vec!["Company".to_string(), stock.company_name.clone()])
        .add_row(vec!["Price".to_string(), money(stock.current_price)])
        .add_row(vec!["Market cap".to_string(), compact(stock.market_cap)])
        .add_row(vec!["Shares outstanding".to_string(), compact(stock.shares_outstanding)])
        .add_row(vec![
            "FCF history".to_string(),
            if stock.fcf_data.is_empty() {
                "n/a".to_string()
            } else {
                stock
                    .fcf_data
                    .iter()
                    .map(|v| compact(*v))
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        ])
        .add_row(vec!["FCF growth".to_string(), pct(stock.fcf_growth_rate)])
        .add_row(vec![
            "Sector".to_string(),
            stock.info.sector.clone().unwrap_or_default(),
        ])
        .add_row(vec![
            "Industry".to_string(),
            stock.info.industry.clone().unwrap_or_default(),
        ])
        .add_row(vec!["Source".to_string(), stock.data_source.to_string()]);
    t.to_string()
}

pub fn render_tickers(rows: &[TickerSummary]) -> String {
    let mut t = table(&["Symbol", "Name", "Price", "Change", "Market cap", "Demo"]);
    for row in rows {
        t.add_row(vec![
            row.symbol.clone(),
            row.name.clone(),
            money(row.price),
            format!("{:+.2}%", row.change),
            compact(row.market_cap),
            if row.is_demo { "yes" } else { "no" }.to_string(),
        ]);
    }
    t.to_string()
}

pub fn render_market(ticker: &str, data: &MarketData) -> String {
    let mut t = table(&["Metric", ticker]);
    t.add_row(vec!["Volatility (annual)".to_string(), pct(data.volatility)])
        .add_row(vec!["Beta".to_string(), format!("{:.2}", data.beta)])
        .add_row(vec!["Period high".to_string(), money(data.week_52_high)])
        .add_row(vec!["Period low".to_string(), money(data.week_52_low)])
        .add_row(vec!["Average volume".to_string(), compact(data.avg_volume)]);
    t.to_string()
}

pub fn render_status(status: &DemoStatus) -> String {
    let mut t = table(&["Flag", "Value"]);
    t.add_row(vec!["Demo mode".to_string(), status.demo_mode.to_string()])
        .add_row(vec![
            "API limit exceeded".to_string(),
            status.api_limit_exceeded.to_string(),
        ])
        .add_row(vec![
            "Manual demo mode".to_string(),
            status.manual_demo_mode.to_string(),
        ])
        .add_row(vec![
            "API key configured".to_string(),
            status.api_key_configured.to_string(),
        ]);
    t.to_string()
}
