#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod utils;

// Re-export commonly used types outside of crate
pub use config::{BACKEND, BackendConfig, DASHBOARD, EngineConfig};
pub use data::{BackendClient, BackendError, ForecastBackend};
pub use engine::{AppState, DashboardEngine};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::data::{Horizon, Strategy};
use crate::utils::TimeUtils;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, default_value_t = BACKEND.base_url.to_string())]
    pub base_url: String,

    #[arg(long, default_value_t = BACKEND.default_portfolio_id.to_string())]
    pub portfolio_id: String,

    /// Instrument in display form (e.g. BTC/USD)
    #[arg(long, default_value_t = DASHBOARD.default_instrument.to_string())]
    pub instrument: String,

    /// Quiet period after an instrument switch, in milliseconds
    #[arg(long, default_value_t = DASHBOARD.instrument_debounce.as_millis() as u64)]
    pub debounce_ms: u64,

    /// Performance history window
    #[arg(long, default_value_t = DASHBOARD.performance_days)]
    pub days: u32,

    /// Buy this quantity of the instrument before reporting
    #[arg(long)]
    pub buy: Option<f64>,

    /// Sell this quantity of the instrument before reporting
    #[arg(long)]
    pub sell: Option<f64>,

    /// Run a strategy (momentum, conservative, aggressive) on the instrument
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Start a forecast run first (e.g. 24d, 3mo, 1yr)
    #[arg(long)]
    pub forecast: Option<Horizon>,
}

impl Cli {
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone(),
            ..BackendConfig::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            portfolio_id: self.portfolio_id.clone(),
            initial_instrument: self.instrument.clone(),
            performance_days: self.days,
            ..EngineConfig::default()
        }
    }
}

/// Headless session: fetch everything once, run any requested commands, print the result.
pub async fn run(args: Cli) -> anyhow::Result<()> {
    let backend_config = args.backend_config();
    let client = BackendClient::new(&backend_config)
        .with_context(|| format!("Failed to build backend client for {}", args.base_url))?;

    let engine_config = args.engine_config();
    let mut engine = DashboardEngine::new(Arc::new(client), engine_config);
    engine.bootstrap();
    engine.refresh_performance();
    engine.settle().await;

    if let Some(horizon) = args.forecast {
        report_rejected(engine.start_forecast(horizon));
    }
    if let Some(quantity) = args.buy {
        report_rejected(engine.buy(&args.instrument, quantity, None));
    }
    if let Some(quantity) = args.sell {
        report_rejected(engine.sell(&args.instrument, quantity, None));
    }
    if let Some(strategy) = args.strategy {
        report_rejected(engine.execute_strategy(strategy));
    }
    engine.settle().await;

    print_report(&engine.snapshot());
    Ok(())
}

/// Rejected input is already recorded in `AppState.error`.
fn report_rejected(result: Result<(), BackendError>) {
    if let Err(e) = result {
        log::warn!("Command not sent: {}", e);
    }
}

#[derive(Tabled)]
struct MetricRow {
    instrument: String,
    mae: String,
    rmse: String,
    mape: String,
    accuracy: String,
    evaluated: String,
}

#[derive(Tabled)]
struct PositionRow {
    symbol: String,
    quantity: String,
    avg_price: String,
    price: String,
    value: String,
    pnl: String,
    pnl_pct: String,
}

#[derive(Tabled)]
struct AllocationRow {
    name: String,
    percent: String,
}

#[derive(Tabled)]
struct PerformanceRow {
    day: String,
    date: String,
    value: String,
    returns: String,
}

fn print_report(state: &AppState) {
    let evaluation = &state.evaluation;
    let metrics = if state.metrics_unavailable() {
        MetricRow {
            instrument: state.active_instrument.clone(),
            mae: "-".into(),
            rmse: "-".into(),
            mape: "-".into(),
            accuracy: "no forecast".into(),
            evaluated: "-".into(),
        }
    } else {
        MetricRow {
            instrument: state.active_instrument.clone(),
            mae: format!("{:.4}", state.metrics.mae),
            rmse: format!("{:.4}", state.metrics.rmse),
            mape: format!("{:.2}%", state.metrics.mape),
            accuracy: format!("{:.2}%", state.metrics.accuracy),
            evaluated: format!("{}/{}", evaluation.evaluated_points, evaluation.total_points),
        }
    };
    println!("{}", Table::new([metrics]).with(Style::rounded()));

    match &state.portfolio_summary {
        Some(summary) => {
            println!(
                "Portfolio {:.2} | return {:.2}% | sharpe {:.2} | cash {:.2} | unrealized {:.2}",
                summary.total_value,
                summary.total_return_percent,
                summary.sharpe_ratio,
                summary.cash,
                summary.unrealized_pnl()
            );

            let positions = state.portfolio_positions.iter().map(|p| PositionRow {
                symbol: p.symbol.clone(),
                quantity: format!("{}", p.quantity),
                avg_price: format!("{:.2}", p.average_price),
                price: format!("{:.2}", p.current_price),
                value: format!("{:.2}", p.market_value()),
                pnl: format!("{:.2}", p.pnl()),
                pnl_pct: p
                    .pnl_percent()
                    .map(|v| format!("{:.2}%", v))
                    .unwrap_or_else(|| "-".into()),
            });
            println!("{}", Table::new(positions).with(Style::rounded()));

            let allocation = summary.allocation.iter().map(|a| AllocationRow {
                name: a.name.clone(),
                percent: format!("{:.1}%", a.percent),
            });
            println!("{}", Table::new(allocation).with(Style::rounded()));
            println!("Allocation total {:.1}%", summary.allocation_total());
        }
        None => println!(
            "Portfolio unavailable ({:.2} assumed)",
            DASHBOARD.fallback_portfolio_value
        ),
    }

    if !state.performance.is_empty() {
        let rows = state.performance.iter().map(|p| PerformanceRow {
            day: p.label(),
            date: p
                .date
                .as_ref()
                .map(TimeUtils::date_label)
                .unwrap_or_else(|| "-".into()),
            value: format!("{:.2}", p.value),
            returns: format!("{:.2}%", p.returns_percent),
        });
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if let Some(notice) = &state.notice {
        println!("{}", notice);
    }
    if let Some(error) = &state.error {
        eprintln!("Error: {}", error);
    }
}
