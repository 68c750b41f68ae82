//! Orchestrator blueprints (Immutable defaults for a dashboard session)

use std::time::Duration;

use crate::config::BACKEND;

pub struct DashboardBlueprint {
    /// Quiet period after an instrument switch before the metrics fetch is issued.
    pub instrument_debounce: Duration,
    /// Shown instead of zero while no portfolio summary has arrived yet.
    pub fallback_portfolio_value: f64,
    pub default_instrument: &'static str,
    pub instruments: &'static [&'static str],
    pub model_versions: &'static [&'static str],
    pub performance_days: u32,
    pub default_model: &'static str,
    pub default_trade_reason: &'static str,
    /// Backend failure text that means "nothing computed yet" rather than an error.
    pub no_forecast_marker: &'static str,
}

pub const DASHBOARD: DashboardBlueprint = DashboardBlueprint {
    instrument_debounce: Duration::from_millis(300),
    fallback_portfolio_value: 100_000.0,
    default_instrument: "BTC/USD",
    instruments: &["BTC/USD", "ETH/USD", "SPY", "EURUSD", "AAPL"],
    model_versions: &["v1.2.5", "v1.2.4", "v1.2.3"],
    performance_days: 30,
    default_model: "LSTM",
    default_trade_reason: "user_manual",
    no_forecast_marker: "No forecast found",
};

/// Live settings for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub portfolio_id: String,
    pub initial_instrument: String,
    pub performance_days: u32,
    pub fallback_portfolio_value: f64,
    pub model_versions: Vec<String>,
    pub retries: u32,
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DASHBOARD.instrument_debounce,
            portfolio_id: BACKEND.default_portfolio_id.to_string(),
            initial_instrument: DASHBOARD.default_instrument.to_string(),
            performance_days: DASHBOARD.performance_days,
            fallback_portfolio_value: DASHBOARD.fallback_portfolio_value,
            model_versions: DASHBOARD
                .model_versions
                .iter()
                .map(|v| v.to_string())
                .collect(),
            retries: BACKEND.client.retries,
            retry_backoff: Duration::from_millis(BACKEND.client.backoff_ms),
        }
    }
}
