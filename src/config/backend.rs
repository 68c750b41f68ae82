use std::time::Duration;

/// Runtime settings for the HTTP backend client.
/// `Default` reads the `BACKEND` blueprint; the CLI overrides individual fields.
/// Retry settings live on `EngineConfig`, which owns the retry loop.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: BACKEND.base_url.to_string(),
            timeout_ms: BACKEND.client.timeout_ms,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    /// Transport-level retries only. HTTP and logical failures are never retried.
    pub retries: u32,
    pub backoff_ms: u64,
}

/// REST paths served by the forecasting/trading backend.
pub struct Endpoints {
    pub forecast_start: &'static str,
    pub forecast_evaluate: &'static str,
    pub forecast_update_evaluation: &'static str,
    pub portfolio_summary: &'static str,
    pub portfolio_positions: &'static str,
    pub portfolio_buy: &'static str,
    pub portfolio_sell: &'static str,
    pub portfolio_performance: &'static str,
    pub portfolio_execute_strategy: &'static str,
}

pub struct BackendBlueprint {
    pub base_url: &'static str,
    pub default_portfolio_id: &'static str,
    pub client: ClientDefaults,
    pub endpoints: Endpoints,
}

pub const BACKEND: BackendBlueprint = BackendBlueprint {
    base_url: "http://localhost:5001",
    default_portfolio_id: "default",
    client: ClientDefaults {
        timeout_ms: 15_000,
        retries: 2,
        backoff_ms: 500,
    },
    endpoints: Endpoints {
        forecast_start: "/api/forecast/start",
        forecast_evaluate: "/api/forecast/evaluate",
        forecast_update_evaluation: "/api/forecast/update-evaluation",
        portfolio_summary: "/api/portfolio/summary",
        portfolio_positions: "/api/portfolio/positions",
        portfolio_buy: "/api/portfolio/buy",
        portfolio_sell: "/api/portfolio/sell",
        portfolio_performance: "/api/portfolio/performance",
        portfolio_execute_strategy: "/api/portfolio/execute-strategy",
    },
};
