//! Raw backend payloads. Every field is optional so a partially populated
//! response still deserializes; the normalizers decide the defaults.

use serde::Deserialize;

/// `{ success, message, data }` wrapper used by the portfolio endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
}

/// Reply to the command-style endpoints (start forecast, buy, sell, execute strategy).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub message: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawCandlestick {
    pub date: Option<String>,
    pub time: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub predicted: Option<f64>,
    pub error: Option<f64>,
    pub error_percent: Option<f64>,
    pub has_actual: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawErrorMetrics {
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub mape: Option<f64>,
    pub evaluated_points: Option<usize>,
    pub total_forecast_points: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawEvaluation {
    pub ticker: Option<String>,
    pub forecast_id: Option<String>,
    pub forecast_date: Option<String>,
    pub candlestick_data: Vec<RawCandlestick>,
    pub error_metrics: Option<RawErrorMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawAllocation {
    pub name: String,
    #[serde(alias = "percent")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPosition {
    pub symbol: String,
    pub quantity: Option<f64>,
    pub average_price: Option<f64>,
    pub current_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawPortfolioSummary {
    pub portfolio_id: Option<String>,
    pub total_value: Option<f64>,
    pub total_return: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub current_cash: Option<f64>,
    pub allocation: Vec<RawAllocation>,
    pub positions: Vec<RawPosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawPerformancePoint {
    pub date: Option<String>,
    pub value: Option<f64>,
    pub returns: Option<f64>,
}
