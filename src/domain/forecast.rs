use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ErrorMetrics;

/// One sampled period of a forecast, overlaid with the actual candle when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickPoint {
    pub timestamp: Option<NaiveDateTime>,
    /// Short axis label (`HH:MM`).
    pub label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub predicted: f64,
    pub has_actual: bool,
    /// Only ever `Some` when `has_actual` is true.
    pub error: Option<f64>,
}

impl CandlestickPoint {
    /// Forces `error` to `None` for points without an actual close.
    pub fn with_error(mut self, error: Option<f64>) -> Self {
        self.error = if self.has_actual { error } else { None };
        self
    }
}

/// Canonical forecast/evaluation record for one instrument.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastEvaluation {
    /// Display-form symbol the record was fetched for.
    pub instrument: Option<String>,
    pub forecast_id: Option<String>,
    pub candlesticks: Vec<CandlestickPoint>,
    /// `None` means no forecast has been evaluated yet. Not an error.
    pub error_metrics: Option<ErrorMetrics>,
    pub evaluated_points: usize,
    pub total_points: usize,
}

impl ForecastEvaluation {
    /// The "no forecast yet" record.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.candlesticks.is_empty() && self.error_metrics.is_none()
    }

    pub fn for_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    /// The forecast id, only if this record belongs to `instrument`.
    pub fn forecast_id_for(&self, instrument: &str) -> Option<&str> {
        match &self.instrument {
            Some(owner) if owner == instrument => self.forecast_id.as_deref(),
            _ => None,
        }
    }
}
