use serde::{Deserialize, Serialize};

/// Aggregate forecast error over the points that already have actual prices.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
}

impl ErrorMetrics {
    /// Negative or non-finite inputs are floored to zero.
    pub fn new(mae: f64, rmse: f64, mape: f64) -> Self {
        Self {
            mae: non_negative(mae),
            rmse: non_negative(rmse),
            mape: non_negative(mape),
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// `clamp(100 - mape, 0, 100)`. NaN reads as zero accuracy.
pub fn compute_accuracy(mape: f64) -> f64 {
    if mape.is_nan() {
        return 0.0;
    }
    (100.0 - mape).clamp(0.0, 100.0)
}

/// The view-ready metrics card: error metrics plus derived accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecasterMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub mape: f64,
    pub accuracy: f64,
}

impl From<ErrorMetrics> for ForecasterMetrics {
    fn from(m: ErrorMetrics) -> Self {
        Self {
            mae: m.mae,
            rmse: m.rmse,
            mape: m.mape,
            accuracy: compute_accuracy(m.mape),
        }
    }
}
