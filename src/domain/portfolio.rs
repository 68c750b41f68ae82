use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An open holding. `average_price > 0` is guaranteed by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub average_price: f64,
    pub current_price: f64,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    pub fn pnl(&self) -> f64 {
        (self.current_price - self.average_price) * self.quantity
    }

    /// `None` when there is no cost basis to divide by.
    pub fn pnl_percent(&self) -> Option<f64> {
        if self.average_price > 0.0 {
            Some((self.current_price - self.average_price) / self.average_price * 100.0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    /// Display-form symbol, or a bucket name such as `Cash`.
    pub name: String,
    pub percent: f64,
}

/// Canonical portfolio record. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_return_percent: f64,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub cash: f64,
    /// Backend-sourced, not renormalized: the total may drift from 100.
    pub allocation: Vec<AllocationSlice>,
    pub positions: Vec<Position>,
}

impl PortfolioSummary {
    pub fn allocation_total(&self) -> f64 {
        self.allocation.iter().map(|a| a.percent).sum()
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.positions.iter().map(Position::pnl).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// 1-based, strictly increasing.
    pub day_index: u32,
    pub value: f64,
    pub returns_percent: f64,
    pub date: Option<NaiveDateTime>,
}

impl PerformancePoint {
    pub fn label(&self) -> String {
        format!("Day {}", self.day_index)
    }
}
