//! Validated request types. Construction is the only way to get one, so the
//! backend client never sees a non-finite or non-positive amount.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::{BACKEND, DASHBOARD};
use crate::data::BackendError;
use crate::domain::to_wire_form;

fn validate_positive(name: &str, value: f64) -> Result<f64, BackendError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BackendError::invalid(format!(
            "{name} must be a finite positive number (got {value})"
        )))
    }
}

pub(crate) fn validate_ticker(ticker: &str) -> Result<String, BackendError> {
    let trimmed = ticker.trim();
    if trimmed.is_empty() {
        return Err(BackendError::invalid("ticker is required"));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TradeSide {
    #[strum(to_string = "buy")]
    Buy,
    #[strum(to_string = "sell")]
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    side: TradeSide,
    ticker: String,
    quantity: f64,
    price: Option<f64>,
    reason: String,
    portfolio_id: String,
}

impl TradeOrder {
    /// `ticker` may be in display or wire form. `price = None` lets the backend quote.
    pub fn new(
        side: TradeSide,
        ticker: &str,
        quantity: f64,
        price: Option<f64>,
    ) -> Result<Self, BackendError> {
        let ticker = validate_ticker(ticker)?;
        let quantity = validate_positive("quantity", quantity)?;
        let price = price.map(|p| validate_positive("price", p)).transpose()?;
        Ok(Self {
            side,
            ticker,
            quantity,
            price,
            reason: DASHBOARD.default_trade_reason.to_string(),
            portfolio_id: BACKEND.default_portfolio_id.to_string(),
        })
    }

    pub fn buy(ticker: &str, quantity: f64) -> Result<Self, BackendError> {
        Self::new(TradeSide::Buy, ticker, quantity, None)
    }

    pub fn sell(ticker: &str, quantity: f64) -> Result<Self, BackendError> {
        Self::new(TradeSide::Sell, ticker, quantity, None)
    }

    pub fn for_portfolio(mut self, portfolio_id: impl Into<String>) -> Self {
        self.portfolio_id = portfolio_id.into();
        self
    }

    pub fn side(&self) -> TradeSide {
        self.side
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "ticker": to_wire_form(&self.ticker),
            "quantity": self.quantity,
            "price": self.price,
            "reason": self.reason,
            "portfolio_id": self.portfolio_id,
        })
    }
}

/// Forecast horizon as the backend spells it: `24d`, `3mo`, `1yr` or a bare day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Days(u32),
    Months(u32),
    Years(u32),
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{}d", n),
            Self::Months(n) => write!(f, "{}mo", n),
            Self::Years(n) => write!(f, "{}yr", n),
        }
    }
}

impl FromStr for Horizon {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, ctor): (&str, fn(u32) -> Horizon) = if let Some(d) = s.strip_suffix("mo") {
            (d, Horizon::Months)
        } else if let Some(d) = s.strip_suffix("yr") {
            (d, Horizon::Years)
        } else if let Some(d) = s.strip_suffix('d') {
            (d, Horizon::Days)
        } else {
            (s, Horizon::Days)
        };
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(ctor(n)),
            _ => Err(BackendError::invalid(format!("unrecognised horizon '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastJob {
    ticker: String,
    horizon: Horizon,
    model: String,
    scheduled_time: Option<DateTime<Utc>>,
}

impl ForecastJob {
    pub fn new(ticker: &str, horizon: Horizon) -> Result<Self, BackendError> {
        Ok(Self {
            ticker: validate_ticker(ticker)?,
            horizon,
            model: DASHBOARD.default_model.to_string(),
            scheduled_time: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the backend to retrain at `when` instead of only now.
    pub fn scheduled_at(mut self, when: DateTime<Utc>) -> Self {
        self.scheduled_time = Some(when);
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "tickerName": to_wire_form(&self.ticker),
            "horizon": self.horizon.to_string(),
            "model_name": self.model,
            "scheduledTime": self.scheduled_time.map(|t| t.to_rfc3339()),
        })
    }
}

/// Which forecast to evaluate: the latest one for a ticker, or a specific id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastQuery {
    Ticker(String),
    ForecastId(String),
}

impl ForecastQuery {
    pub fn ticker(ticker: &str) -> Result<Self, BackendError> {
        Ok(Self::Ticker(validate_ticker(ticker)?))
    }

    pub fn forecast_id(id: &str) -> Result<Self, BackendError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(BackendError::invalid("forecast id is required"));
        }
        Ok(Self::ForecastId(id.to_string()))
    }

    pub(crate) fn to_query(&self) -> (&'static str, String) {
        match self {
            Self::Ticker(t) => ("ticker", to_wire_form(t)),
            Self::ForecastId(id) => ("forecast_id", id.clone()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    #[default]
    Momentum,
    Conservative,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRequest {
    ticker: String,
    strategy: Strategy,
    forecast_id: Option<String>,
    portfolio_id: String,
}

impl StrategyRequest {
    pub fn new(ticker: &str, strategy: Strategy) -> Result<Self, BackendError> {
        Ok(Self {
            ticker: validate_ticker(ticker)?,
            strategy,
            forecast_id: None,
            portfolio_id: BACKEND.default_portfolio_id.to_string(),
        })
    }

    pub fn with_forecast(mut self, forecast_id: Option<String>) -> Self {
        self.forecast_id = forecast_id;
        self
    }

    pub fn for_portfolio(mut self, portfolio_id: impl Into<String>) -> Self {
        self.portfolio_id = portfolio_id.into();
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn forecast_id(&self) -> Option<&str> {
        self.forecast_id.as_deref()
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "ticker": to_wire_form(&self.ticker),
            "strategy": self.strategy.to_string(),
            "forecast_id": self.forecast_id,
            "portfolio_id": self.portfolio_id,
        })
    }
}

pub(crate) fn validate_days(days: u32) -> Result<u32, BackendError> {
    if days == 0 {
        Err(BackendError::invalid("days must be at least 1"))
    } else {
        Ok(days)
    }
}
