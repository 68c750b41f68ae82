#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use forecast_scope::data::wire::{RawCandlestick, RawErrorMetrics};
use forecast_scope::data::{
    Ack, BackendError, ForecastBackend, ForecastJob, ForecastQuery, RawEvaluation,
    RawPerformancePoint, RawPortfolioSummary, RawPosition, StrategyRequest, TradeOrder,
};
use forecast_scope::{DashboardEngine, EngineConfig};

/// Every backend call the mock has seen, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartForecast(String),
    Evaluate(String),
    UpdateEvaluation(String, Option<String>),
    Summary(String),
    Positions(String),
    Buy(String, f64),
    Sell(String, f64),
    Performance(String, u32),
    Strategy(String, Option<String>),
}

/// Scripted backend. Evaluations are keyed by display-form ticker; a ticker
/// with no entry answers with the backend's "No forecast found" failure.
pub struct MockBackend {
    pub evaluations: HashMap<String, Result<RawEvaluation, BackendError>>,
    pub evaluation_delays: HashMap<String, Duration>,
    /// Served front to back; the last entry repeats.
    pub summaries: Mutex<VecDeque<Result<RawPortfolioSummary, BackendError>>>,
    pub summary_delay: Duration,
    pub performance: Result<Vec<RawPerformancePoint>, BackendError>,
    pub trade_reply: Result<Ack, BackendError>,
    pub forecast_reply: Result<Ack, BackendError>,
    pub update_reply: Result<RawEvaluation, BackendError>,
    /// Summary requests panic instead of answering.
    pub summary_panics: bool,
    /// Network failures to hand out before any evaluation succeeds.
    pub transient_failures: Mutex<u32>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            evaluations: HashMap::new(),
            evaluation_delays: HashMap::new(),
            summaries: Mutex::new(VecDeque::from([Ok(summary(100_000.0))])),
            summary_delay: Duration::ZERO,
            performance: Ok(Vec::new()),
            trade_reply: Ok(ack("ok")),
            forecast_reply: Ok(ack("Forecast started")),
            update_reply: Ok(RawEvaluation::default()),
            summary_panics: false,
            transient_failures: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_evaluation(mut self, ticker: &str, evaluation: RawEvaluation) -> Self {
        self.evaluations.insert(ticker.to_string(), Ok(evaluation));
        self
    }

    pub fn with_evaluation_error(mut self, ticker: &str, error: BackendError) -> Self {
        self.evaluations.insert(ticker.to_string(), Err(error));
        self
    }

    pub fn with_evaluation_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.evaluation_delays.insert(ticker.to_string(), delay);
        self
    }

    pub fn with_summaries(
        self,
        replies: impl IntoIterator<Item = Result<RawPortfolioSummary, BackendError>>,
    ) -> Self {
        *self.summaries.lock().unwrap() = replies.into_iter().collect();
        self
    }

    pub fn with_summary_delay(mut self, delay: Duration) -> Self {
        self.summary_delay = delay;
        self
    }

    pub fn with_performance(mut self, points: Vec<RawPerformancePoint>) -> Self {
        self.performance = Ok(points);
        self
    }

    pub fn with_trade_reply(mut self, reply: Result<Ack, BackendError>) -> Self {
        self.trade_reply = reply;
        self
    }

    pub fn with_forecast_reply(mut self, reply: Result<Ack, BackendError>) -> Self {
        self.forecast_reply = reply;
        self
    }

    pub fn with_update_reply(mut self, reply: Result<RawEvaluation, BackendError>) -> Self {
        self.update_reply = reply;
        self
    }

    pub fn with_panicking_summary(mut self) -> Self {
        self.summary_panics = true;
        self
    }

    pub fn with_transient_failures(self, n: u32) -> Self {
        *self.transient_failures.lock().unwrap() = n;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn evaluate_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Evaluate(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn summary_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Summary(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_summary(&self) -> Result<RawPortfolioSummary, BackendError> {
        let mut replies = self.summaries.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or_else(|| Ok(RawPortfolioSummary::default()))
        }
    }
}

#[async_trait]
impl ForecastBackend for MockBackend {
    async fn start_forecast(&self, job: &ForecastJob) -> Result<Ack, BackendError> {
        self.record(Call::StartForecast(job.ticker().to_string()));
        self.forecast_reply.clone()
    }

    async fn get_forecast_with_errors(
        &self,
        query: &ForecastQuery,
    ) -> Result<RawEvaluation, BackendError> {
        let ticker = match query {
            ForecastQuery::Ticker(t) => t.clone(),
            ForecastQuery::ForecastId(id) => id.clone(),
        };
        self.record(Call::Evaluate(ticker.clone()));

        if let Some(delay) = self.evaluation_delays.get(&ticker) {
            tokio::time::sleep(*delay).await;
        }

        {
            let mut failures = self.transient_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(BackendError::Network("connection reset".into()));
            }
        }

        self.evaluations.get(&ticker).cloned().unwrap_or_else(|| {
            Err(BackendError::Http {
                status: 400,
                message: format!("No forecast found for {}", ticker),
            })
        })
    }

    async fn update_evaluation(
        &self,
        ticker: &str,
        forecast_id: Option<&str>,
    ) -> Result<RawEvaluation, BackendError> {
        self.record(Call::UpdateEvaluation(
            ticker.to_string(),
            forecast_id.map(str::to_string),
        ));
        self.update_reply.clone()
    }

    async fn get_portfolio_summary(
        &self,
        portfolio_id: &str,
    ) -> Result<RawPortfolioSummary, BackendError> {
        self.record(Call::Summary(portfolio_id.to_string()));
        if !self.summary_delay.is_zero() {
            tokio::time::sleep(self.summary_delay).await;
        }
        if self.summary_panics {
            panic!("summary handler blew up");
        }
        self.next_summary()
    }

    async fn get_positions(&self, portfolio_id: &str) -> Result<Vec<RawPosition>, BackendError> {
        self.record(Call::Positions(portfolio_id.to_string()));
        Ok(Vec::new())
    }

    async fn buy_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError> {
        self.record(Call::Buy(order.ticker().to_string(), order.quantity()));
        self.trade_reply.clone()
    }

    async fn sell_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError> {
        self.record(Call::Sell(order.ticker().to_string(), order.quantity()));
        self.trade_reply.clone()
    }

    async fn get_performance(
        &self,
        portfolio_id: &str,
        days: u32,
    ) -> Result<Vec<RawPerformancePoint>, BackendError> {
        self.record(Call::Performance(portfolio_id.to_string(), days));
        self.performance.clone()
    }

    async fn execute_strategy(&self, request: &StrategyRequest) -> Result<Ack, BackendError> {
        self.record(Call::Strategy(
            request.ticker().to_string(),
            request.forecast_id().map(str::to_string),
        ));
        self.trade_reply.clone()
    }
}

pub fn engine_with(mock: MockBackend) -> (Arc<MockBackend>, DashboardEngine) {
    engine_with_config(mock, test_config())
}

pub fn engine_with_config(
    mock: MockBackend,
    config: EngineConfig,
) -> (Arc<MockBackend>, DashboardEngine) {
    let mock = Arc::new(mock);
    let backend: Arc<dyn ForecastBackend> = mock.clone();
    (mock, DashboardEngine::new(backend, config))
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        retry_backoff: Duration::from_millis(10),
        ..EngineConfig::default()
    }
}

pub fn ack(message: &str) -> Ack {
    Ack {
        message: Some(message.to_string()),
        transaction_id: None,
    }
}

pub fn evaluation(forecast_id: &str, mae: f64, rmse: f64, mape: f64) -> RawEvaluation {
    RawEvaluation {
        forecast_id: Some(forecast_id.to_string()),
        candlestick_data: vec![
            RawCandlestick {
                date: Some("2024-03-01T09:00:00".into()),
                close: Some(100.0),
                predicted: Some(101.0),
                has_actual: Some(true),
                error: Some(1.0),
                ..Default::default()
            },
            RawCandlestick {
                date: Some("2024-03-01T10:00:00".into()),
                predicted: Some(102.0),
                has_actual: Some(false),
                ..Default::default()
            },
        ],
        error_metrics: Some(RawErrorMetrics {
            mae: Some(mae),
            rmse: Some(rmse),
            mape: Some(mape),
            evaluated_points: Some(1),
            total_forecast_points: Some(2),
        }),
        ..Default::default()
    }
}

pub fn summary(total_value: f64) -> RawPortfolioSummary {
    RawPortfolioSummary {
        portfolio_id: Some("default".into()),
        total_value: Some(total_value),
        total_return: Some(2.5),
        sharpe_ratio: Some(1.1),
        current_cash: Some(5_000.0),
        ..Default::default()
    }
}
