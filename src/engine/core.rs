use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;

use crate::config::{DF, EngineConfig};
use crate::data::normalize::{
    evaluation_or_empty, normalize_metrics, normalize_performance, normalize_portfolio,
};
use crate::data::{
    Ack, BackendError, ForecastBackend, ForecastJob, Horizon, RawEvaluation,
    RawPerformancePoint, RawPortfolioSummary, Strategy, StrategyRequest, TradeOrder, TradeSide,
};
use crate::utils::AppInstant;

use super::messages::{FetchJob, FetchResult, JobResult};
use super::state::{AppState, Resource, ResourceState};
use super::worker::{self, RetryPolicy};

/// A metrics fetch waiting out the debounce window.
#[derive(Debug, Clone)]
struct ScheduledFetch {
    generation: u64,
    instrument: String,
    due: Instant,
}

/// Owns `AppState` and funnels every mutation through named entry points.
///
/// Fetches run as tasks on the current tokio runtime and report back over a
/// channel; `update()` applies whatever has arrived, `settle()` waits until
/// nothing is scheduled or in flight. Entry points that start a fetch must be
/// called from inside a tokio runtime.
pub struct DashboardEngine {
    state: AppState,
    backend: Arc<dyn ForecastBackend>,
    config: EngineConfig,
    retry: RetryPolicy,

    /// Bumped on every instrument switch and metrics refresh. Evaluation
    /// results carrying an older generation are dropped on arrival.
    metrics_generation: u64,
    scheduled: Option<ScheduledFetch>,

    /// Jobs spawned but not yet reported back.
    in_flight: usize,
    trades_in_flight: usize,
    forecasts_in_flight: usize,

    result_tx: UnboundedSender<JobResult>,
    result_rx: UnboundedReceiver<JobResult>,
}

impl DashboardEngine {
    pub fn new(backend: Arc<dyn ForecastBackend>, config: EngineConfig) -> Self {
        let (result_tx, result_rx) = unbounded_channel();
        Self {
            state: AppState::new(&config),
            retry: RetryPolicy::from_config(&config),
            backend,
            config,
            metrics_generation: 0,
            scheduled: None,
            in_flight: 0,
            trades_in_flight: 0,
            forecasts_in_flight: 0,
            result_tx,
            result_rx,
        }
    }

    /// Session start: metrics for the initial instrument plus the portfolio.
    pub fn bootstrap(&mut self) {
        self.refresh_metrics();
        self.refresh_portfolio();
    }

    // --- READ ACCESS ---

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Immutable copy for a view. Canonical records are shared, not copied.
    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    pub fn resource_state(&self, resource: Resource) -> ResourceState {
        self.state.resources.get(resource)
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Nothing scheduled, nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.scheduled.is_none() && self.in_flight == 0
    }

    // --- ENTRY POINTS ---

    /// Visible immediately; the metrics fetch follows after the debounce
    /// window. A newer selection replaces any fetch still waiting.
    pub fn set_active_instrument(&mut self, symbol: &str) {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            log::warn!("Ignoring empty instrument selection");
            return;
        }

        self.state.active_instrument = symbol.to_string();
        self.metrics_generation += 1;

        let next = ScheduledFetch {
            generation: self.metrics_generation,
            instrument: symbol.to_string(),
            due: Instant::now() + self.config.debounce,
        };
        if let Some(cancelled) = self.scheduled.replace(next) {
            if DF.log_debounce {
                log::info!(
                    "DEBOUNCE: cancelled pending fetch for {} (gen {})",
                    cancelled.instrument,
                    cancelled.generation
                );
            }
        }

        self.set_resource(Resource::Metrics, ResourceState::Idle);
    }

    /// Fetch metrics for the active instrument now, skipping the debounce.
    pub fn refresh_metrics(&mut self) {
        self.metrics_generation += 1;
        self.scheduled = None;
        let instrument = self.state.active_instrument.clone();
        self.dispatch_evaluation(self.metrics_generation, instrument);
    }

    /// Coalesced: a call while the summary is already being fetched is a no-op.
    pub fn refresh_portfolio(&mut self) {
        if self.resource_state(Resource::Portfolio) == ResourceState::Fetching {
            if DF.log_engine_core {
                log::debug!("ENGINE: portfolio refresh coalesced with in-flight fetch");
            }
            return;
        }
        self.set_resource(Resource::Portfolio, ResourceState::Fetching);
        self.dispatch(FetchJob::Portfolio {
            portfolio_id: self.config.portfolio_id.clone(),
        });
    }

    /// Coalesced like `refresh_portfolio`.
    pub fn refresh_performance(&mut self) {
        if self.resource_state(Resource::Performance) == ResourceState::Fetching {
            return;
        }
        self.set_resource(Resource::Performance, ResourceState::Fetching);
        self.dispatch(FetchJob::Performance {
            portfolio_id: self.config.portfolio_id.clone(),
            days: self.config.performance_days,
        });
    }

    pub fn buy(
        &mut self,
        ticker: &str,
        quantity: f64,
        price: Option<f64>,
    ) -> Result<(), BackendError> {
        self.trade(TradeSide::Buy, ticker, quantity, price)
    }

    pub fn sell(
        &mut self,
        ticker: &str,
        quantity: f64,
        price: Option<f64>,
    ) -> Result<(), BackendError> {
        self.trade(TradeSide::Sell, ticker, quantity, price)
    }

    /// Sends a prepared order against this session's portfolio. A successful
    /// fill triggers exactly one portfolio refresh.
    pub fn place_order(&mut self, order: TradeOrder) {
        let order = order.for_portfolio(self.config.portfolio_id.clone());
        self.begin_trade();
        self.dispatch(FetchJob::Order(order));
    }

    /// Runs `strategy` on the active instrument, tied to the forecast on screen if any.
    pub fn execute_strategy(&mut self, strategy: Strategy) -> Result<(), BackendError> {
        let forecast_id = self.active_forecast_id();
        let request = self
            .reject_invalid(StrategyRequest::new(&self.state.active_instrument, strategy))?
            .with_forecast(forecast_id)
            .for_portfolio(self.config.portfolio_id.clone());
        self.begin_trade();
        self.dispatch(FetchJob::Strategy(request));
        Ok(())
    }

    /// Starts a forecast run for the active instrument with the default model.
    pub fn start_forecast(&mut self, horizon: Horizon) -> Result<(), BackendError> {
        let job = self.reject_invalid(ForecastJob::new(&self.state.active_instrument, horizon))?;
        self.start_forecast_job(job);
        Ok(())
    }

    /// Metrics are refetched once the backend accepts the job, provided its
    /// instrument is still the active one.
    pub fn start_forecast_job(&mut self, job: ForecastJob) {
        self.begin_forecast();
        self.dispatch(FetchJob::StartForecast {
            instrument: job.ticker().to_string(),
            job,
        });
    }

    /// Re-evaluates the active instrument's forecast against fresh actuals,
    /// then refetches its metrics.
    pub fn update_evaluation(&mut self) {
        self.begin_forecast();
        self.dispatch(FetchJob::UpdateEvaluation {
            instrument: self.state.active_instrument.clone(),
            forecast_id: self.active_forecast_id(),
        });
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // --- THE LOOP ---

    /// Non-blocking: dispatch a due scheduled fetch and apply every result that has arrived.
    pub fn update(&mut self) {
        let t1 = AppInstant::now();

        self.dispatch_due(Instant::now());
        while let Ok(result) = self.result_rx.try_recv() {
            self.handle_job_result(result);
        }

        let elapsed = t1.elapsed().as_micros();
        if elapsed > 10_000 {
            log::warn!("ENGINE SLOW: update took {}us", elapsed);
        }
    }

    /// Runs until nothing is scheduled or in flight.
    pub async fn settle(&mut self) {
        loop {
            self.update();
            if self.is_idle() {
                return;
            }

            let due = self.scheduled.as_ref().map(|s| s.due);
            let next = tokio::select! {
                result = self.result_rx.recv() => result,
                _ = wait_until(due) => None,
            };
            if let Some(result) = next {
                self.handle_job_result(result);
            }
        }
    }

    // --- INTERNAL LOGIC ---

    fn trade(
        &mut self,
        side: TradeSide,
        ticker: &str,
        quantity: f64,
        price: Option<f64>,
    ) -> Result<(), BackendError> {
        let order = self.reject_invalid(TradeOrder::new(side, ticker, quantity, price))?;
        self.place_order(order);
        Ok(())
    }

    /// Invalid input never leaves the process but is still shown to the user.
    fn reject_invalid<T>(&mut self, built: Result<T, BackendError>) -> Result<T, BackendError> {
        built.inspect_err(|e| self.state.error = Some(e.to_string()))
    }

    /// The evaluation on screen may still belong to the previous instrument
    /// while a new selection waits out the debounce.
    fn active_forecast_id(&self) -> Option<String> {
        self.state
            .evaluation
            .forecast_id_for(&self.state.active_instrument)
            .map(str::to_string)
    }

    fn begin_trade(&mut self) {
        self.trades_in_flight += 1;
        self.set_resource(Resource::Trade, ResourceState::Fetching);
    }

    fn begin_forecast(&mut self) {
        self.forecasts_in_flight += 1;
        self.set_resource(Resource::Forecast, ResourceState::Fetching);
    }

    fn dispatch_due(&mut self, now: Instant) {
        let due = self.scheduled.as_ref().is_some_and(|s| s.due <= now);
        if !due {
            return;
        }
        if let Some(fetch) = self.scheduled.take() {
            if DF.log_debounce {
                log::info!(
                    "DEBOUNCE: firing metrics fetch for {} (gen {})",
                    fetch.instrument,
                    fetch.generation
                );
            }
            self.dispatch_evaluation(fetch.generation, fetch.instrument);
        }
    }

    fn dispatch_evaluation(&mut self, generation: u64, instrument: String) {
        self.set_resource(Resource::Metrics, ResourceState::Fetching);
        self.dispatch(FetchJob::Evaluation {
            generation,
            instrument,
        });
    }

    fn dispatch(&mut self, job: FetchJob) {
        if DF.log_engine_core {
            log::debug!("ENGINE: dispatch {:?}", job);
        }
        self.in_flight += 1;
        worker::spawn_job(
            Arc::clone(&self.backend),
            job,
            self.retry,
            self.result_tx.clone(),
        );
    }

    fn handle_job_result(&mut self, result: JobResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if DF.log_engine_core && result.duration_ms > 2_000 {
            log::info!("ENGINE: slow backend reply ({}ms)", result.duration_ms);
        }

        match result.outcome {
            FetchResult::Evaluation {
                generation,
                instrument,
                result,
            } => self.apply_evaluation(generation, &instrument, result),
            FetchResult::Portfolio(result) => self.apply_portfolio(result),
            FetchResult::Performance(result) => self.apply_performance(result),
            FetchResult::Trade { label, result } => self.apply_trade(&label, result),
            FetchResult::Forecast { instrument, result } => {
                self.apply_forecast(&instrument, result)
            }
        }
    }

    fn apply_evaluation(
        &mut self,
        generation: u64,
        instrument: &str,
        result: Result<RawEvaluation, BackendError>,
    ) {
        if generation != self.metrics_generation || instrument != self.state.active_instrument {
            if DF.log_debounce {
                log::info!(
                    "DEBOUNCE: discarded stale evaluation for {} (gen {}, current {})",
                    instrument,
                    generation,
                    self.metrics_generation
                );
            }
            return;
        }

        let normalized = crate::trace_time!("Normalize evaluation", 2_000, {
            evaluation_or_empty(result)
        });
        match normalized {
            Ok(evaluation) => {
                self.state.metrics = normalize_metrics(evaluation.error_metrics.as_ref());
                self.state.evaluation = Arc::new(evaluation.for_instrument(instrument));
                self.settled(Resource::Metrics);
            }
            Err(e) => self.failed(Resource::Metrics, e),
        }
    }

    fn apply_portfolio(&mut self, result: Result<RawPortfolioSummary, BackendError>) {
        match result {
            Ok(raw) => {
                let fallback = self.fallback_value();
                let summary = crate::trace_time!("Normalize portfolio", 1_000, {
                    normalize_portfolio(raw, fallback)
                });
                self.state.portfolio_value = summary.total_value;
                self.state.portfolio_positions = summary.positions.clone();
                self.state.portfolio_summary = Some(Arc::new(summary));
                self.settled(Resource::Portfolio);
            }
            Err(e) => self.failed(Resource::Portfolio, e),
        }
    }

    fn apply_performance(&mut self, result: Result<Vec<RawPerformancePoint>, BackendError>) {
        match result {
            Ok(raw) => {
                let points = normalize_performance(raw, self.fallback_value());
                self.state.performance = Arc::new(points);
                self.settled(Resource::Performance);
            }
            Err(e) => self.failed(Resource::Performance, e),
        }
    }

    fn apply_trade(&mut self, label: &str, result: Result<Ack, BackendError>) {
        self.trades_in_flight = self.trades_in_flight.saturating_sub(1);
        match result {
            Ok(ack) => {
                log::info!("Trade accepted: {}", label);
                self.state.notice = ack.message;
                self.settled(Resource::Trade);
                self.refresh_portfolio();
            }
            Err(e) => {
                log::error!("Trade failed ({}): {}", label, e);
                self.failed(Resource::Trade, e);
            }
        }
        // Another order is still out.
        if self.trades_in_flight > 0 {
            self.set_resource(Resource::Trade, ResourceState::Fetching);
        }
    }

    fn apply_forecast(&mut self, instrument: &str, result: Result<Ack, BackendError>) {
        self.forecasts_in_flight = self.forecasts_in_flight.saturating_sub(1);
        match result {
            Ok(ack) => {
                self.state.notice = ack.message;
                self.settled(Resource::Forecast);
                if instrument == self.state.active_instrument {
                    self.refresh_metrics();
                }
            }
            Err(e) => self.failed(Resource::Forecast, e),
        }
        if self.forecasts_in_flight > 0 {
            self.set_resource(Resource::Forecast, ResourceState::Fetching);
        }
    }

    /// Never zero: an unknown total shows the last known value, then the configured fallback.
    fn fallback_value(&self) -> f64 {
        if self.state.portfolio_value > 0.0 {
            self.state.portfolio_value
        } else {
            self.config.fallback_portfolio_value
        }
    }

    fn settled(&mut self, resource: Resource) {
        self.state.error = None;
        self.set_resource(resource, ResourceState::Settled);
    }

    /// Previous canonical records stay in place.
    fn failed(&mut self, resource: Resource, error: BackendError) {
        log::warn!("{} fetch failed: {}", resource, error);
        self.state.error = Some(error.to_string());
        self.set_resource(resource, ResourceState::Failed);
    }

    fn set_resource(&mut self, resource: Resource, next: ResourceState) {
        if DF.log_engine_core {
            let prev = self.state.resources.get(resource);
            if prev != next {
                log::debug!("ENGINE: {} {} -> {}", resource, prev, next);
            }
        }
        self.state.resources.set(resource, next);
        self.state.loading = self.state.resources.any_fetching();
    }
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}
