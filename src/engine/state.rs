use std::sync::Arc;

use strum_macros::{Display, EnumIter};

use crate::config::EngineConfig;
use crate::domain::{
    ForecastEvaluation, ForecasterMetrics, PerformancePoint, PortfolioSummary, Position,
};

/// The independently fetched slices of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Resource {
    Metrics,
    Portfolio,
    Performance,
    Trade,
    Forecast,
}

/// `Idle -> Fetching -> {Settled, Failed}`; the next trigger starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ResourceState {
    #[default]
    Idle,
    Fetching,
    Settled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceStates {
    metrics: ResourceState,
    portfolio: ResourceState,
    performance: ResourceState,
    trade: ResourceState,
    forecast: ResourceState,
}

impl ResourceStates {
    pub fn get(&self, resource: Resource) -> ResourceState {
        *self.slot(resource)
    }

    pub(crate) fn set(&mut self, resource: Resource, state: ResourceState) {
        *self.slot_mut(resource) = state;
    }

    pub fn any_fetching(&self) -> bool {
        [
            self.metrics,
            self.portfolio,
            self.performance,
            self.trade,
            self.forecast,
        ]
        .contains(&ResourceState::Fetching)
    }

    fn slot(&self, resource: Resource) -> &ResourceState {
        match resource {
            Resource::Metrics => &self.metrics,
            Resource::Portfolio => &self.portfolio,
            Resource::Performance => &self.performance,
            Resource::Trade => &self.trade,
            Resource::Forecast => &self.forecast,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut ResourceState {
        match resource {
            Resource::Metrics => &mut self.metrics,
            Resource::Portfolio => &mut self.portfolio,
            Resource::Performance => &mut self.performance,
            Resource::Trade => &mut self.trade,
            Resource::Forecast => &mut self.forecast,
        }
    }
}

/// Everything a view may read. Owned by the engine; views get clones.
///
/// Canonical records sit behind `Arc` and are swapped, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub active_instrument: String,
    pub metrics: ForecasterMetrics,
    pub evaluation: Arc<ForecastEvaluation>,
    pub portfolio_positions: Vec<Position>,
    pub portfolio_value: f64,
    pub portfolio_summary: Option<Arc<PortfolioSummary>>,
    pub performance: Arc<Vec<PerformancePoint>>,
    pub model_versions: Vec<String>,
    /// True while any tracked resource is `Fetching`.
    pub loading: bool,
    /// Last user-facing failure. Cleared by the next successful fetch.
    pub error: Option<String>,
    /// Last confirmation from a command endpoint (e.g. "Bought 10 AAPL at $182.10").
    pub notice: Option<String>,
    pub resources: ResourceStates,
}

impl AppState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            active_instrument: config.initial_instrument.clone(),
            metrics: ForecasterMetrics::default(),
            evaluation: Arc::new(ForecastEvaluation::empty()),
            portfolio_positions: Vec::new(),
            portfolio_value: 0.0,
            portfolio_summary: None,
            performance: Arc::new(Vec::new()),
            model_versions: config.model_versions.clone(),
            loading: false,
            error: None,
            notice: None,
            resources: ResourceStates::default(),
        }
    }

    /// Nothing evaluated yet and nothing on the way: the view should say "no data", not spin.
    pub fn metrics_unavailable(&self) -> bool {
        self.evaluation.error_metrics.is_none()
            && self.resources.get(Resource::Metrics) != ResourceState::Fetching
    }
}
