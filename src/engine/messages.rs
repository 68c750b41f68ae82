use crate::data::{
    Ack, BackendError, ForecastJob, RawEvaluation, RawPerformancePoint, RawPortfolioSummary,
    StrategyRequest, TradeOrder,
};

/// One unit of backend work, tagged with whatever the engine needs to judge
/// the reply's relevance when it comes back.
#[derive(Debug, Clone)]
pub(crate) enum FetchJob {
    Evaluation {
        generation: u64,
        instrument: String,
    },
    Portfolio {
        portfolio_id: String,
    },
    Performance {
        portfolio_id: String,
        days: u32,
    },
    Order(TradeOrder),
    Strategy(StrategyRequest),
    StartForecast {
        instrument: String,
        job: ForecastJob,
    },
    /// Re-evaluate the stored forecast against the latest actual prices.
    UpdateEvaluation {
        instrument: String,
        forecast_id: Option<String>,
    },
}

impl FetchJob {
    /// The result this job reports when it never produced one of its own.
    pub fn failed(self, error: BackendError) -> FetchResult {
        match self {
            Self::Evaluation {
                generation,
                instrument,
            } => FetchResult::Evaluation {
                generation,
                instrument,
                result: Err(error),
            },
            Self::Portfolio { .. } => FetchResult::Portfolio(Err(error)),
            Self::Performance { .. } => FetchResult::Performance(Err(error)),
            Self::Order(order) => FetchResult::Trade {
                label: format!("{} {}", order.side(), order.ticker()),
                result: Err(error),
            },
            Self::Strategy(request) => FetchResult::Trade {
                label: format!("{} strategy on {}", request.strategy(), request.ticker()),
                result: Err(error),
            },
            Self::StartForecast { instrument, .. } | Self::UpdateEvaluation { instrument, .. } => {
                FetchResult::Forecast {
                    instrument,
                    result: Err(error),
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum FetchResult {
    Evaluation {
        generation: u64,
        instrument: String,
        result: Result<RawEvaluation, BackendError>,
    },
    Portfolio(Result<RawPortfolioSummary, BackendError>),
    Performance(Result<Vec<RawPerformancePoint>, BackendError>),
    Trade {
        label: String,
        result: Result<Ack, BackendError>,
    },
    Forecast {
        instrument: String,
        result: Result<Ack, BackendError>,
    },
}

/// The result returned by the worker
#[derive(Debug, Clone)]
pub(crate) struct JobResult {
    pub duration_ms: u128,
    pub outcome: FetchResult,
}
