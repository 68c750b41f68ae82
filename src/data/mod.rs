mod client;
mod error;
pub mod normalize;
mod provider;
mod requests;
pub mod wire;

pub use {
    client::BackendClient,
    error::BackendError,
    provider::ForecastBackend,
    requests::{
        ForecastJob, ForecastQuery, Horizon, Strategy, StrategyRequest, TradeOrder, TradeSide,
    },
    wire::{Ack, RawEvaluation, RawPerformancePoint, RawPortfolioSummary, RawPosition},
};
