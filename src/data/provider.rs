use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::BACKEND;
use crate::data::client::BackendClient;
use crate::data::requests::{
    ForecastJob, ForecastQuery, StrategyRequest, TradeOrder, TradeSide, validate_days,
    validate_ticker,
};
use crate::data::wire::{
    Ack, Envelope, RawEvaluation, RawPerformancePoint, RawPortfolioSummary, RawPosition,
};
use crate::data::BackendError;
use crate::domain::to_wire_form;

/// Abstract interface to the forecasting/trading backend.
///
/// Returns raw payloads; turning them into view records is the normalizers' job.
#[async_trait]
pub trait ForecastBackend: Send + Sync {
    async fn start_forecast(&self, job: &ForecastJob) -> Result<Ack, BackendError>;

    async fn get_forecast_with_errors(
        &self,
        query: &ForecastQuery,
    ) -> Result<RawEvaluation, BackendError>;

    /// Re-evaluates against the latest actual prices. The reply has the same shape as an evaluation.
    async fn update_evaluation(
        &self,
        ticker: &str,
        forecast_id: Option<&str>,
    ) -> Result<RawEvaluation, BackendError>;

    async fn get_portfolio_summary(
        &self,
        portfolio_id: &str,
    ) -> Result<RawPortfolioSummary, BackendError>;

    async fn get_positions(&self, portfolio_id: &str) -> Result<Vec<RawPosition>, BackendError>;

    async fn buy_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError>;

    async fn sell_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError>;

    async fn get_performance(
        &self,
        portfolio_id: &str,
        days: u32,
    ) -> Result<Vec<RawPerformancePoint>, BackendError>;

    async fn execute_strategy(&self, request: &StrategyRequest) -> Result<Ack, BackendError>;

    /// Routes an order to `buy_asset` or `sell_asset` by its side.
    async fn place_order(&self, order: &TradeOrder) -> Result<Ack, BackendError> {
        match order.side() {
            TradeSide::Buy => self.buy_asset(order).await,
            TradeSide::Sell => self.sell_asset(order).await,
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    Ok(serde_json::from_value(value)?)
}

/// Unwraps `{ success, data }`. A missing `data` decodes as `T::default()`.
fn decode_data<T: DeserializeOwned + Default>(value: Value) -> Result<T, BackendError> {
    let envelope: Envelope<T> = serde_json::from_value(value)?;
    Ok(envelope.data.unwrap_or_default())
}

#[async_trait]
impl ForecastBackend for BackendClient {
    async fn start_forecast(&self, job: &ForecastJob) -> Result<Ack, BackendError> {
        let value = self
            .post(BACKEND.endpoints.forecast_start, &job.to_body())
            .await?;
        decode(value)
    }

    async fn get_forecast_with_errors(
        &self,
        query: &ForecastQuery,
    ) -> Result<RawEvaluation, BackendError> {
        let (key, val) = query.to_query();
        let value = self
            .get(BACKEND.endpoints.forecast_evaluate, &[(key, val)])
            .await?;
        decode(value)
    }

    async fn update_evaluation(
        &self,
        ticker: &str,
        forecast_id: Option<&str>,
    ) -> Result<RawEvaluation, BackendError> {
        let ticker = validate_ticker(ticker)?;
        let body = json!({
            "ticker": to_wire_form(&ticker),
            "forecast_id": forecast_id,
        });
        let value = self
            .post(BACKEND.endpoints.forecast_update_evaluation, &body)
            .await?;
        decode(value)
    }

    async fn get_portfolio_summary(
        &self,
        portfolio_id: &str,
    ) -> Result<RawPortfolioSummary, BackendError> {
        let value = self
            .get(
                BACKEND.endpoints.portfolio_summary,
                &[("portfolio_id", portfolio_id.to_string())],
            )
            .await?;
        decode_data(value)
    }

    async fn get_positions(&self, portfolio_id: &str) -> Result<Vec<RawPosition>, BackendError> {
        let value = self
            .get(
                BACKEND.endpoints.portfolio_positions,
                &[("portfolio_id", portfolio_id.to_string())],
            )
            .await?;
        decode_data(value)
    }

    async fn buy_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError> {
        let value = self
            .post(BACKEND.endpoints.portfolio_buy, &order.to_body())
            .await?;
        decode(value)
    }

    async fn sell_asset(&self, order: &TradeOrder) -> Result<Ack, BackendError> {
        let value = self
            .post(BACKEND.endpoints.portfolio_sell, &order.to_body())
            .await?;
        decode(value)
    }

    async fn get_performance(
        &self,
        portfolio_id: &str,
        days: u32,
    ) -> Result<Vec<RawPerformancePoint>, BackendError> {
        let days = validate_days(days)?;
        let value = self
            .get(
                BACKEND.endpoints.portfolio_performance,
                &[
                    ("portfolio_id", portfolio_id.to_string()),
                    ("days", days.to_string()),
                ],
            )
            .await?;
        decode_data(value)
    }

    async fn execute_strategy(&self, request: &StrategyRequest) -> Result<Ack, BackendError> {
        let value = self
            .post(BACKEND.endpoints.portfolio_execute_strategy, &request.to_body())
            .await?;
        decode(value)
    }
}
