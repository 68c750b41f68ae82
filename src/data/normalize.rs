//! Raw backend payloads -> canonical view records.

use crate::data::BackendError;
use crate::data::wire::{
    RawCandlestick, RawErrorMetrics, RawEvaluation, RawPerformancePoint, RawPortfolioSummary,
    RawPosition,
};
use crate::domain::{
    AllocationSlice, CandlestickPoint, ErrorMetrics, ForecastEvaluation, ForecasterMetrics,
    PerformancePoint, PortfolioSummary, Position, to_display_form,
};
use crate::utils::TimeUtils;

fn candlestick(raw: RawCandlestick) -> CandlestickPoint {
    let timestamp = raw
        .date
        .as_deref()
        .and_then(TimeUtils::parse_backend_timestamp);

    let label = raw
        .time
        .filter(|t| !t.trim().is_empty())
        .or_else(|| timestamp.as_ref().map(TimeUtils::clock_label))
        .unwrap_or_default();

    CandlestickPoint {
        timestamp,
        label,
        open: raw.open.unwrap_or(0.0),
        high: raw.high.unwrap_or(0.0),
        low: raw.low.unwrap_or(0.0),
        close: raw.close.unwrap_or(0.0),
        predicted: raw.predicted.unwrap_or(0.0),
        has_actual: raw.has_actual.unwrap_or(false),
        error: None,
    }
    .with_error(raw.error)
}

/// Chronological with one entry per timestamp; a later duplicate replaces an
/// earlier one. Left in backend order if any point lacks a timestamp.
fn order_chronologically(points: &mut Vec<CandlestickPoint>) {
    if points.iter().any(|p| p.timestamp.is_none()) {
        return;
    }
    points.sort_by_key(|p| p.timestamp);
    points.reverse();
    points.dedup_by_key(|p| p.timestamp);
    points.reverse();
}

/// All three aggregates are needed; a partial set means nothing has been evaluated.
fn error_metrics(raw: Option<&RawErrorMetrics>) -> Option<ErrorMetrics> {
    let raw = raw?;
    match (raw.mae, raw.rmse, raw.mape) {
        (Some(mae), Some(rmse), Some(mape)) => Some(ErrorMetrics::new(mae, rmse, mape)),
        _ => None,
    }
}

pub fn normalize_evaluation(raw: RawEvaluation) -> ForecastEvaluation {
    let metrics = error_metrics(raw.error_metrics.as_ref());
    let raw_points = raw.candlestick_data.len();

    let mut candlesticks: Vec<CandlestickPoint> =
        raw.candlestick_data.into_iter().map(candlestick).collect();
    order_chronologically(&mut candlesticks);

    let evaluated_points = raw
        .error_metrics
        .as_ref()
        .and_then(|m| m.evaluated_points)
        .unwrap_or_else(|| candlesticks.iter().filter(|c| c.has_actual).count());
    let total_points = raw
        .error_metrics
        .as_ref()
        .and_then(|m| m.total_forecast_points)
        .unwrap_or(raw_points);

    ForecastEvaluation {
        instrument: None,
        forecast_id: raw.forecast_id,
        candlesticks,
        error_metrics: metrics,
        evaluated_points,
        total_points,
    }
}

/// The "no forecast found" failure becomes an empty record; every other failure passes through.
pub fn evaluation_or_empty(
    result: Result<RawEvaluation, BackendError>,
) -> Result<ForecastEvaluation, BackendError> {
    match result {
        Ok(raw) => Ok(normalize_evaluation(raw)),
        Err(e) if e.is_no_forecast() => {
            log::debug!("No forecast yet: {}", e.message());
            Ok(ForecastEvaluation::empty())
        }
        Err(e) => Err(e),
    }
}

/// Zeroes when nothing has been evaluated; `loading` tells the view whether that means "no data".
pub fn normalize_metrics(metrics: Option<&ErrorMetrics>) -> ForecasterMetrics {
    metrics.copied().map(ForecasterMetrics::from).unwrap_or_default()
}

/// Drops entries that cannot be valued (no quantity, no cost basis).
pub fn normalize_positions(raw: Vec<RawPosition>) -> Vec<Position> {
    raw.into_iter()
        .filter_map(|p| {
            let quantity = p.quantity.filter(|q| q.is_finite() && *q > 0.0)?;
            let average_price = p.average_price.filter(|a| a.is_finite() && *a > 0.0)?;
            let current_price = p
                .current_price
                .filter(|c| c.is_finite() && *c >= 0.0)
                .unwrap_or(average_price);
            Some(Position {
                symbol: to_display_form(&p.symbol),
                quantity,
                average_price,
                current_price,
            })
        })
        .collect()
}

/// `fallback_value` stands in for a missing `total_value`; it should never be zero.
pub fn normalize_portfolio(raw: RawPortfolioSummary, fallback_value: f64) -> PortfolioSummary {
    let allocation = raw
        .allocation
        .into_iter()
        .map(|a| AllocationSlice {
            name: to_display_form(&a.name),
            percent: a.value.unwrap_or(0.0),
        })
        .collect();

    PortfolioSummary {
        total_value: raw
            .total_value
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(fallback_value),
        total_return_percent: raw.total_return.unwrap_or(0.0),
        sharpe_ratio: raw.sharpe_ratio.unwrap_or(0.0),
        volatility: raw.volatility.unwrap_or(0.0),
        max_drawdown: raw.max_drawdown.unwrap_or(0.0),
        cash: raw.current_cash.unwrap_or(0.0),
        allocation,
        positions: normalize_positions(raw.positions),
    }
}

pub fn normalize_performance(
    raw: Vec<RawPerformancePoint>,
    fallback_value: f64,
) -> Vec<PerformancePoint> {
    raw.into_iter()
        .zip(1u32..)
        .map(|(p, day_index)| PerformancePoint {
            day_index,
            value: p.value.filter(|v| *v >= 0.0).unwrap_or(fallback_value),
            returns_percent: p.returns.unwrap_or(0.0),
            date: p.date.as_deref().and_then(TimeUtils::parse_backend_timestamp),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn raw_eval(value: serde_json::Value) -> RawEvaluation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn label_prefers_time_then_date() {
        let eval = normalize_evaluation(raw_eval(json!({
            "candlestick_data": [
                { "date": "2024-03-01T09:00:00", "time": "9am", "has_actual": true },
                { "date": "2024-03-01T10:15:00", "has_actual": true },
            ]
        })));
        assert_eq!(eval.candlesticks[0].label, "9am");
        assert_eq!(eval.candlesticks[1].label, "10:15");
    }

    #[test]
    fn stray_error_dropped_when_no_actual() {
        let eval = normalize_evaluation(raw_eval(json!({
            "candlestick_data": [
                { "date": "2024-03-01T09:00:00", "has_actual": false, "error": 12.0 },
                { "date": "2024-03-01T10:00:00", "has_actual": true, "error": -4.0 },
            ]
        })));
        assert_eq!(eval.candlesticks[0].error, None);
        assert_eq!(eval.candlesticks[1].error, Some(-4.0));
    }

    #[test]
    fn candlesticks_sorted_and_deduplicated() {
        let eval = normalize_evaluation(raw_eval(json!({
            "candlestick_data": [
                { "date": "2024-03-01T11:00:00", "close": 3.0 },
                { "date": "2024-03-01T09:00:00", "close": 1.0 },
                { "date": "2024-03-01T11:00:00", "close": 4.0 },
            ]
        })));
        let closes: Vec<f64> = eval.candlesticks.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 4.0]);
        assert_eq!(eval.total_points, 3);
    }

    #[test]
    fn metrics_need_all_three_values() {
        let eval = normalize_evaluation(raw_eval(json!({
            "error_metrics": { "mae": 10.0, "rmse": null, "mape": 5.0 }
        })));
        assert!(eval.error_metrics.is_none());

        let eval = normalize_evaluation(raw_eval(json!({
            "error_metrics": { "mae": 10.0, "rmse": 15.0, "mape": 5.0, "evaluated_points": 4, "total_forecast_points": 24 }
        })));
        let m = normalize_metrics(eval.error_metrics.as_ref());
        assert_relative_eq!(m.accuracy, 95.0);
        assert_eq!(eval.evaluated_points, 4);
        assert_eq!(eval.total_points, 24);
    }

    #[test]
    fn missing_metrics_are_zero() {
        assert_eq!(normalize_metrics(None), ForecasterMetrics::default());
    }

    #[test]
    fn no_forecast_is_empty_not_error() {
        let err = BackendError::Http {
            status: 400,
            message: "No forecast found for AAPL".into(),
        };
        assert_eq!(evaluation_or_empty(Err(err)).unwrap(), ForecastEvaluation::empty());

        let err = BackendError::Http {
            status: 500,
            message: "Error evaluating forecast: boom".into(),
        };
        assert!(evaluation_or_empty(Err(err)).is_err());
    }

    #[test]
    fn portfolio_defaults_and_display_names() {
        let raw: RawPortfolioSummary = serde_json::from_value(json!({
            "total_return": 4.2,
            "allocation": [
                { "name": "BTC-USD", "value": 55.0 },
                { "name": "Cash", "value": 45.3 }
            ],
            "positions": [
                { "symbol": "BTC-USD", "quantity": 0.5, "averagePrice": 42000.0, "currentPrice": 45000.0 },
                { "symbol": "ETH-USD", "quantity": 0.0, "averagePrice": 2200.0 },
                { "symbol": "SPY", "quantity": 3.0, "averagePrice": 0.0 }
            ]
        }))
        .unwrap();

        let summary = normalize_portfolio(raw, 100_000.0);
        assert_relative_eq!(summary.total_value, 100_000.0);
        assert_relative_eq!(summary.total_return_percent, 4.2);
        assert_eq!(summary.allocation[0].name, "BTC/USD");
        assert_eq!(summary.allocation[1].name, "Cash");
        assert_relative_eq!(summary.allocation_total(), 100.3, epsilon = 1e-9);
        assert_eq!(summary.positions.len(), 1);
        assert_eq!(summary.positions[0].symbol, "BTC/USD");
    }

    #[test]
    fn position_without_quote_uses_cost_basis() {
        let positions = normalize_positions(vec![RawPosition {
            symbol: "AAPL".into(),
            quantity: Some(10.0),
            average_price: Some(180.0),
            current_price: None,
        }]);
        assert_relative_eq!(positions[0].current_price, 180.0);
        assert_relative_eq!(positions[0].pnl(), 0.0);
    }

    #[test]
    fn performance_days_are_one_based() {
        let points = normalize_performance(
            vec![
                RawPerformancePoint { date: Some("2024-03-01".into()), value: Some(100_500.0), returns: Some(0.5) },
                RawPerformancePoint { date: None, value: None, returns: None },
            ],
            100_000.0,
        );
        assert_eq!(points[0].day_index, 1);
        assert_eq!(points[1].day_index, 2);
        assert_eq!(points[1].label(), "Day 2");
        assert_relative_eq!(points[1].value, 100_000.0);
        assert_relative_eq!(points[1].returns_percent, 0.0);
        assert!(points[0].date.is_some());
    }
}
