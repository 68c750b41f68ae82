use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc::UnboundedSender;

use super::messages::{FetchJob, FetchResult, JobResult};

use crate::config::{DF, EngineConfig};
use crate::data::{Ack, BackendError, ForecastBackend, ForecastQuery};
use crate::utils::AppInstant;

/// Reads are retried on transport failures only. Commands are never retried:
/// a buy that timed out may still have been booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: config.retry_backoff,
        }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

/// Runs one job on the current runtime and posts the result back to the engine.
/// Every spawned job reports exactly once, even if the backend call panics.
pub(crate) fn spawn_job(
    backend: Arc<dyn ForecastBackend>,
    job: FetchJob,
    retry: RetryPolicy,
    tx: UnboundedSender<JobResult>,
) {
    tokio::spawn(async move {
        let start = AppInstant::now();
        let fallback = job.clone();
        let result = match AssertUnwindSafe(run_job(backend.as_ref(), job, retry))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                log::error!("Backend task panicked: {}", reason);
                JobResult {
                    duration_ms: start.elapsed().as_millis(),
                    outcome: fallback.failed(BackendError::Network(format!(
                        "backend task panicked: {}",
                        reason
                    ))),
                }
            }
        };
        // Receiver only goes away with the engine.
        let _ = tx.send(result);
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

pub(crate) async fn run_job(
    backend: &dyn ForecastBackend,
    job: FetchJob,
    retry: RetryPolicy,
) -> JobResult {
    let start = AppInstant::now();

    let outcome = match job {
        FetchJob::Evaluation {
            generation,
            instrument,
        } => {
            let result = match ForecastQuery::ticker(&instrument) {
                Ok(query) => {
                    with_retry(retry, "evaluate", || {
                        backend.get_forecast_with_errors(&query)
                    })
                    .await
                }
                Err(e) => Err(e),
            };
            FetchResult::Evaluation {
                generation,
                instrument,
                result,
            }
        }
        FetchJob::Portfolio { portfolio_id } => FetchResult::Portfolio(
            with_retry(retry, "portfolio summary", || {
                backend.get_portfolio_summary(&portfolio_id)
            })
            .await,
        ),
        FetchJob::Performance { portfolio_id, days } => FetchResult::Performance(
            with_retry(retry, "performance", || {
                backend.get_performance(&portfolio_id, days)
            })
            .await,
        ),
        FetchJob::Order(order) => FetchResult::Trade {
            label: format!("{} {}", order.side(), order.ticker()),
            result: backend.place_order(&order).await,
        },
        FetchJob::Strategy(request) => FetchResult::Trade {
            label: format!("{} strategy on {}", request.strategy(), request.ticker()),
            result: backend.execute_strategy(&request).await,
        },
        FetchJob::StartForecast { instrument, job } => FetchResult::Forecast {
            instrument,
            result: backend.start_forecast(&job).await,
        },
        FetchJob::UpdateEvaluation {
            instrument,
            forecast_id,
        } => {
            let result = backend
                .update_evaluation(&instrument, forecast_id.as_deref())
                .await
                .map(|_| Ack {
                    message: Some(format!("Evaluation updated for {}", instrument)),
                    transaction_id: None,
                });
            FetchResult::Forecast { instrument, result }
        }
    };

    JobResult {
        duration_ms: start.elapsed().as_millis(),
        outcome,
    }
}

async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Err(e) if e.is_transport() && attempt < policy.retries => {
                attempt += 1;
                if DF.log_backend_requests {
                    log::warn!(
                        "RETRY {} ({}/{}) after: {}",
                        label,
                        attempt,
                        policy.retries,
                        e
                    );
                }
                tokio::time::sleep(policy.backoff).await;
            }
            other => return other,
        }
    }
}
