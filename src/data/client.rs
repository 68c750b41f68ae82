use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::{BackendConfig, DF};
use crate::data::BackendError;

const GENERIC_FAILURE: &str = "Request failed";

/// Thin JSON-over-HTTP client for the forecasting/trading backend.
///
/// Does not retry. A non-2xx reply becomes `Http`, a 2xx reply carrying
/// `success: false` becomes `Logical`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The single request primitive: `path` is appended to the base URL.
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        self.send(path, method, &[], body).await
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        self.send(path, Method::GET, query, None).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        self.send(path, Method::POST, &[], Some(body)).await
    }

    async fn send(
        &self,
        path: &str,
        method: Method,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let url = format!("{}{}", self.base_url, path);

        if DF.log_backend_requests {
            log::debug!("BACKEND -> {} {} {:?}", method, url, query);
        }

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            log::warn!("API Error ({}): {}", path, e);
            BackendError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if DF.log_backend_requests {
            log::debug!("BACKEND <- {} {} ({} bytes)", status, url, text.len());
        }

        if !status.is_success() {
            let message = error_message(status.as_u16(), &text);
            log::warn!("API Error ({}): {} [{}]", path, message, status);
            return Err(BackendError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&text)?;
        ensure_success(value)
    }
}

/// Prefer the body's `message`; JSON without one reports the status; anything else is generic.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(v) => v
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status)),
        Err(_) => GENERIC_FAILURE.to_string(),
    }
}

/// A 2xx body with `success: false` is a recoverable logical failure.
pub(crate) fn ensure_success(value: Value) -> Result<Value, BackendError> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        return Err(BackendError::Logical(message));
    }
    Ok(value)
}
