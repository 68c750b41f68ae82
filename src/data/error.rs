use crate::config::DASHBOARD;

/// Everything the backend client can fail with.
///
/// `Network`, `Http` and `Logical` come back from the wire. `InvalidInput` is
/// raised before anything is dispatched, `Decode` when a 2xx body does not have
/// the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Logical(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// The backend-supplied (or locally generated) message without decoration.
    pub fn message(&self) -> &str {
        match self {
            Self::Network(m)
            | Self::Logical(m)
            | Self::InvalidInput(m)
            | Self::Decode(m) => m,
            Self::Http { message, .. } => message,
        }
    }

    /// Transport failures are the only kind worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The backend has nothing computed for this instrument yet.
    pub fn is_no_forecast(&self) -> bool {
        match self {
            Self::Http { message, .. } | Self::Logical(message) => {
                message.contains(DASHBOARD.no_forecast_marker)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
