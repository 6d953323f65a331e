use std::time::Duration;

use corelib::FailureKind;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("timeout of {}ms exceeded", .0.as_millis())]
    Timeout(Duration),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("http error: {0}")]
    Transport(reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid response from coupon service: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Maps a reqwest failure, keeping timeouts apart from other transport errors.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }

    /// Non-2xx answer. `message` is the service's own error text when it sent one.
    pub(crate) fn server(status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// Classification used in the per-user outcome log. `None` for cancellation,
    /// which never produces an outcome.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::Timeout(_) => Some(FailureKind::Timeout),
            ApiError::Server { .. } => Some(FailureKind::Server),
            ApiError::Transport(_) | ApiError::InvalidResponse(_) => Some(FailureKind::Transport),
            ApiError::Cancelled => None,
        }
    }

    /// Text shown next to a failed user: the server's message as-is, otherwise
    /// the error description.
    pub fn outcome_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
