use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Lifecycle of one claim attempt. `Pending` only exists between dispatch
/// and settlement; summaries never contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Success,
    Failed,
}

/// Why a claim failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// No response within the claim timeout.
    Timeout,
    /// The service answered with a non-2xx status.
    Server,
    /// Connection, TLS or decoding failure before a usable answer arrived.
    Transport,
}

/// Record of a single claim request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub user_id: UserId,
    /// When the request was initiated.
    pub timestamp: DateTime<Utc>,
    pub status: ClaimStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl ClaimOutcome {
    pub fn pending(user_id: impl Into<UserId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            status: ClaimStatus::Pending,
            response: None,
            error: None,
            failure_kind: None,
        }
    }

    /// Finalize as granted.
    pub fn succeed(self, response: serde_json::Value) -> Self {
        Self {
            status: ClaimStatus::Success,
            response: Some(response),
            error: None,
            failure_kind: None,
            ..self
        }
    }

    /// Finalize as rejected.
    pub fn fail(self, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            status: ClaimStatus::Failed,
            response: None,
            error: Some(message.into()),
            failure_kind: Some(kind),
            ..self
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ClaimStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == ClaimStatus::Failed
    }
}
