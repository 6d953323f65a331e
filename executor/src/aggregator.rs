//! Pure reductions over settled claim outcomes.

use std::time::Duration;

use corelib::{BatchSummary, ClaimOutcome, FailureKind};
use serde::Serialize;

/// Folds the settled outcomes of one batch into a summary.
///
/// `outcomes` must already be in snapshot order. Anything that is not a
/// success counts as failed, so the counters always add up.
pub fn summarize(outcomes: Vec<ClaimOutcome>, duration: Duration) -> BatchSummary {
    let successful = outcomes.iter().filter(|o| o.is_success()).count();

    BatchSummary {
        total_requests: outcomes.len(),
        successful_requests: successful,
        failed_requests: outcomes.len() - successful,
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        outcomes,
    }
}

/// Failed claims split by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureBreakdown {
    pub timeout: usize,
    pub server: usize,
    pub transport: usize,
}

impl FailureBreakdown {
    pub fn from_outcomes(outcomes: &[ClaimOutcome]) -> Self {
        let mut b = Self::default();
        for o in outcomes.iter().filter(|o| o.is_failed()) {
            match o.failure_kind {
                Some(FailureKind::Timeout) => b.timeout += 1,
                Some(FailureKind::Server) => b.server += 1,
                Some(FailureKind::Transport) | None => b.transport += 1,
            }
        }
        b
    }

    pub fn total(&self) -> usize {
        self.timeout + self.server + self.transport
    }
}

/// What the report screen shows for a finished batch.
///
/// `limit_respected` is advisory: the harness only observes whether the
/// service handed out more coupons than the configured quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub duration_ms: u64,
    pub success_ratio: f64,
    pub coupon_limit: u32,
    pub limit_respected: bool,
    /// Grants beyond `coupon_limit`; zero when the limit held.
    pub over_issued: usize,
    pub failures: FailureBreakdown,
}

impl BatchReport {
    pub fn new(summary: &BatchSummary, coupon_limit: u32) -> Self {
        let limit = coupon_limit as usize;

        Self {
            total_requests: summary.total_requests,
            successful_requests: summary.successful_requests,
            failed_requests: summary.failed_requests,
            duration_ms: summary.duration_ms,
            success_ratio: summary.success_ratio(),
            coupon_limit,
            limit_respected: summary.successful_requests <= limit,
            over_issued: summary.successful_requests.saturating_sub(limit),
            failures: FailureBreakdown::from_outcomes(&summary.outcomes),
        }
    }

    /// Success ratio as a percentage, e.g. `66.7`.
    pub fn success_percent(&self) -> f64 {
        self.success_ratio * 100.0
    }
}
