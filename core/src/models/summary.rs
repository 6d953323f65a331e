use serde::{Deserialize, Serialize};

use super::ClaimOutcome;

/// Aggregate of one completed batch. `outcomes[i]` belongs to the i-th user
/// of the snapshot taken when the batch started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<ClaimOutcome>,
}

impl BatchSummary {
    /// successful / total, 0.0 for an empty batch.
    pub fn success_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }

    /// Checks the counting invariant between the counters and the outcome log.
    pub fn is_consistent(&self) -> bool {
        self.successful_requests + self.failed_requests == self.total_requests
            && self.outcomes.len() == self.total_requests
    }
}
