use std::sync::Arc;
use std::time::Duration;

use adapters::coupon::{CancelHandle, CancelSignal, CouponApi, cancel_pair};
use chrono::Utc;
use common::logger::{TraceId, child_span, root_span, warn_if_slow};
use corelib::{BatchSummary, ClaimOutcome, FailureKind, UserId, UserStatus};
use futures::future::join_all;
use parking_lot::Mutex;
use registry::UserRegistry;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, field, info, warn};

use crate::aggregator::summarize;
use crate::errors::RunError;

/// Batches that take longer than this get a warning on the `performance` target.
const SLOW_BATCH: Duration = Duration::from_secs(30);

/// Fires one coupon claim per registered user, all at once, and collects the
/// settled outcomes in registry order.
///
/// At most one batch runs at a time. [`Orchestrator::cancel`] aborts it.
pub struct Orchestrator {
    api: Arc<dyn CouponApi>,
    registry: Arc<UserRegistry>,
    active: Mutex<Option<CancelHandle>>,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn CouponApi>, registry: Arc<UserRegistry>) -> Self {
        Self {
            api,
            registry,
            active: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Cancels the batch in flight. Returns `false` when there is nothing to
    /// cancel or the batch was already cancelled.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock();
        match active.as_ref() {
            Some(handle) => {
                let fired = handle.cancel();
                if fired {
                    info!("cancellation requested for running batch");
                }
                fired
            }
            None => false,
        }
    }

    /// Runs one batch against `coupon_id`.
    ///
    /// Errors (and no summary) when preconditions fail, when the batch is
    /// cancelled, or when a claim task dies. Every user is back to `ready` in
    /// the last two cases.
    pub async fn run(&self, coupon_id: &str) -> Result<BatchSummary, RunError> {
        if coupon_id.trim().is_empty() {
            return Err(RunError::precondition("coupon id must not be blank"));
        }

        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            return Err(RunError::precondition("no users to test; generate users first"));
        }

        let (handle, signal) = cancel_pair();
        {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(RunError::AlreadyRunning);
            }
            *active = Some(handle);
        }
        let _active = ActiveBatch { slot: &self.active };

        let trace_id = TraceId::new();
        let span = root_span("coupon_batch", &trace_id);
        span.record("coupon_id", field::display(coupon_id));

        let user_ids: Vec<UserId> = snapshot.into_iter().map(|u| u.id).collect();

        self.run_batch(user_ids, coupon_id, signal)
            .instrument(span)
            .await
    }

    async fn run_batch(
        &self,
        user_ids: Vec<UserId>,
        coupon_id: &str,
        signal: CancelSignal,
    ) -> Result<BatchSummary, RunError> {
        let total = user_ids.len();
        info!(total, "starting coupon claim batch");

        let coupon_id: Arc<str> = Arc::from(coupon_id);
        let started = Instant::now();

        let mut handles = Vec::with_capacity(total);
        for user_id in &user_ids {
            mark(&self.registry, user_id, UserStatus::Testing);

            let span = child_span("claim");
            span.record("user_id", field::display(user_id));

            let task = claim_one(
                Arc::clone(&self.api),
                Arc::clone(&self.registry),
                user_id.clone(),
                Arc::clone(&coupon_id),
                signal.clone(),
            );
            handles.push(tokio::spawn(task.instrument(span)));
        }

        let results = warn_if_slow("coupon_batch", SLOW_BATCH, join_all(handles)).await;
        let elapsed = started.elapsed();

        let mut outcomes = Vec::with_capacity(total);
        let mut broken = None;
        for (user_id, res) in user_ids.iter().zip(results) {
            match res {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(join_err) => {
                    error!(user_id = %user_id, error = %join_err, "claim task did not complete");
                    broken.get_or_insert_with(|| {
                        format!("claim task for user {user_id} failed: {join_err}")
                    });
                }
            }
        }

        if let Some(reason) = broken {
            self.registry.reset_all();
            return Err(RunError::Orchestration(reason));
        }

        if signal.is_cancelled() {
            let reset = self.registry.reset_all();
            warn!(
                reset,
                settled = outcomes.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "batch cancelled; users reverted to ready"
            );
            return Err(RunError::Cancelled);
        }

        let summary = summarize(outcomes, elapsed);
        info!(
            total = summary.total_requests,
            successful = summary.successful_requests,
            failed = summary.failed_requests,
            elapsed_ms = summary.duration_ms,
            "coupon claim batch finished"
        );
        Ok(summary)
    }
}

/// Settles one claim. `None` means the claim was cancelled and produces no outcome.
async fn claim_one(
    api: Arc<dyn CouponApi>,
    registry: Arc<UserRegistry>,
    user_id: UserId,
    coupon_id: Arc<str>,
    signal: CancelSignal,
) -> Option<ClaimOutcome> {
    let pending = ClaimOutcome::pending(user_id.clone(), Utc::now());

    match api.claim_coupon(&user_id, &coupon_id, &signal).await {
        Ok(payload) => {
            mark(&registry, &user_id, UserStatus::Success);
            Some(pending.succeed(payload))
        }
        Err(e) if e.is_cancelled() => {
            mark(&registry, &user_id, UserStatus::Ready);
            None
        }
        Err(e) => {
            let kind = e.failure_kind().unwrap_or(FailureKind::Transport);
            debug!(?kind, error = %e, "claim failed");
            mark(&registry, &user_id, UserStatus::Failed);
            Some(pending.fail(kind, e.outcome_message()))
        }
    }
}

/// Status update that tolerates the user having been removed mid-run.
fn mark(registry: &UserRegistry, user_id: &str, status: UserStatus) {
    if let Err(e) = registry.set_status(user_id, status) {
        warn!(user_id = %user_id, %status, error = %e, "could not update user status");
    }
}

/// Frees the single-batch slot when `run` returns or its future is dropped.
/// Claims still in flight at that point are cancelled.
struct ActiveBatch<'a> {
    slot: &'a Mutex<Option<CancelHandle>>,
}

impl Drop for ActiveBatch<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.slot.lock().take() {
            handle.cancel();
        }
    }
}
