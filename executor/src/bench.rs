use std::ops::RangeInclusive;
use std::sync::Arc;

use adapters::coupon::{ApiError, CouponApi};
use chrono::Utc;
use corelib::{BatchSummary, CouponSpec};
use parking_lot::Mutex;
use registry::UserRegistry;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{info, instrument, warn};

use crate::errors::RunError;
use crate::orchestrator::Orchestrator;

/// Accepted range for user counts and coupon quantities.
pub const COUNT_RANGE: RangeInclusive<usize> = 1..=10_000;

/// Pulls `n` into [`COUNT_RANGE`].
pub fn clamp_count(n: usize) -> usize {
    n.clamp(*COUNT_RANGE.start(), *COUNT_RANGE.end())
}

/// One load-testing session: the coupon service, the generated users and the
/// result of the last completed batch.
pub struct CouponBench {
    api: Arc<dyn CouponApi>,
    registry: Arc<UserRegistry>,
    orchestrator: Orchestrator,
    last_summary: Mutex<Option<BatchSummary>>,
    /// Held for the whole of every command that touches the registry, so a
    /// generation cannot land in the middle of a run and vice versa.
    busy: AsyncMutex<()>,
}

impl CouponBench {
    pub fn new(api: Arc<dyn CouponApi>) -> Self {
        Self::with_registry(api, Arc::new(UserRegistry::new()))
    }

    pub fn with_registry(api: Arc<dyn CouponApi>, registry: Arc<UserRegistry>) -> Self {
        let orchestrator = Orchestrator::new(Arc::clone(&api), Arc::clone(&registry));
        Self {
            api,
            registry,
            orchestrator,
            last_summary: Mutex::new(None),
            busy: AsyncMutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }

    pub async fn ping(&self) -> Result<(), RunError> {
        Ok(self.api.ping().await?)
    }

    /// Replaces the registry with `count` fresh users (clamped into
    /// [`COUNT_RANGE`]) and forgets the previous summary. Returns how many
    /// users the service actually produced.
    #[instrument(skip(self))]
    pub async fn generate_users(&self, count: usize) -> Result<usize, RunError> {
        let _busy = self.claim_registry()?;

        let wanted = clamp_count(count);
        if wanted != count {
            warn!(requested = count, clamped = wanted, "user count out of range");
        }

        let users = self.api.generate_users(wanted).await?;
        if users.is_empty() {
            return Err(ApiError::InvalidResponse("service returned no users".into()).into());
        }

        let stored = self.registry.replace_all(users)?;
        *self.last_summary.lock() = None;

        info!(stored, "users generated");
        Ok(stored)
    }

    /// Drops every user and the previous summary. Fine on an empty registry.
    pub fn clear_users(&self) -> Result<usize, RunError> {
        let _busy = self.claim_registry()?;

        let removed = self.registry.clear();
        *self.last_summary.lock() = None;
        Ok(removed)
    }

    /// Creates `coupon_id` with `quantity` units, valid for the default window
    /// starting now.
    #[instrument(skip(self))]
    pub async fn create_coupon(&self, coupon_id: &str, quantity: u32) -> Result<CouponSpec, RunError> {
        if coupon_id.trim().is_empty() {
            return Err(RunError::PreconditionFailed("coupon id must not be blank".into()));
        }

        let clamped = clamp_count(quantity as usize) as u32;
        if clamped != quantity {
            warn!(requested = quantity, clamped, "coupon quantity out of range");
        }

        let spec = CouponSpec::starting_at(coupon_id, clamped, Utc::now());
        self.api.create_coupon(&spec).await?;

        info!(quantity = clamped, end = %spec.end_date, "coupon created");
        Ok(spec)
    }

    /// Runs a batch over the current users. The summary is also kept as
    /// [`CouponBench::last_summary`].
    ///
    /// Rejected with `AlreadyRunning` while another run or a user generation
    /// is in flight; the previous summary is left alone in that case.
    pub async fn start_test(&self, coupon_id: &str) -> Result<BatchSummary, RunError> {
        let _busy = self.claim_registry()?;
        *self.last_summary.lock() = None;

        let summary = self.orchestrator.run(coupon_id).await?;
        *self.last_summary.lock() = Some(summary.clone());
        Ok(summary)
    }

    pub fn cancel_test(&self) -> bool {
        self.orchestrator.cancel()
    }

    pub fn last_summary(&self) -> Option<BatchSummary> {
        self.last_summary.lock().clone()
    }

    fn claim_registry(&self) -> Result<MutexGuard<'_, ()>, RunError> {
        self.busy.try_lock().map_err(|_| RunError::AlreadyRunning)
    }
}
