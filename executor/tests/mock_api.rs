#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adapters::coupon::{ApiError, CancelSignal, CouponApi};
use async_trait::async_trait;
use corelib::{CouponSpec, User, UserId, UserStatus};
use registry::UserRegistry;
use serde_json::json;

/// Scripted coupon service. Grants the first `grants` claims to arrive and
/// rejects the rest as sold out.
#[derive(Default)]
pub struct MockCouponApi {
    grants: usize,
    default_delay: Duration,
    generation_delay: Duration,
    delays: HashMap<UserId, Duration>,
    timeouts: HashSet<UserId>,
    panic_for: Option<UserId>,
    empty_generation: bool,
    observed: Option<Arc<UserRegistry>>,

    granted: AtomicUsize,
    pub claim_calls: AtomicUsize,
    pub ping_calls: AtomicUsize,
    pub generate_requests: Mutex<Vec<usize>>,
    pub created: Mutex<Vec<CouponSpec>>,
    /// Registry status of each user at the moment its claim reached the service.
    pub status_at_call: Mutex<Vec<(UserId, Option<UserStatus>)>>,
}

impl MockCouponApi {
    pub fn granting(grants: usize) -> Self {
        Self {
            grants,
            ..Default::default()
        }
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = delay;
        self
    }

    pub fn with_delay(mut self, user_id: &str, delay: Duration) -> Self {
        self.delays.insert(user_id.to_string(), delay);
        self
    }

    pub fn timing_out(mut self, user_id: &str) -> Self {
        self.timeouts.insert(user_id.to_string());
        self
    }

    pub fn panicking_for(mut self, user_id: &str) -> Self {
        self.panic_for = Some(user_id.to_string());
        self
    }

    pub fn generating_nothing(mut self) -> Self {
        self.empty_generation = true;
        self
    }

    pub fn observing(mut self, registry: Arc<UserRegistry>) -> Self {
        self.observed = Some(registry);
        self
    }

    pub fn claims(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CouponApi for MockCouponApi {
    async fn ping(&self) -> Result<(), ApiError> {
        self.ping_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn generate_users(&self, count: usize) -> Result<Vec<User>, ApiError> {
        self.generate_requests.lock().unwrap().push(count);
        tokio::time::sleep(self.generation_delay).await;
        if self.empty_generation {
            return Ok(Vec::new());
        }
        Ok((0..count)
            .map(|i| User::new(format!("u-{i}"), format!("User {i}")))
            .collect())
    }

    async fn create_coupon(&self, spec: &CouponSpec) -> Result<(), ApiError> {
        self.created.lock().unwrap().push(spec.clone());
        Ok(())
    }

    async fn claim_coupon(
        &self,
        user_id: &str,
        coupon_id: &str,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, ApiError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reg) = &self.observed {
            self.status_at_call
                .lock()
                .unwrap()
                .push((user_id.to_string(), reg.status_of(user_id)));
        }

        if self.panic_for.as_deref() == Some(user_id) {
            panic!("scripted failure for {user_id}");
        }

        let delay = self.delays.get(user_id).copied().unwrap_or(self.default_delay);
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        if self.timeouts.contains(user_id) {
            return Err(ApiError::Timeout(Duration::from_millis(10_000)));
        }

        if self.granted.fetch_add(1, Ordering::SeqCst) < self.grants {
            Ok(json!({ "userId": user_id, "couponId": coupon_id }))
        } else {
            Err(ApiError::Server {
                status: 400,
                message: "coupon sold out".into(),
            })
        }
    }
}

pub fn users(ids: &[&str]) -> Vec<User> {
    ids.iter()
        .map(|id| User::new(*id, format!("user {id}")))
        .collect()
}
