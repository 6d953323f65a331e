//! Client side of the coupon service.
//!
//! The [`CouponApi`] trait is what the executor talks to; [`HttpCouponClient`]
//! is the reqwest implementation. Tests swap in scripted fakes.

pub mod cancel;
pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;
use corelib::{CouponSpec, User};

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use client::{ClientConfig, HttpCouponClient};
pub use errors::ApiError;

/// The three coupon-service calls the harness drives, plus a reachability check.
#[async_trait]
pub trait CouponApi: Send + Sync {
    /// Plain GET on the base URL.
    async fn ping(&self) -> Result<(), ApiError>;

    /// Asks the service to mint `count` random users. Returned users are `ready`.
    async fn generate_users(&self, count: usize) -> Result<Vec<User>, ApiError>;

    async fn create_coupon(&self, spec: &CouponSpec) -> Result<(), ApiError>;

    /// Claims one coupon unit for `user_id`.
    ///
    /// Settles with `ApiError::Timeout` when the service stays silent past the
    /// claim timeout, and with `ApiError::Cancelled` as soon as `cancel` fires.
    async fn claim_coupon(
        &self,
        user_id: &str,
        coupon_id: &str,
        cancel: &CancelSignal,
    ) -> Result<serde_json::Value, ApiError>;
}
