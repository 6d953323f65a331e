//! Domain records shared by the adapter, registry and executor crates.

mod claim;
mod coupon;
mod summary;
mod user;

pub use claim::{ClaimOutcome, ClaimStatus, FailureKind};
pub use coupon::{CouponSpec, DEFAULT_COUPON_WINDOW_DAYS};
pub use summary::BatchSummary;
pub use user::{User, UserId, UserStatus};
