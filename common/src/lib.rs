//! Shared plumbing for the coupon-bench workspace: logger bootstrap,
//! trace ids and span helpers.

pub mod logger;
