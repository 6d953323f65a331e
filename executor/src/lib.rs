pub mod aggregator;
pub mod bench;
pub mod errors;
pub mod orchestrator;

pub use aggregator::{BatchReport, FailureBreakdown, summarize};
pub use bench::{COUNT_RANGE, CouponBench, clamp_count};
pub use errors::RunError;
pub use orchestrator::Orchestrator;
