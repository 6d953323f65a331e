use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use tracing::{Span, field};

use super::TraceId;

/// Root span for a batch / command. `coupon_id` is filled in later via
/// `Span::record` once known.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        coupon_id = field::Empty
    )
}

/// Child span (inherits trace_id from the enclosing root span).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, user_id = field::Empty)
}

/// Awaits `fut` and logs a warning on the `performance` target when it took
/// longer than `max`. Measured on the tokio clock, so a paused test clock counts.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
