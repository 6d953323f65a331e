use std::future::Future;
use std::io;
use std::sync::Arc;

use executor::CouponBench;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cancels the bench's running batch on every interrupt `next` yields.
///
/// Keeps listening until `next` fails or the task is aborted, so an
/// interrupt that arrives before the batch starts does not use it up.
pub fn cancel_on<S, Fut>(bench: Arc<CouponBench>, mut next: S) -> JoinHandle<()>
where
    S: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        while next().await.is_ok() {
            if bench.cancel_test() {
                warn!("interrupt received, cancelling test run");
            } else {
                debug!("interrupt received with no batch to cancel");
            }
        }
    })
}
