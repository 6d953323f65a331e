use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use registry::{RegistryEvent, StatusCounts, UserRegistry};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Live status line on stderr, redrawn while registry events keep coming.
pub struct Progress {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Progress {
    /// Starts redrawing at most once per `every`.
    pub fn spawn(registry: Arc<UserRegistry>, every: Duration) -> Self {
        let (stop, stop_rx) = oneshot::channel();
        let events = registry.subscribe();
        let task = tokio::spawn(redraw_loop(registry, events, every, stop_rx));
        Self { stop, task }
    }

    /// Draws the final counts and ends the line.
    pub async fn finish(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            debug!(error = %e, "progress task ended abnormally");
        }
    }
}

async fn redraw_loop(
    registry: Arc<UserRegistry>,
    mut events: broadcast::Receiver<RegistryEvent>,
    every: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut dirty = true;

    loop {
        tokio::select! {
            _ = &mut stop => break,

            ev = events.recv() => match ev {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => dirty = true,
                Err(broadcast::error::RecvError::Closed) => break,
            },

            _ = ticker.tick() => {
                if dirty {
                    draw(&registry.status_counts(), false);
                    dirty = false;
                }
            }
        }
    }

    draw(&registry.status_counts(), true);
}

fn draw(counts: &StatusCounts, last: bool) {
    let mut err = std::io::stderr().lock();
    let end = if last { "\n" } else { "" };
    let _ = write!(err, "\r{}{end}", status_line(counts));
    let _ = err.flush();
}

/// e.g. `[##########----------]  50.0%  ready 0 | testing 5 | success 4 | failed 1`
pub fn status_line(counts: &StatusCounts) -> String {
    const WIDTH: usize = 20;

    let total = counts.total();
    let settled = counts.success + counts.failed;
    let (filled, pct) = if total == 0 {
        (0, 0.0)
    } else {
        (settled * WIDTH / total, settled as f64 * 100.0 / total as f64)
    };

    format!(
        "[{}{}] {:>5.1}%  ready {} | testing {} | success {} | failed {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        pct,
        counts.ready,
        counts.testing,
        counts.success,
        counts.failed,
    )
}
