//! Recurring evaluation task owned by a session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

use crate::alerts::{AlertCenter, CycleReport};
use crate::source::{ProductSource, SourceError};

/// Default period between evaluation cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5 * 60);

/// How long `shutdown` waits for a running cycle before detaching it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Fetch a snapshot and fold it into the center. The lock is only taken
/// once the snapshot is in hand; on failure the center is left untouched.
#[instrument(skip_all)]
pub async fn run_cycle(
    center: &Mutex<AlertCenter>,
    source: &dyn ProductSource,
) -> Result<CycleReport, SourceError> {
    let products = source.list_products().await?;
    let report = center.lock().await.observe(&products, Utc::now());
    info!(
        products = products.len(),
        produced = report.produced,
        added = report.added,
        unread = report.unread,
        "stock check complete"
    );
    Ok(report)
}

/// Handle to the running evaluation loop. Dropping it stops the loop as
/// well, but only `shutdown` waits for it to exit.
#[derive(Debug)]
pub struct AlertScheduler {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl AlertScheduler {
    /// Run one cycle immediately, then one every `period`. A cycle that is
    /// still fetching when the next one is due is abandoned as failed.
    pub fn start(
        center: Arc<Mutex<AlertCenter>>,
        source: Arc<dyn ProductSource>,
        period: Duration,
    ) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_secs = period.as_secs(), "alert scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match time::timeout(period, run_cycle(&center, source.as_ref())).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(err)) => {
                                error!(?err, "stock check skipped: product source unavailable");
                            }
                            Err(_) => {
                                error!(
                                    timeout_secs = period.as_secs(),
                                    "stock check skipped: product source did not answer"
                                );
                            }
                        }
                        if *stopped.borrow() {
                            break;
                        }
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("alert scheduler stopped");
        });
        Self { handle, stop }
    }

    /// Stop scheduling new cycles and wait up to `SHUTDOWN_GRACE` for the
    /// loop to exit. A cycle still running after that is left to finish on
    /// its own; it is never cancelled here.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        match time::timeout(SHUTDOWN_GRACE, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(?err, "alert scheduler task failed"),
            Err(_) => warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "stock check still running at shutdown; detaching it"
            ),
        }
    }
}
