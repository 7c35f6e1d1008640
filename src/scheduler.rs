//! Fixed-cadence driver for the full forex refresh.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::refresh::ForexRefresher;

/// Runs `refresh_all` on a fixed interval until stopped. Passes are
/// serialized: the loop awaits each pass on one task, and a tick that
/// fires while a pass is still running is delayed, never overlapped.
pub struct RefreshScheduler {
    refresher: Arc<ForexRefresher>,
    interval: Duration,
}

/// Handle to a started scheduler. Dropping it without `stop` leaves
/// the background task running for the life of the runtime.
pub struct RunningScheduler {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(refresher: Arc<ForexRefresher>, interval: Duration) -> Self {
        RefreshScheduler {
            refresher,
            interval,
        }
    }

    /// Spawns the refresh loop. The first pass runs immediately, then
    /// once per interval.
    pub fn start(&self) -> RunningScheduler {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let refresher = Arc::clone(&self.refresher);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs_f64(), "Refresh scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Refresh tick");
                        if let Err(error) = refresher.refresh_all(Utc::now()).await {
                            warn!(%error, "Scheduled refresh pass failed");
                        }
                    }
                    _ = stop_rx.changed() => {
                        info!("Refresh scheduler stopping");
                        break;
                    }
                }
            }
        });

        RunningScheduler {
            stop: stop_tx,
            handle,
        }
    }
}

impl RunningScheduler {
    /// Signals the loop to exit and waits for it. A pass in flight
    /// completes before the task ends.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}
