use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::acquisition::AcquisitionPipeline;
use crate::state::SharedState;

/// Drives the scan loop. Two states: idle and active. Starting triggers an
/// immediate acquisition cycle, then one per interval; stopping cancels the
/// recurrence but never aborts a cycle already in flight — its results are
/// still applied.
pub struct MonitorController {
    state: SharedState,
    pipeline: Arc<AcquisitionPipeline>,
    interval: Duration,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl MonitorController {
    pub fn new(state: SharedState, pipeline: AcquisitionPipeline, interval: Duration) -> Self {
        Self {
            state,
            pipeline: Arc::new(pipeline),
            interval,
            stop_tx: Mutex::new(None),
        }
    }

    pub async fn is_active(&self) -> bool {
        self.stop_tx.lock().await.is_some()
    }

    /// Idle → active. Returns false if already active.
    pub async fn start(&self) -> bool {
        let mut guard = self.stop_tx.lock().await;
        if guard.is_some() {
            return false;
        }

        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);
        drop(guard);

        self.state.write().await.set_monitoring(true);
        info!(interval_secs = self.interval.as_secs(), "Monitoring started");

        let state = self.state.clone();
        let pipeline = self.pipeline.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // The first tick fires immediately; stop wakes the wait so
                // an idle loop shuts down without waiting out the interval.
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = rx.changed() => {
                        debug!("Scan loop stopped");
                        break;
                    }
                }
                run_cycle(&pipeline, &state).await;
            }
        });

        true
    }

    /// Active → idle. Returns false if already idle.
    pub async fn stop(&self) -> bool {
        let mut guard = self.stop_tx.lock().await;
        let Some(tx) = guard.take() else {
            return false;
        };
        drop(guard);

        // Receiver may already be gone if the task panicked; nothing to do.
        let _ = tx.send(true);

        self.state.write().await.set_monitoring(false);
        info!("Monitoring stopped");
        true
    }
}

async fn run_cycle(pipeline: &AcquisitionPipeline, state: &SharedState) {
    let keywords = state.read().await.keywords();
    if keywords.is_empty() {
        debug!("No keywords configured, skipping scan cycle");
        return;
    }

    let alerts = pipeline.acquire(&keywords).await;
    if alerts.is_empty() {
        return;
    }

    state.write().await.apply_cycle(alerts);
}
