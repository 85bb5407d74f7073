//! Background flush of a dirty store on a timer

use crate::error::{LabCacheError, LabCacheResult};
use crate::store::SharedPatternStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a running autosave task
#[derive(Debug)]
pub struct AutosaveHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Token that stops the task when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Stop the task and wait for its final flush
    pub async fn shutdown(self) -> LabCacheResult<()> {
        self.cancel.cancel();
        self.join
            .await
            .map_err(|e| LabCacheError::other(format!("Autosave task failed: {}", e)))
    }
}

/// Spawn the autosave loop on the current runtime.
///
/// Every `period` the store is saved if it has unsaved changes. When `cancel`
/// fires the loop flushes once more and exits.
pub fn spawn(store: SharedPatternStore, period: Duration, cancel: CancellationToken) -> AutosaveHandle {
    let token = cancel.clone();
    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if store.is_dirty() {
                        flush(&store).await;
                    }
                }
                _ = token.cancelled() => {
                    flush(&store).await;
                    tracing::debug!("autosave stopped");
                    break;
                }
            }
        }
    });

    tracing::debug!(period_secs = period.as_secs_f64(), "autosave started");
    AutosaveHandle { cancel, join }
}

async fn flush(store: &SharedPatternStore) {
    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || store.flush()).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "autosave failed"),
        Err(e) => tracing::warn!(error = %e, "autosave task panicked"),
    }
}
