//! The sync gate (§4.4, "Sync gate"): blocks until every registered informer has completed its
//! initial list, with periodic progress reporting and cancellation support.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, SyncCancelledSnafu};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// One flag per registered informer (typed or dynamic), flipped once its initial list/watch
/// completes. Cheap to clone; the flag itself is shared with the informer task.
#[derive(Clone)]
pub struct SyncHandle {
    pub(crate) kind: String,
    pub(crate) synced: Arc<AtomicBool>,
}

impl SyncHandle {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), synced: Arc::new(AtomicBool::new(false)) }
    }

    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }
}

/// Blocks until every handle in `handles` reports synced, polling on [`PROGRESS_INTERVAL`] and
/// logging which kinds are still outstanding. Returns [`Error::SyncCancelled`] if `cancel` fires
/// first (§5, "Informer sync has a cancellation channel").
pub async fn wait_for_cache_sync(handles: &[SyncHandle], cancel: &CancellationToken) -> Result<()> {
    let mut ticker = interval(PROGRESS_INTERVAL);

    loop {
        if handles.iter().all(SyncHandle::is_synced) {
            return Ok(());
        }

        tokio::select! {
            () = cancel.cancelled() => return SyncCancelledSnafu.fail(),
            _ = ticker.tick() => {
                let pending: Vec<&str> = handles
                    .iter()
                    .filter(|handle| !handle.is_synced())
                    .map(|handle| handle.kind.as_str())
                    .collect();
                if !pending.is_empty() {
                    debug!(pending = ?pending, "waiting for informers to finish initial sync");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_immediately_once_all_handles_are_synced() {
        let handle = SyncHandle::new("Pod");
        handle.mark_synced();
        let cancel = CancellationToken::new();
        wait_for_cache_sync(&[handle], &cancel).await.expect("sync completes");
    }

    #[tokio::test]
    async fn cancellation_aborts_the_wait() {
        let handle = SyncHandle::new("Pod");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = wait_for_cache_sync(&[handle], &cancel).await;
        assert!(result.is_err());
    }
}
