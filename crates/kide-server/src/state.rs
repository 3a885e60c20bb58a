//! Shared server state: the active controller, both hubs, and the bookkeeping the REST API
//! and `/health` endpoint need that the hubs don't expose directly (§4.9, §10.5).

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use kide_controller::AppController;
use kide_core::events::SyncStatusEvent;
use kide_hub::{Filter, LogHub, ResourceHub};
use tokio::sync::RwLock;

/// Everything an Axum handler needs, cheap to clone (every field is itself an `Arc`/handle).
#[derive(Clone)]
pub struct ServerState {
    pub controller: Arc<AppController>,
    pub resource_hub: ResourceHub,
    pub log_hub: LogHub,
    sync_status: Arc<RwLock<Option<SyncStatusEvent>>>,
    active_sessions: Arc<AtomicUsize>,
}

impl ServerState {
    pub fn new(controller: Arc<AppController>, resource_hub: ResourceHub, log_hub: LogHub) -> Self {
        let state = Self {
            controller,
            resource_hub,
            log_hub,
            sync_status: Arc::new(RwLock::new(None)),
            active_sessions: Arc::new(AtomicUsize::new(0)),
        };
        state.spawn_sync_status_mirror();
        state
    }

    /// Registers a session with the resource hub purely to observe the sync-status broadcasts it
    /// caches for new attachments (§4.6, "register"), so `GET /api/sync/status` (§4.9) has
    /// something to read synchronously without the hub exposing an internal getter. Resource
    /// events on the same session are drained and discarded.
    fn spawn_sync_status_mirror(&self) {
        let hub = self.resource_hub.clone();
        let sync_status = self.sync_status.clone();
        tokio::spawn(async move {
            let mut session = hub.register(Filter::default());
            loop {
                tokio::select! {
                    event = session.sync_rx.recv() => {
                        match event {
                            Some(event) => *sync_status.write().await = Some(event),
                            None => return,
                        }
                    }
                    resource = session.resource_rx.recv() => {
                        if resource.is_none() {
                            return;
                        }
                    }
                }
            }
        });
    }

    pub async fn sync_status(&self) -> Option<SyncStatusEvent> {
        self.sync_status.read().await.clone()
    }

    pub fn session_connected(&self) {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_disconnected(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }
}
