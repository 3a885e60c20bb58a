//! [`AppController`] (C5): owns the currently active cluster's client, cache and watcher, and
//! exposes the atomic `SwitchContext` sequence from §4.5.

use std::{path::PathBuf, sync::Arc, time::Duration};

use kide_core::{ResourceCache, events::ResourceEvent, events::SyncStatusEvent};
use kide_watch::Watcher;
use kube::config::Kubeconfig;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    error::{ContextNotFoundSnafu, ReadKubeconfigSnafu, Result, SwitchInProgressSnafu, WatchSnafu},
    kubeconfig::build_client,
};
use snafu::ResultExt as _;

const IN_CLUSTER_LABEL: &str = "in-cluster";

/// Disconnects every active client session on both the resource and log hubs (§4.5,
/// "SwitchContext", step "disconnect all sessions on both resource and log hubs").
///
/// `kide-controller` sits below the hubs in the dependency order (§2), so it only knows about
/// this interface rather than depending on `kide-hub` directly; the server binary wires the real
/// hubs in at startup.
#[async_trait::async_trait]
pub trait SessionDisconnector: Send + Sync {
    async fn disconnect_all(&self);
}

struct ActiveCluster {
    client: kube::Client,
    cache: ResourceCache,
    watcher: Watcher,
}

struct ControllerState {
    context: String,
    active: Option<ActiveCluster>,
}

/// Owns the lifecycle of a connected cluster for the currently active context.
///
/// Every mutating operation (`start`, `stop`, `switch_context`) takes the same
/// `tokio::sync::RwLock` write guard, so they serialize against each other (§4.5, "Holds a write
/// lock so concurrent switches serialize"). `switch_context` uses a non-blocking `try_write` so a
/// second caller gets an immediate error rather than queuing behind an in-flight switch, matching
/// the REST contract in §4.9 ("error on invalid or already-running switch") — see DESIGN.md.
pub struct AppController {
    state: RwLock<ControllerState>,
    resource_intake: mpsc::Sender<ResourceEvent>,
    sync_intake: mpsc::Sender<SyncStatusEvent>,
    disconnector: Arc<dyn SessionDisconnector>,
    resync_period: Duration,
    kubeconfig_path: Option<PathBuf>,
}

impl AppController {
    pub fn new(
        resource_intake: mpsc::Sender<ResourceEvent>,
        sync_intake: mpsc::Sender<SyncStatusEvent>,
        disconnector: Arc<dyn SessionDisconnector>,
        resync_period: Duration,
        kubeconfig_path: Option<PathBuf>,
    ) -> Self {
        Self {
            state: RwLock::new(ControllerState { context: String::new(), active: None }),
            resource_intake,
            sync_intake,
            disconnector,
            resync_period,
            kubeconfig_path,
        }
    }

    /// Returns a handle to the active cache, if any cluster has been started yet.
    pub async fn cache(&self) -> Option<ResourceCache> {
        self.state.read().await.active.as_ref().map(|active| active.cache.clone())
    }

    /// Returns the active cluster's client, used by the log gateway to open pod log streams.
    pub async fn client(&self) -> Option<kube::Client> {
        self.state.read().await.active.as_ref().map(|active| active.client.clone())
    }

    /// Name of the currently active context (§4.9, `currentContext()`).
    pub async fn current_context(&self) -> String {
        self.state.read().await.context.clone()
    }

    /// Lists kubeconfig contexts from the same kubeconfig path this controller was configured
    /// with (§4.9, `GET /api/contexts`).
    pub async fn list_contexts(&self) -> Result<Vec<crate::kubeconfig::ContextInfo>> {
        crate::kubeconfig::list_contexts(self.kubeconfig_path.as_deref()).await
    }

    /// Builds a client, cache and watcher for `context` (or the kubeconfig's current context when
    /// `None`) and waits for the initial sync before returning (§4.5, `Start`).
    #[instrument(skip(self))]
    pub async fn start(&self, context: Option<String>) -> Result<()> {
        let mut guard = self.state.write().await;
        self.bring_up(&mut guard, context).await
    }

    /// Cancels the active watcher and releases its resources (§4.5, `Stop`).
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut guard = self.state.write().await;
        Self::tear_down(&mut guard).await;
    }

    /// The atomic context-switch sequence (§4.5, `SwitchContext` / §8 scenario 6).
    #[instrument(skip(self))]
    pub async fn switch_context(&self, new_context: String) -> Result<()> {
        let Ok(mut guard) = self.state.try_write() else {
            return SwitchInProgressSnafu.fail();
        };

        let _ = self.sync_intake.send(SyncStatusEvent::syncing(new_context.clone())).await;
        self.disconnector.disconnect_all().await;
        Self::tear_down(&mut guard).await;

        match self.bring_up(&mut guard, Some(new_context.clone())).await {
            Ok(()) => {
                let _ = self.sync_intake.send(SyncStatusEvent::synced(new_context)).await;
                Ok(())
            }
            Err(error) => {
                let _ = self.sync_intake.send(SyncStatusEvent::failed(new_context, error.to_string())).await;
                Err(error)
            }
        }
    }

    async fn bring_up(&self, guard: &mut ControllerState, context: Option<String>) -> Result<()> {
        let resolved = resolve_context_name(context.as_deref(), self.kubeconfig_path.as_deref()).await?;
        let client = build_client(Some(&resolved), self.kubeconfig_path.as_deref()).await?;

        let cache = ResourceCache::new();
        // One token governs both the initial sync wait and later teardown: `Watcher::stop`
        // cancels it, which is also what unblocks a `wait_for_cache_sync` still in flight.
        let watch_cancel = CancellationToken::new();
        let watcher = Watcher::start(
            client.clone(),
            cache.clone(),
            self.resource_intake.clone(),
            self.resync_period,
            watch_cancel.clone(),
        )
        .await
        .context(WatchSnafu)?;

        if let Err(source) = watcher.wait_for_cache_sync(&watch_cancel).await {
            warn!(error = %source, context = %resolved, "initial cache sync did not complete");
            watcher.stop().await;
            return Err(source).context(WatchSnafu);
        }

        info!(context = %resolved, "cluster watch graph synced");
        guard.context = resolved;
        guard.active = Some(ActiveCluster { client, cache, watcher });
        Ok(())
    }

    async fn tear_down(guard: &mut ControllerState) {
        if let Some(active) = guard.active.take() {
            active.watcher.stop().await;
        }
    }
}

/// Resolves `requested` against the in-cluster/kubeconfig precedence described in §6
/// ("Environment"): an in-cluster service account always wins and yields the synthetic
/// [`IN_CLUSTER_LABEL`]; otherwise the name must exist in kubeconfig, defaulting to its
/// `current-context`.
async fn resolve_context_name(requested: Option<&str>, kubeconfig_path: Option<&std::path::Path>) -> Result<String> {
    if kube::Config::incluster_env().is_ok() {
        return Ok(IN_CLUSTER_LABEL.to_string());
    }

    let kubeconfig = match kubeconfig_path {
        Some(path) => Kubeconfig::read_from(path).context(ReadKubeconfigSnafu)?,
        None => Kubeconfig::read().context(ReadKubeconfigSnafu)?,
    };
    match requested {
        Some(name) => {
            let exists = kubeconfig.contexts.iter().any(|c| c.name == name);
            if exists {
                Ok(name.to_string())
            } else {
                ContextNotFoundSnafu { context: name.to_string() }.fail()
            }
        }
        None => kubeconfig
            .current_context
            .clone()
            .ok_or_else(|| ContextNotFoundSnafu { context: "<current-context>".to_string() }.build()),
    }
}
