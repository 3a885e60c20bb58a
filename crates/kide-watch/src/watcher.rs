//! [`Watcher`] (C4): owns every built-in typed informer plus the CRD-discovered dynamic
//! informers for one connected cluster, and the sync gate that guards them.

use std::time::Duration;

use k8s_openapi::api::{
    apps::v1::{Deployment, ReplicaSet},
    core::v1::{ConfigMap, Node, Pod, Secret, Service},
    networking::v1::Ingress,
};
use kube::Client;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use kide_core::{
    ResourceCache,
    events::ResourceEvent,
    transformers::{
        transform_config_map, transform_deployment, transform_ingress, transform_node, transform_pod, transform_replica_set, transform_secret,
        transform_service,
    },
};

use crate::{dynamic, error::Result, sync::SyncHandle, typed};

/// Informers deliver a synthetic list as `InitApply` events and then deltas, with a periodic
/// resync on top (§4.4, "Informer contract"). 30s matches the spec's suggested default.
pub const DEFAULT_RESYNC_PERIOD: Duration = Duration::from_secs(30);

/// Owns every running informer for one cluster connection. Dropping a [`Watcher`] does not stop
/// its tasks; call [`Watcher::stop`] explicitly (mirrors the explicit `Stop()` in §4.5).
pub struct Watcher {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    sync_handles: Vec<SyncHandle>,
}

impl Watcher {
    /// Starts every built-in informer and discovers + starts a dynamic informer per served CRD
    /// (§4.4). Returns as soon as all tasks are spawned; callers should follow up with
    /// [`Watcher::wait_for_cache_sync`] before serving real snapshots to clients.
    ///
    /// `cancel` governs both that initial sync wait and later teardown: the caller holds onto it
    /// to cancel an in-flight [`Watcher::wait_for_cache_sync`], and [`Watcher::stop`] cancels the
    /// same token to stop every informer task, so one token drives both ends of the lifecycle.
    #[instrument(skip_all)]
    pub async fn start(
        client: Client,
        cache: ResourceCache,
        intake: mpsc::Sender<ResourceEvent>,
        resync_period: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let mut tasks = Vec::new();
        let mut sync_handles = Vec::new();

        macro_rules! spawn_typed {
            ($kind:literal, $ty:ty, $transform:expr) => {{
                let sync_handle = SyncHandle::new($kind);
                sync_handles.push(sync_handle.clone());
                tasks.push(tokio::spawn(typed::run::<$ty>(
                    client.clone(),
                    cache.clone(),
                    intake.clone(),
                    resync_period,
                    cancel.clone(),
                    sync_handle,
                    $kind,
                    $transform,
                )));
            }};
        }

        spawn_typed!("Pod", Pod, transform_pod);
        spawn_typed!("Deployment", Deployment, transform_deployment);
        spawn_typed!("ReplicaSet", ReplicaSet, transform_replica_set);
        spawn_typed!("Service", Service, transform_service);
        spawn_typed!("Ingress", Ingress, transform_ingress);
        spawn_typed!("ConfigMap", ConfigMap, transform_config_map);
        spawn_typed!("Secret", Secret, transform_secret);
        spawn_typed!("Node", Node, transform_node);

        match dynamic::discover(&client).await {
            Ok(crds) => {
                info!(count = crds.len(), "discovered custom resource definitions");
                for crd in crds {
                    let sync_handle = SyncHandle::new(crd.api_resource.kind.clone());
                    sync_handles.push(sync_handle.clone());
                    tasks.push(tokio::spawn(dynamic::run(
                        client.clone(),
                        crd.api_resource,
                        cache.clone(),
                        intake.clone(),
                        resync_period,
                        cancel.clone(),
                        sync_handle,
                    )));
                }
            }
            Err(error) => {
                // CRD discovery is best-effort: a cluster without RBAC to list CRDs should still
                // get the built-in kinds (§7, "Connectivity" row is retried by the informer
                // machinery; discovery failure here is the one-shot startup equivalent).
                warn!(%error, "custom resource discovery failed, continuing with built-in kinds only");
            }
        }

        Ok(Self { cancel, tasks, sync_handles })
    }

    /// Blocks until every informer's initial list has completed (§4.4, "Sync gate").
    pub async fn wait_for_cache_sync(&self, cancel: &CancellationToken) -> Result<()> {
        crate::sync::wait_for_cache_sync(&self.sync_handles, cancel).await
    }

    /// Cancels every informer task and waits for them to finish (§4.5, `Stop()`).
    pub async fn stop(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
