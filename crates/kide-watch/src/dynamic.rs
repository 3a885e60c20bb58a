//! CRD discovery and the dynamic (per-GVR) informer path (§4.4, "CRD discovery at startup").

use std::{pin::pin, time::Duration};

use futures::TryStreamExt as _;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    Api, Client, ResourceExt as _,
    core::{ApiResource, DynamicObject, GroupVersionKind},
    runtime::{WatchStreamExt as _, watcher},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use kide_core::{ResourceCache, events::ResourceEvent, transformers::transform_custom_resource};

use crate::{
    error::{ListCrdsSnafu, Result},
    sync::SyncHandle,
};

/// One CRD-discovered kind to watch dynamically, built from the first served version of a
/// `CustomResourceDefinition` (§4.4).
pub struct DiscoveredCrd {
    pub api_resource: ApiResource,
    pub name: String,
}

/// Lists every `CustomResourceDefinition` and selects the first served version of each (§4.4).
#[instrument(skip_all)]
pub async fn discover(client: &Client) -> Result<Vec<DiscoveredCrd>> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let list = crds.list(&Default::default()).await.context(ListCrdsSnafu)?;

    let mut discovered = Vec::new();
    for crd in list {
        let name = crd.name_any();
        let group = crd.spec.group.clone();
        let plural = crd.spec.names.plural.clone();
        let kind = crd.spec.names.kind.clone();

        let Some(served_version) = crd.spec.versions.iter().find(|v| v.served) else {
            warn!(crd = %name, "CustomResourceDefinition has no served version, skipping");
            continue;
        };

        let gvk = GroupVersionKind::gvk(&group, &served_version.name, &kind);
        let mut api_resource = ApiResource::from_gvk(&gvk);
        api_resource.plural = plural;

        discovered.push(DiscoveredCrd { api_resource, name });
    }

    Ok(discovered)
}

use snafu::ResultExt as _;

/// Runs one dynamic informer for a CRD-discovered kind, using the generic transformer (§4.2,
/// "Custom (CRD)"). Structurally identical to [`crate::typed::run`], specialised for
/// [`DynamicObject`].
#[instrument(skip_all, fields(kind = %api_resource.kind))]
pub(crate) async fn run(
    client: Client,
    api_resource: ApiResource,
    cache: ResourceCache,
    intake: mpsc::Sender<ResourceEvent>,
    resync_period: Duration,
    cancel: CancellationToken,
    sync_handle: SyncHandle,
) {
    let kind: &'static str = Box::leak(api_resource.kind.clone().into_boxed_str());
    let api: Api<DynamicObject> = Api::all_with(client, &api_resource);
    let stream = watcher(api.clone(), watcher::Config::default()).default_backoff();
    let mut stream = pin!(stream);
    let mut resync = tokio::time::interval(resync_period);
    resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    resync.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("dynamic informer cancelled");
                return;
            }
            _ = resync.tick() => {
                resync_once(&api, &cache, &intake, kind).await;
            }
            next = stream.try_next() => {
                match next {
                    Ok(Some(event)) => handle_event(event, &cache, &intake, kind, &sync_handle).await,
                    Ok(None) => {
                        debug!("dynamic watch stream ended");
                        return;
                    }
                    Err(error) => warn!(%error, kind, "dynamic informer watch stream error, will retry via backoff"),
                }
            }
        }
    }
}

async fn handle_event(
    event: watcher::Event<DynamicObject>,
    cache: &ResourceCache,
    intake: &mpsc::Sender<ResourceEvent>,
    kind: &'static str,
    sync_handle: &SyncHandle,
) {
    match event {
        watcher::Event::Init => {}
        watcher::Event::InitApply(object) => apply(&object, cache, intake, kind).await,
        watcher::Event::InitDone => {
            sync_handle.mark_synced();
            debug!("initial list complete");
        }
        watcher::Event::Apply(object) => apply(&object, cache, intake, kind).await,
        watcher::Event::Delete(object) => delete(&object, cache, intake, kind).await,
    }
}

async fn apply(object: &DynamicObject, cache: &ResourceCache, intake: &mpsc::Sender<ResourceEvent>, kind: &'static str) {
    let resource = match transform_custom_resource(object, cache) {
        Ok(resource) => resource,
        Err(error) => {
            warn!(%error, kind, "failed to transform custom resource, skipping this event");
            return;
        }
    };

    let was_present = cache.get(&resource.id).is_some();
    cache.set(resource.clone());
    kide_core::RelationshipResolver::new(cache).update_bidirectional(&resource);

    let event = if was_present {
        ResourceEvent::Modified { resource }
    } else {
        ResourceEvent::Added { resource }
    };
    if intake.try_send(event).is_err() {
        warn!(kind, "hub intake channel full, dropping event (next resync will re-deliver)");
    }
}

async fn delete(object: &DynamicObject, cache: &ResourceCache, intake: &mpsc::Sender<ResourceEvent>, kind: &'static str) {
    let id = match transform_custom_resource(object, cache) {
        Ok(resource) => resource.id,
        Err(error) => {
            warn!(%error, kind, "failed to transform deleted custom resource, skipping this event");
            return;
        }
    };

    if let Some(previous) = cache.delete(&id) {
        if intake.try_send(ResourceEvent::Deleted { resource: previous }).is_err() {
            warn!(kind, "hub intake channel full, dropping delete event (next resync will re-deliver)");
        }
    }
}

async fn resync_once(api: &Api<DynamicObject>, cache: &ResourceCache, intake: &mpsc::Sender<ResourceEvent>, kind: &'static str) {
    let objects = match api.list(&Default::default()).await {
        Ok(list) => list,
        Err(error) => {
            warn!(%error, kind, "periodic resync list failed for custom resource, next watch event will retry");
            return;
        }
    };

    for object in &objects {
        apply(object, cache, intake, kind).await;
    }
}
