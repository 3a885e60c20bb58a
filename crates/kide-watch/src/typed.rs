//! Per-kind typed informer tasks (C4) for the eight built-in kinds.
//!
//! Each kind gets its own long-running task driving a [`kube::runtime::watcher`] stream plus an
//! independent periodic resync timer, matching the "informer with periodic resync" contract in
//! §4.4. The two concerns (live deltas, periodic re-list) are merged into one `select!` loop so a
//! single task owns the kind end to end.

use std::{fmt::Debug, pin::pin, time::Duration};

use futures::TryStreamExt as _;
use kube::{
    Api, Client, Resource as KubeResource,
    runtime::{WatchStreamExt as _, watcher},
};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use kide_core::{ResourceCache, events::ResourceEvent, model::Resource};

use crate::sync::SyncHandle;

type Transform<K> = fn(&K, &ResourceCache) -> kide_core::Result<Resource>;

/// Runs one typed informer for `kind` until `cancel` fires.
#[instrument(skip_all, fields(kind = kind))]
pub(crate) async fn run<K>(
    client: Client,
    cache: ResourceCache,
    intake: mpsc::Sender<ResourceEvent>,
    resync_period: Duration,
    cancel: CancellationToken,
    sync_handle: SyncHandle,
    kind: &'static str,
    transform: Transform<K>,
) where
    K: KubeResource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let api: Api<K> = Api::all(client);
    let stream = watcher(api.clone(), watcher::Config::default()).default_backoff();
    let mut stream = pin!(stream);
    let mut resync = tokio::time::interval(resync_period);
    resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; the live watch stream already delivers the initial list.
    resync.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("informer cancelled");
                return;
            }
            _ = resync.tick() => {
                resync_once(&api, &cache, &intake, kind, transform).await;
            }
            next = stream.try_next() => {
                match next {
                    Ok(Some(event)) => handle_event(event, &cache, &intake, kind, transform, &sync_handle).await,
                    Ok(None) => {
                        debug!("watch stream ended");
                        return;
                    }
                    Err(error) => warn!(%error, "informer watch stream error, will retry via backoff"),
                }
            }
        }
    }
}

async fn handle_event<K>(
    event: watcher::Event<K>,
    cache: &ResourceCache,
    intake: &mpsc::Sender<ResourceEvent>,
    kind: &'static str,
    transform: Transform<K>,
    sync_handle: &SyncHandle,
) where
    K: KubeResource<DynamicType = ()> + Clone + Debug + Send + Sync + 'static,
{
    match event {
        watcher::Event::Init => {}
        watcher::Event::InitApply(object) => apply(&object, cache, intake, kind, transform).await,
        watcher::Event::InitDone => {
            sync_handle.mark_synced();
            debug!("initial list complete");
        }
        watcher::Event::Apply(object) => apply(&object, cache, intake, kind, transform).await,
        watcher::Event::Delete(object) => delete(&object, cache, intake, kind, transform).await,
    }
}

async fn apply<K>(
    object: &K,
    cache: &ResourceCache,
    intake: &mpsc::Sender<ResourceEvent>,
    kind: &'static str,
    transform: Transform<K>,
) where
    K: Debug,
{
    let resource = match transform(object, cache) {
        Ok(resource) => resource,
        Err(error) => {
            warn!(%error, kind, "failed to transform object, skipping this event");
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

async fn delete<K>(
    object: &K,
    cache: &ResourceCache,
    intake: &mpsc::Sender<ResourceEvent>,
    kind: &'static str,
    transform: Transform<K>,
) where
    K: Debug,
{
    // Transform once to compute the canonical id; the transformed payload itself is discarded in
    // favour of whatever the cache actually held (I5: deletes never rewrite referenced
    // resources, so we only need the id here).
    let id = match transform(object, cache) {
        Ok(resource) => resource.id,
        Err(error) => {
            warn!(%error, kind, "failed to transform deleted object, skipping this event");
            return;
        }
    };

    if let Some(previous) = cache.delete(&id) {
        if intake.try_send(ResourceEvent::Deleted { resource: previous }).is_err() {
            warn!(kind, "hub intake channel full, dropping delete event (next resync will re-deliver)");
        }
    }
}

/// Periodic resync (§4.4): re-lists the kind and re-emits ADDED/MODIFIED for every item, allowing
/// bidirectional edges and any divergence from a dropped watch event to converge (§4.3,
/// "Stale-edge policy").
async fn resync_once<K>(api: &Api<K>, cache: &ResourceCache, intake: &mpsc::Sender<ResourceEvent>, kind: &'static str, transform: Transform<K>)
where
    K: KubeResource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let objects = match api.list(&Default::default()).await {
        Ok(list) => list,
        Err(error) => {
            warn!(%error, kind, "periodic resync list failed, next watch event will retry");
            return;
        }
    };

    for object in &objects {
        apply(object, cache, intake, kind, transform).await;
    }
}
