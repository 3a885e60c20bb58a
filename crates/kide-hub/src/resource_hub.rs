//! [`ResourceHub`] (C6): single-threaded run loop fanning out resource and sync events to every
//! attached session, applying each session's filter and the slow-consumer drop policy (§4.6, §5,
//! §9 "Slow-consumer policy").

use kide_core::events::{ResourceEvent, SyncStatusEvent};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::filter::Filter;

/// Bound on a session's resource/sync queues. Sized generously above normal burst sizes; once
/// full the session is dropped rather than the hub blocking (§5).
pub const SESSION_QUEUE_CAPACITY: usize = 256;

/// Bound on the hub's own intake channels. A full intake channel drops the incoming event; the
/// next informer resync re-delivers it (§5, "Suspension / blocking points").
pub const INTAKE_CAPACITY: usize = 1024;

struct SessionState {
    id: Uuid,
    filter: Filter,
    resource_tx: mpsc::Sender<ResourceEvent>,
    sync_tx: mpsc::Sender<SyncStatusEvent>,
}

enum Command {
    Register(SessionState),
    Unregister(Uuid),
    DisconnectAll,
}

/// A registered session's receiving half, handed back to the gateway.
pub struct RegisteredSession {
    pub id: Uuid,
    pub resource_rx: mpsc::Receiver<ResourceEvent>,
    pub sync_rx: mpsc::Receiver<SyncStatusEvent>,
}

/// Handle to the running hub task. Cloning is cheap; every clone shares the same run loop.
#[derive(Clone)]
pub struct ResourceHub {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl ResourceHub {
    /// Spawns the run loop and returns the handle plus the two intake senders the watcher /
    /// controller feed events into.
    pub fn spawn() -> (Self, mpsc::Sender<ResourceEvent>, mpsc::Sender<SyncStatusEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resource_tx, resource_rx) = mpsc::channel(INTAKE_CAPACITY);
        let (sync_tx, sync_rx) = mpsc::channel(INTAKE_CAPACITY);

        tokio::spawn(run(cmd_rx, resource_rx, sync_rx));

        (Self { cmd_tx }, resource_tx, sync_tx)
    }

    /// Registers a new session under `filter` and returns its receiving half. If a sync status
    /// has already been broadcast, it is enqueued immediately (§4.6, "register").
    pub fn register(&self, filter: Filter) -> RegisteredSession {
        let id = Uuid::new_v4();
        let (resource_tx, resource_rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let (sync_tx, sync_rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let _ = self.cmd_tx.send(Command::Register(SessionState { id, filter, resource_tx, sync_tx }));
        RegisteredSession { id, resource_rx, sync_rx }
    }

    pub fn unregister(&self, id: Uuid) {
        let _ = self.cmd_tx.send(Command::Unregister(id));
    }

    /// Drops every attached session, closing their queues (§4.5, `SwitchContext`).
    pub fn disconnect_all(&self) {
        let _ = self.cmd_tx.send(Command::DisconnectAll);
    }
}

#[instrument(skip_all, name = "resource_hub")]
async fn run(mut cmd_rx: mpsc::UnboundedReceiver<Command>, mut resource_rx: mpsc::Receiver<ResourceEvent>, mut sync_rx: mpsc::Receiver<SyncStatusEvent>) {
    let mut sessions: Vec<SessionState> = Vec::new();
    let mut last_sync: Option<SyncStatusEvent> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Command::Register(session)) => {
                        if let Some(sync) = &last_sync {
                            let _ = session.sync_tx.try_send(sync.clone());
                        }
                        debug!(session = %session.id, total = sessions.len() + 1, "session registered");
                        sessions.push(session);
                    }
                    Some(Command::Unregister(id)) => {
                        sessions.retain(|s| s.id != id);
                        debug!(session = %id, total = sessions.len(), "session unregistered");
                    }
                    Some(Command::DisconnectAll) => {
                        debug!(count = sessions.len(), "disconnecting all resource sessions");
                        sessions.clear();
                    }
                    None => break,
                }
            }
            Some(event) = resource_rx.recv() => {
                let resource = event.resource();
                sessions.retain(|session| {
                    if !session.filter.matches(resource) {
                        return true;
                    }
                    match session.resource_tx.try_send(event.clone()) {
                        Ok(()) => true,
                        Err(_) => {
                            warn!(session = %session.id, "resource queue full, dropping slow session");
                            false
                        }
                    }
                });
            }
            Some(sync) = sync_rx.recv() => {
                last_sync = Some(sync.clone());
                sessions.retain(|session| match session.sync_tx.try_send(sync.clone()) {
                    Ok(()) => true,
                    Err(_) => {
                        warn!(session = %session.id, "sync queue full, dropping slow session");
                        false
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kide_core::model::{Health, Relationships, Status, resource_id};
    use kide_core::Resource;

    use super::*;

    fn resource(kind: &str, namespace: &str, name: &str) -> Resource {
        Resource {
            id: resource_id(kind, namespace, name),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            status: Status::default(),
            health: Health::Healthy,
            relationships: Relationships::default(),
            labels: Default::default(),
            annotations: Default::default(),
            created_at: chrono::Utc::now(),
            spec: serde_json::Value::Null,
            yaml: String::new(),
        }
    }

    fn pod(namespace: &str, name: &str) -> Resource {
        resource("Pod", namespace, name)
    }

    #[tokio::test]
    async fn filters_per_session_matches_p4() {
        let (hub, resource_tx, _sync_tx) = ResourceHub::spawn();
        let mut ns1 = hub.register(Filter::new(Some("ns1".to_string()), None));
        let mut pod_only = hub.register(Filter::new(None, Some("Pod".to_string())));

        resource_tx.send(ResourceEvent::Added { resource: pod("ns1", "web-0") }).await.unwrap();
        resource_tx.send(ResourceEvent::Added { resource: pod("ns2", "web-1") }).await.unwrap();
        resource_tx.send(ResourceEvent::Added { resource: resource("Node", "", "node-1") }).await.unwrap();

        let first = ns1.resource_rx.recv().await.unwrap();
        assert_eq!(first.resource().name, "web-0");
        let second = ns1.resource_rx.recv().await.unwrap();
        assert_eq!(second.resource().name, "node-1");

        let only = pod_only.resource_rx.recv().await.unwrap();
        assert_eq!(only.resource().name, "web-0");
        let only2 = pod_only.resource_rx.recv().await.unwrap();
        assert_eq!(only2.resource().name, "web-1");
    }

    #[tokio::test]
    async fn newly_registered_session_receives_cached_sync_status() {
        let (hub, _resource_tx, sync_tx) = ResourceHub::spawn();
        sync_tx.send(SyncStatusEvent::synced("dev")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let mut session = hub.register(Filter::default());
        let event = session.sync_rx.recv().await.unwrap();
        assert!(event.synced);
        assert_eq!(event.context, "dev");
    }

    #[tokio::test]
    async fn disconnect_all_closes_every_session_queue() {
        let (hub, resource_tx, _sync_tx) = ResourceHub::spawn();
        let mut session = hub.register(Filter::default());
        hub.disconnect_all();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        resource_tx.send(ResourceEvent::Added { resource: pod("ns1", "web-0") }).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(session.resource_rx.recv().await.is_none());
    }
}
