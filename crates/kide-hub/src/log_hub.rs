//! [`LogHub`] (C7): one reader task per attached log session, streaming lines from a pod/container
//! log stream with the `follow`/`tailLines`/`sinceSeconds`/`headLines` semantics from §4.7.

use std::collections::HashMap;

use futures::{AsyncBufReadExt, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::{Client, api::Api};
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::resource_hub::SESSION_QUEUE_CAPACITY;

/// `(namespace, pod, container)` identifying a single log session (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogKey {
    pub namespace: String,
    pub pod: String,
    pub container: String,
}

/// Log options enumerated in §4.7.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    pub follow: bool,
    pub tail_lines: Option<i64>,
    pub since_seconds: Option<i64>,
    pub head_lines: Option<u64>,
}

/// The `{type: LOG_LINE|LOG_END|LOG_ERROR, ...}` wire frame (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogMessage {
    #[serde(rename = "LOG_LINE")]
    Line { line: String },
    #[serde(rename = "LOG_END")]
    End { reason: String },
    #[serde(rename = "LOG_ERROR")]
    Error { error: String },
}

enum Command {
    Open { id: Uuid, handle: JoinHandle<()>, cancel: CancellationToken },
    Close(Uuid),
    DisconnectAll,
}

struct Session {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Handle to the running log-hub task. Cloning is cheap.
#[derive(Clone)]
pub struct LogHub {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl LogHub {
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(cmd_rx));
        Self { cmd_tx }
    }

    /// Opens a new log session against `client`, returning its id and the receiving half of its
    /// message queue. Closing the returned id (or calling [`LogHub::disconnect_all`]) cancels the
    /// reader promptly (§4.7, "Cancellation").
    pub fn open(&self, client: Client, key: LogKey, options: LogOptions) -> (Uuid, mpsc::Receiver<LogMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(read_log(client, key, options, tx, cancel.clone()));
        let _ = self.cmd_tx.send(Command::Open { id, handle, cancel });
        (id, rx)
    }

    pub fn close(&self, id: Uuid) {
        let _ = self.cmd_tx.send(Command::Close(id));
    }

    pub fn disconnect_all(&self) {
        let _ = self.cmd_tx.send(Command::DisconnectAll);
    }
}

#[instrument(skip_all, name = "log_hub")]
async fn run(mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
    let mut sessions: HashMap<Uuid, Session> = HashMap::new();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            Command::Open { id, handle, cancel } => {
                debug!(session = %id, total = sessions.len() + 1, "log session opened");
                sessions.insert(id, Session { handle, cancel });
            }
            Command::Close(id) => {
                if let Some(session) = sessions.remove(&id) {
                    session.cancel.cancel();
                    session.handle.abort();
                    debug!(session = %id, "log session closed");
                }
            }
            Command::DisconnectAll => {
                debug!(count = sessions.len(), "disconnecting all log sessions");
                for (_, session) in sessions.drain() {
                    session.cancel.cancel();
                    session.handle.abort();
                }
            }
        }
    }
}

/// Opens the K8s log stream for `key` and scans it line by line, applying `headLines` on top of
/// the native `follow`/`tailLines`/`sinceSeconds` parameters (§4.7: "implemented above the K8s
/// API").
async fn read_log(client: Client, key: LogKey, options: LogOptions, tx: mpsc::Sender<LogMessage>, cancel: CancellationToken) {
    let api: Api<Pod> = Api::namespaced(client, &key.namespace);
    let params = kube::api::LogParams {
        container: Some(key.container.clone()),
        follow: options.follow,
        tail_lines: options.tail_lines,
        since_seconds: options.since_seconds,
        ..Default::default()
    };

    let stream = match api.log_stream(&key.pod, &params).await {
        Ok(stream) => stream,
        Err(error) => {
            warn!(namespace = %key.namespace, pod = %key.pod, container = %key.container, %error, "failed to open log stream");
            let _ = tx.send(LogMessage::Error { error: error.to_string() }).await;
            return;
        }
    };

    let mut lines = stream.lines();
    let mut delivered: u64 = 0;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return,
            line = lines.next() => line,
        };

        match line {
            Some(Ok(line)) => {
                if tx.send(LogMessage::Line { line }).await.is_err() {
                    return;
                }
                delivered += 1;
                if let Some(limit) = options.head_lines {
                    if delivered >= limit {
                        let _ = tx.send(LogMessage::End { reason: format!("Head limit reached ({limit} lines)") }).await;
                        return;
                    }
                }
            }
            Some(Err(error)) => {
                let _ = tx.send(LogMessage::Error { error: error.to_string() }).await;
                return;
            }
            None => {
                let _ = tx.send(LogMessage::End { reason: "stream closed".to_string() }).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_message_wire_shape_uses_bit_exact_tags() {
        let line = serde_json::to_value(LogMessage::Line { line: "hello".to_string() }).unwrap();
        assert_eq!(line["type"], "LOG_LINE");
        assert_eq!(line["line"], "hello");

        let end = serde_json::to_value(LogMessage::End { reason: "Head limit reached (10 lines)".to_string() }).unwrap();
        assert_eq!(end["type"], "LOG_END");
        assert_eq!(end["reason"], "Head limit reached (10 lines)");

        let error = serde_json::to_value(LogMessage::Error { error: "boom".to_string() }).unwrap();
        assert_eq!(error["type"], "LOG_ERROR");
    }
}
