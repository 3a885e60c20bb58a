//! The pod log duplex endpoint (C7/C8, §4.7, §4.8): parses log options, opens a [`LogHub`]
//! session against the active cluster's client, and streams `LOG_LINE`/`LOG_END`/`LOG_ERROR`
//! frames until the client disconnects.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use kide_hub::{LogKey, LogMessage, LogOptions};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::state::ServerState;

/// `GET /ws/logs?namespace=&pod=&container=&follow=&tailLines=&sinceSeconds=&headLines=` (§6).
#[derive(Debug, Deserialize)]
pub struct LogSessionQuery {
    namespace: String,
    pod: String,
    container: String,
    #[serde(default)]
    follow: bool,
    #[serde(rename = "tailLines")]
    tail_lines: Option<i64>,
    #[serde(rename = "sinceSeconds")]
    since_seconds: Option<i64>,
    #[serde(rename = "headLines")]
    head_lines: Option<u64>,
}

pub async fn logs_ws(ws: WebSocketUpgrade, State(state): State<ServerState>, Query(query): Query<LogSessionQuery>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_log_session(socket, state, query))
}

#[instrument(skip_all, fields(namespace = %query.namespace, pod = %query.pod, container = %query.container))]
async fn handle_log_session(socket: WebSocket, state: ServerState, query: LogSessionQuery) {
    state.session_connected();
    let (mut sink, mut stream) = socket.split();

    let Some(client) = state.controller.client().await else {
        let _ = send_json(&mut sink, &LogMessage::Error { error: "no active cluster connection".to_string() }).await;
        state.session_disconnected();
        return;
    };

    let key = LogKey { namespace: query.namespace, pod: query.pod, container: query.container };
    let options = LogOptions {
        follow: query.follow,
        tail_lines: query.tail_lines,
        since_seconds: query.since_seconds,
        head_lines: query.head_lines,
    };

    let (id, mut rx) = state.log_hub.open(client, key, options);
    debug!(session = %id, "log session attached");

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(message) => {
                        let is_terminal = matches!(message, LogMessage::End { .. } | LogMessage::Error { .. });
                        if send_json(&mut sink, &message).await.is_err() || is_terminal {
                            break;
                        }
                    }
                    None => break,
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // Cancellation (§4.7, §5): closing the session closes the reader promptly.
    state.log_hub.close(id);
    state.session_disconnected();
    debug!(session = %id, "log session closed");
}

async fn send_json<T: serde::Serialize>(sink: &mut SplitSink<WebSocket, Message>, value: &T) -> Result<(), axum::Error> {
    let text = serde_json::to_string(value).unwrap_or_default();
    sink.send(Message::Text(text.into())).await
}
