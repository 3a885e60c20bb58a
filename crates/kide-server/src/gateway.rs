//! SessionGateway (C8, §4.8): the resource-event duplex endpoint. Parses the namespace/type
//! filter, registers with the resource hub, writes the filtered snapshot directly to the wire,
//! then runs the writer/reader loop pair described in §4.8's state machine.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use kide_core::events::ResourceEvent;
use kide_hub::Filter;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct ResourceSessionQuery {
    namespace: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// `GET /ws?namespace=<opt>&type=<opt>` (§6).
pub async fn resource_ws(ws: WebSocketUpgrade, State(state): State<ServerState>, Query(query): Query<ResourceSessionQuery>) -> impl IntoResponse {
    let filter = Filter::from_query(query.namespace.as_deref(), query.kind.as_deref());
    ws.on_upgrade(move |socket| handle_resource_session(socket, state, filter))
}

#[instrument(skip_all)]
async fn handle_resource_session(socket: WebSocket, state: ServerState, filter: Filter) {
    let mut session = state.resource_hub.register(filter.clone());
    state.session_connected();
    debug!(session = %session.id, "resource session attached");

    let (mut sink, mut stream) = socket.split();

    // SNAPSHOT_SENDING (§4.8): write the filtered snapshot directly to the wire before the
    // session's queued events can arrive, so a large snapshot never has to pass through (and
    // potentially overflow) the bounded per-session queue (§4.6, "Snapshot contract").
    let snapshot = match state.controller.cache().await {
        Some(cache) => cache.list(),
        None => Vec::new(),
    };
    for resource in snapshot.into_iter().filter(|resource| filter.matches(resource)) {
        let event = ResourceEvent::Added { resource };
        if send_json(&mut sink, &event).await.is_err() {
            state.resource_hub.unregister(session.id);
            state.session_disconnected();
            return;
        }
    }

    // LIVE: drain both queues and the client's inbound frames until one side closes.
    loop {
        tokio::select! {
            event = session.resource_rx.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            event = session.sync_rx.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            frame = stream.next() => {
                // Resource sessions don't act on inbound frames; reading (and discarding) is
                // only how the reader loop notices the client disconnected (§4.8).
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.resource_hub.unregister(session.id);
    state.session_disconnected();
    debug!(session = %session.id, "resource session closed");
}

async fn send_json<T: serde::Serialize>(sink: &mut SplitSink<WebSocket, Message>, value: &T) -> Result<(), axum::Error> {
    let text = serde_json::to_string(value).unwrap_or_default();
    sink.send(Message::Text(text.into())).await
}
