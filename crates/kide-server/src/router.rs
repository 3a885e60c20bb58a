//! Builds the Axum [`Router`] wiring the REST handlers (C9) and the two duplex gateways (C8)
//! onto shared [`ServerState`] (§6, "HTTP surface").

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{gateway, log_gateway, rest, state::ServerState};

/// The embedded static UI is explicitly out of scope (§1); `/` and other static paths are left
/// as a placeholder so the process still answers on them instead of 404ing outright.
async fn index() -> &'static str {
    "kide resource graph engine: UI assets are not bundled in this build"
}

pub fn build(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(rest::health))
        .route("/api/namespaces", get(rest::namespaces))
        .route("/api/stats", get(rest::stats))
        .route("/api/resource", get(rest::resource))
        .route("/api/contexts", get(rest::contexts))
        .route("/api/context/current", get(rest::current_context))
        .route("/api/context/switch", post(rest::switch_context))
        .route("/api/sync/status", get(rest::sync_status))
        .route("/ws", get(gateway::resource_ws))
        .route("/ws/logs", get(log_gateway::logs_ws))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use kide_controller::AppController;
    use kide_hub::{Hubs, LogHub, ResourceHub};
    use serde_json::Value;
    use tower::ServiceExt as _;

    use super::*;

    /// A state with no cluster ever started, exercising every handler's "nothing connected yet"
    /// branch without needing a real `kube::Client`.
    fn test_state() -> ServerState {
        let (resource_hub, resource_intake, sync_intake) = ResourceHub::spawn();
        let log_hub = LogHub::spawn();
        let hubs = Hubs::new(resource_hub.clone(), log_hub.clone());
        let controller = Arc::new(AppController::new(resource_intake, sync_intake, hubs, Duration::from_secs(30), None));
        ServerState::new(controller, resource_hub, log_hub)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("valid request")
    }

    #[tokio::test]
    async fn health_reports_zero_clients_and_resources_before_any_cluster_starts() {
        let response = build(test_state()).oneshot(get("/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["clients"], 0);
        assert_eq!(body["resources"], 0);
        assert_eq!(body["context"], "");
    }

    #[tokio::test]
    async fn namespaces_is_empty_before_any_cluster_starts() {
        let response = build(test_state()).oneshot(get("/api/namespaces")).await.expect("response");
        let body = body_json(response).await;
        assert_eq!(body["namespaces"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn resource_lookup_without_an_id_is_a_bad_request() {
        let response = build(test_state()).oneshot(get("/api/resource")).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resource_lookup_for_an_unknown_id_is_not_found() {
        let response = build(test_state()).oneshot(get("/api/resource?id=Pod:default:missing")).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn switch_context_without_a_context_is_a_bad_request() {
        let response = build(test_state())
            .oneshot(Request::builder().method("POST").uri("/api/context/switch").body(Body::empty()).expect("valid request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sync_status_defaults_to_syncing_before_any_broadcast_arrives() {
        let response = build(test_state()).oneshot(get("/api/sync/status")).await.expect("response");
        let body = body_json(response).await;
        assert_eq!(body["type"], "SYNC_STATUS");
        assert_eq!(body["syncing"], true);
        assert_eq!(body["synced"], false);
    }
}
