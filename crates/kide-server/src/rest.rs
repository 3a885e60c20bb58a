//! RestAPI (C9, §4.9): synchronous point-in-time queries served from the cache and the
//! kubeconfig context store.

use std::collections::HashMap;

use axum::{Json, extract::Query, extract::State};
use serde::Serialize;
use serde_json::{Value, json};

use kide_controller::ContextInfo;
use kide_core::Resource;
use snafu::{OptionExt as _, ResultExt as _};

use crate::{
    error::{ListContextsSnafu, MissingQueryParamSnafu, ResourceNotFoundSnafu, Result, SwitchContextSnafu},
    state::ServerState,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    clients: usize,
    resources: usize,
    context: String,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let resources = match state.controller.cache().await {
        Some(cache) => cache.count(),
        None => 0,
    };
    Json(HealthResponse {
        status: "ok",
        clients: state.active_sessions(),
        resources,
        context: state.controller.current_context().await,
    })
}

#[derive(Debug, Serialize)]
pub struct NamespacesResponse {
    namespaces: Vec<String>,
}

pub async fn namespaces(State(state): State<ServerState>) -> Json<NamespacesResponse> {
    let namespaces = match state.controller.cache().await {
        Some(cache) => cache.namespaces(),
        None => Vec::new(),
    };
    Json(NamespacesResponse { namespaces })
}

#[derive(Debug, serde::Deserialize)]
pub struct StatsQuery {
    namespace: Option<String>,
}

/// `{total:int, <Kind>:int, ...}` (§6). Built as a bare JSON object so per-kind keys aren't
/// nested under a fixed schema, matching the wire shape in §6.
pub async fn stats(State(state): State<ServerState>, Query(query): Query<StatsQuery>) -> Json<Value> {
    let namespace = query.namespace.filter(|ns| !ns.is_empty() && !ns.eq_ignore_ascii_case("all"));
    let counts: HashMap<String, usize> = match state.controller.cache().await {
        Some(cache) => cache.counts(namespace.as_deref()),
        None => HashMap::from([("total".to_string(), 0)]),
    };
    Json(json!(counts))
}

#[derive(Debug, serde::Deserialize)]
pub struct ResourceQuery {
    id: Option<String>,
}

pub async fn resource(State(state): State<ServerState>, Query(query): Query<ResourceQuery>) -> Result<Json<Resource>> {
    let id = query.id.context(MissingQueryParamSnafu { name: "id" })?;
    let cache = state.controller.cache().await;
    let resource = cache
        .and_then(|cache| cache.get(&id))
        .context(ResourceNotFoundSnafu { id: id.clone() })?;
    Ok(Json(resource))
}

#[derive(Debug, Serialize)]
pub struct ContextsResponse {
    contexts: Vec<ContextInfo>,
}

pub async fn contexts(State(state): State<ServerState>) -> Result<Json<ContextsResponse>> {
    let contexts = state.controller.list_contexts().await.context(ListContextsSnafu)?;
    Ok(Json(ContextsResponse { contexts }))
}

#[derive(Debug, Serialize)]
pub struct CurrentContextResponse {
    context: String,
}

pub async fn current_context(State(state): State<ServerState>) -> Json<CurrentContextResponse> {
    Json(CurrentContextResponse { context: state.controller.current_context().await })
}

#[derive(Debug, serde::Deserialize)]
pub struct SwitchContextQuery {
    context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SwitchContextResponse {
    success: bool,
    context: String,
}

/// Triggers [`kide_controller::AppController::switch_context`] and returns once the switch has
/// completed (§4.9: "returns immediately on accept" — accepted here means the request that wins
/// the write lock; a concurrent switch already in flight is rejected per §4.5).
pub async fn switch_context(State(state): State<ServerState>, Query(query): Query<SwitchContextQuery>) -> Result<Json<SwitchContextResponse>> {
    let context = query.context.context(MissingQueryParamSnafu { name: "context" })?;
    state.controller.switch_context(context.clone()).await.context(SwitchContextSnafu)?;
    Ok(Json(SwitchContextResponse { success: true, context }))
}

pub async fn sync_status(State(state): State<ServerState>) -> Json<Value> {
    match state.sync_status().await {
        Some(status) => Json(serde_json::to_value(status).unwrap_or(Value::Null)),
        None => Json(json!({
            "type": "SYNC_STATUS",
            "syncing": true,
            "synced": false,
            "context": "",
        })),
    }
}
