use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level errors surfaced while bootstrapping or running the HTTP surface (§7,
/// "Configuration"/"Protocol" rows).
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to bind to {addr}"))]
    Bind { addr: std::net::SocketAddr, source: std::io::Error },

    #[snafu(display("server failed while serving connections"))]
    Serve { source: std::io::Error },

    #[snafu(display("failed to start the initial cluster connection"))]
    InitialStart { source: kide_controller::Error },

    #[snafu(display("resource {id:?} was not found"))]
    ResourceNotFound { id: String },

    #[snafu(display("failed to list kubeconfig contexts"))]
    ListContexts { source: kide_controller::Error },

    #[snafu(display("context switch failed"))]
    SwitchContext { source: kide_controller::Error },

    #[snafu(display("query parameter {name:?} is required"))]
    MissingQueryParam { name: &'static str },
}

/// Maps domain errors to HTTP status codes, matching the way the operator framework's webhook
/// layer turns `WebhookError` into a response (§10.3).
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Error::MissingQueryParam { .. } => StatusCode::BAD_REQUEST,
            Error::Bind { .. } | Error::Serve { .. } | Error::InitialStart { .. } | Error::ListContexts { .. } | Error::SwitchContext { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
