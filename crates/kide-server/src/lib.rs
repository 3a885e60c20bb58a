//! Process bootstrap and HTTP surface (C8 [`gateway`]/[`log_gateway`], C9 [`rest`]): wires the
//! watch graph (`kide-watch`), the controller (`kide-controller`) and the hubs (`kide-hub`) into
//! a running Axum server (§6).

mod cli;
mod error;
mod gateway;
mod log_gateway;
mod rest;
mod router;
mod state;
mod telemetry;

pub use cli::Cli;
pub use error::{Error, Result};
pub use telemetry::init as init_telemetry;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use kide_controller::AppController;
use kide_hub::{Hubs, LogHub, ResourceHub};
use snafu::ResultExt as _;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::{
    error::{BindSnafu, InitialStartSnafu, ServeSnafu},
    state::ServerState,
};

/// Builds the watch graph for the initial context, then serves the HTTP surface until a shutdown
/// signal arrives (§6, "Graceful shutdown on SIGINT/SIGTERM").
pub async fn run(cli: Cli) -> Result<()> {
    let (resource_hub, resource_intake, sync_intake) = ResourceHub::spawn();
    let log_hub = LogHub::spawn();
    let hubs = Hubs::new(resource_hub.clone(), log_hub.clone());

    let controller = Arc::new(AppController::new(
        resource_intake,
        sync_intake,
        hubs,
        Duration::from_secs(30),
        cli.kubeconfig.clone(),
    ));

    info!("starting initial cluster connection");
    controller.start(None).await.context(InitialStartSnafu)?;
    info!(context = %controller.current_context().await, "cluster watch graph synced, serving requests");

    let state = ServerState::new(controller, resource_hub, log_hub);
    let router = router::build(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = TcpListener::bind(addr).await.context(BindSnafu { addr })?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(ServeSnafu)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("received SIGINT, shutting down"),
        () = terminate => warn!("received SIGTERM, shutting down"),
    }
}
