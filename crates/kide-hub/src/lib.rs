//! Broadcast fan-out (C6 [`ResourceHub`], C7 [`LogHub`]) serving many concurrent client sessions
//! from one shared watch graph (§1, §4.6, §4.7).

mod error;
mod filter;
mod log_hub;
mod resource_hub;

pub use error::{Error, Result};
pub use filter::Filter;
pub use log_hub::{LogHub, LogKey, LogMessage, LogOptions};
pub use resource_hub::{INTAKE_CAPACITY, RegisteredSession, ResourceHub, SESSION_QUEUE_CAPACITY};

use std::sync::Arc;

use kide_controller::SessionDisconnector;

/// Disconnects every session on both hubs, implementing [`SessionDisconnector`] for
/// [`kide_controller::AppController`] (§4.5, "SwitchContext").
pub struct Hubs {
    pub resources: ResourceHub,
    pub logs: LogHub,
}

impl Hubs {
    pub fn new(resources: ResourceHub, logs: LogHub) -> Arc<Self> {
        Arc::new(Self { resources, logs })
    }
}

#[async_trait::async_trait]
impl SessionDisconnector for Hubs {
    async fn disconnect_all(&self) {
        self.resources.disconnect_all();
        self.logs.disconnect_all();
    }
}
