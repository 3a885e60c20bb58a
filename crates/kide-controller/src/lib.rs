//! Per-context cluster lifecycle (C5, `AppController`): builds a client and watch graph for one
//! kubeconfig context at a time and exposes the atomic context-switch sequence from §4.5.

mod controller;
mod error;
mod kubeconfig;

pub use controller::{AppController, SessionDisconnector};
pub use error::{Error, Result};
pub use kubeconfig::{ContextInfo, build_client, list_contexts};
