//! Canonical resource model, in-memory cache and relationship engine.
//!
//! This crate implements C1 ([`cache::ResourceCache`]), C2 ([`transformers`]) and C3
//! ([`relationships::RelationshipResolver`]): everything needed to turn a stream of native
//! Kubernetes objects into a consistent, queryable graph of [`model::Resource`]s. It has no
//! knowledge of watches, HTTP, or sessions — those live in `kide-watch`, `kide-controller` and
//! `kide-hub`/`kide-server`.

pub mod cache;
pub mod error;
pub mod events;
pub mod model;
pub mod relationships;
pub mod transformers;

pub use cache::ResourceCache;
pub use error::{Error, Result};
pub use events::{ResourceEvent, ResourceEventKind, SyncStatusEvent};
pub use model::{ForwardRelation, Health, Relationships, Resource, ResourceRef, Status};
pub use relationships::RelationshipResolver;
