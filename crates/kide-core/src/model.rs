//! The canonical [`Resource`] model and its typed relationship graph.
//!
//! Every Kubernetes object the watch layer observes is normalized into a [`Resource`] by a
//! transformer (see [`crate::transformers`]) before it ever reaches the cache. Nothing downstream
//! of this module ever looks at a native `k8s-openapi` type again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Builds the canonical `type:namespace:name` identifier (I1, I6).
///
/// Cluster-scoped resources pass an empty `namespace`, which yields the `type::name` form the
/// spec calls out explicitly.
pub fn resource_id(kind: &str, namespace: &str, name: &str) -> String {
    format!("{kind}:{namespace}:{name}")
}

/// A lightweight pointer to a [`Resource`], embedded in relationship edges.
///
/// `id` is always derived from `(type, namespace, name)` via [`resource_id`]; the three fields
/// are kept alongside it so that clients don't need to parse the id back apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub namespace: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let kind = kind.into();
        let namespace = namespace.into();
        let name = name.into();
        let id = resource_id(&kind, &namespace, &name);
        Self { id, kind, name, namespace }
    }

    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            kind: resource.kind.clone(),
            name: resource.name.clone(),
            namespace: resource.namespace.clone(),
        }
    }
}

/// One of the five reverse-paired relationship kinds, in the forward direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardRelation {
    OwnedBy,
    DependsOn,
    Exposes,
    RoutesTo,
    ScheduledOn,
}

impl ForwardRelation {
    pub const ALL: [ForwardRelation; 5] = [
        ForwardRelation::OwnedBy,
        ForwardRelation::DependsOn,
        ForwardRelation::Exposes,
        ForwardRelation::RoutesTo,
        ForwardRelation::ScheduledOn,
    ];

    /// The reverse edge name this forward relation is patched into (§4.3).
    pub const fn reverse_field(self) -> &'static str {
        match self {
            ForwardRelation::OwnedBy => "owns",
            ForwardRelation::DependsOn => "used_by",
            ForwardRelation::Exposes => "exposed_by",
            ForwardRelation::RoutesTo => "routed_by",
            ForwardRelation::ScheduledOn => "schedules",
        }
    }

    pub const fn forward_field(self) -> &'static str {
        match self {
            ForwardRelation::OwnedBy => "owned_by",
            ForwardRelation::DependsOn => "depends_on",
            ForwardRelation::Exposes => "exposes",
            ForwardRelation::RoutesTo => "routes_to",
            ForwardRelation::ScheduledOn => "scheduled_on",
        }
    }
}

/// The ten directional edges of the resource graph, organized as five reverse-pairs (§3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(rename = "ownedBy", default)]
    pub owned_by: Vec<ResourceRef>,
    #[serde(default)]
    pub owns: Vec<ResourceRef>,

    #[serde(rename = "dependsOn", default)]
    pub depends_on: Vec<ResourceRef>,
    #[serde(rename = "usedBy", default)]
    pub used_by: Vec<ResourceRef>,

    #[serde(default)]
    pub exposes: Vec<ResourceRef>,
    #[serde(rename = "exposedBy", default)]
    pub exposed_by: Vec<ResourceRef>,

    #[serde(rename = "routesTo", default)]
    pub routes_to: Vec<ResourceRef>,
    #[serde(rename = "routedBy", default)]
    pub routed_by: Vec<ResourceRef>,

    #[serde(rename = "scheduledOn", default)]
    pub scheduled_on: Vec<ResourceRef>,
    #[serde(default)]
    pub schedules: Vec<ResourceRef>,
}

impl Relationships {
    /// Returns the forward edge list for `relation`.
    pub fn forward(&self, relation: ForwardRelation) -> &[ResourceRef] {
        match relation {
            ForwardRelation::OwnedBy => &self.owned_by,
            ForwardRelation::DependsOn => &self.depends_on,
            ForwardRelation::Exposes => &self.exposes,
            ForwardRelation::RoutesTo => &self.routes_to,
            ForwardRelation::ScheduledOn => &self.scheduled_on,
        }
    }

    /// Returns the reverse edge list that corresponds to `relation`, mutably.
    pub fn reverse_mut(&mut self, relation: ForwardRelation) -> &mut Vec<ResourceRef> {
        match relation {
            ForwardRelation::OwnedBy => &mut self.owns,
            ForwardRelation::DependsOn => &mut self.used_by,
            ForwardRelation::Exposes => &mut self.exposed_by,
            ForwardRelation::RoutesTo => &mut self.routed_by,
            ForwardRelation::ScheduledOn => &mut self.schedules,
        }
    }

    /// Appends `reference` to `list` unless an entry with the same id is already present (I3).
    pub fn push_unique(list: &mut Vec<ResourceRef>, reference: ResourceRef) {
        if !list.iter().any(|existing| existing.id == reference.id) {
            list.push(reference);
        }
    }
}

/// Visual-only health classification, derived from type-specific status (§4.2, P6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Warning,
    Error,
    Unknown,
}

/// Type-specific status summary surfaced verbatim to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub phase: String,
    /// Conventionally `"X/Y"` for replica-style readiness; empty when not applicable.
    #[serde(default)]
    pub ready: String,
    #[serde(default)]
    pub message: String,
}

/// The canonical, uniform representation of a single Kubernetes object (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub status: Status,
    pub health: Health,
    pub relationships: Relationships,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub spec: serde_json::Value,
    pub yaml: String,
}

impl Resource {
    pub fn as_ref(&self) -> ResourceRef {
        ResourceRef::from_resource(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_uses_empty_namespace_for_cluster_scoped() {
        assert_eq!(resource_id("Node", "", "worker-1"), "Node::worker-1");
        assert_eq!(resource_id("Pod", "default", "web-0"), "Pod:default:web-0");
    }

    #[test]
    fn push_unique_deduplicates_by_id() {
        let mut list = Vec::new();
        Relationships::push_unique(&mut list, ResourceRef::new("Deployment", "ns", "d"));
        Relationships::push_unique(&mut list, ResourceRef::new("Deployment", "ns", "d"));
        assert_eq!(list.len(), 1);
    }
}
