//! C2: pure functions that normalize native Kubernetes objects into the canonical [`Resource`]
//! model (§4.2). Each transformer is free of side effects except for the one read-only pass over
//! the cache needed to fill in reverse edges via [`RelationshipResolver::find_reverse`].
//!
//! Transformers are modeled as a closed set of functions dispatched by kind, plus one generic path
//! for CRDs — a registry keyed by kind rather than an inheritance hierarchy (§9, "Dynamic dispatch
//! over heterogeneous kinds").

mod config_map;
mod custom;
mod deployment;
mod ingress;
mod node;
mod pod;
mod replica_set;
mod secret;
mod service;

pub use config_map::transform_config_map;
pub use custom::transform_custom_resource;
pub use deployment::transform_deployment;
pub use ingress::transform_ingress;
pub use node::transform_node;
pub use pod::transform_pod;
pub use replica_set::transform_replica_set;
pub use secret::transform_secret;
pub use service::transform_service;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
use serde::Serialize;

use crate::{
    cache::ResourceCache,
    error::{MissingNameSnafu, Result, SerializeYamlSnafu},
    model::{ForwardRelation, Health, Relationships, ResourceRef},
    relationships::RelationshipResolver,
};
use snafu::OptionExt as _;

/// Common fields every native Kubernetes object exposes via `ObjectMeta`, extracted once so each
/// transformer doesn't repeat the same `.metadata.name.context(...)` dance.
pub(crate) struct CommonMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub owner_references: Vec<OwnerReference>,
}

pub(crate) fn common_meta(
    kind: &'static str,
    meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta,
) -> Result<CommonMeta> {
    let name = meta.name.clone().context(MissingNameSnafu { kind })?;
    Ok(CommonMeta {
        name,
        namespace: meta.namespace.clone().unwrap_or_default(),
        labels: meta.labels.clone().unwrap_or_default().into_iter().collect(),
        annotations: meta.annotations.clone().unwrap_or_default().into_iter().collect(),
        created_at: meta
            .creation_timestamp
            .as_ref()
            .map(|Time(t)| *t)
            .unwrap_or_else(Utc::now),
        owner_references: meta.owner_references.clone().unwrap_or_default(),
    })
}

/// Builds the `ownedBy` edge from `ObjectMeta.ownerReferences`, resolved against the same
/// namespace as the owned object (owner references are always same-namespace or cluster-scoped
/// for the kinds this engine supports).
pub(crate) fn owned_by_from_references(owner_references: &[OwnerReference], namespace: &str) -> Vec<ResourceRef> {
    owner_references
        .iter()
        .map(|owner| ResourceRef::new(owner.kind.clone(), namespace.to_string(), owner.name.clone()))
        .collect()
}

/// Stable YAML serialization used to populate [`crate::model::Resource::yaml`]. The exact
/// formatting is contractually opaque to clients (§4.2).
pub(crate) fn to_yaml<T: Serialize>(kind: &'static str, name: &str, value: &T) -> Result<String> {
    serde_yaml::to_string(value).context(SerializeYamlSnafu { kind, name: name.to_string() })
}

/// Implements the "all selector keys must be present in pod labels with equal values" rule from
/// §4.2. An empty selector matches nothing.
pub(crate) fn labels_match_selector(labels: &BTreeMap<String, String>, selector: &BTreeMap<String, String>) -> bool {
    if selector.is_empty() {
        return false;
    }
    selector
        .iter()
        .all(|(key, value)| labels.get(key) == Some(value))
}

pub(crate) fn dedup_by_id(mut refs: Vec<ResourceRef>) -> Vec<ResourceRef> {
    let mut deduped: Vec<ResourceRef> = Vec::with_capacity(refs.len());
    refs.drain(..).for_each(|r| Relationships::push_unique(&mut deduped, r));
    deduped
}

/// Seeds a fresh [`Relationships`] with every reverse edge ([`RelationshipResolver::find_reverse`])
/// pointing at `id`. Transformers start from this and then fill in their own forward edges,
/// matching the contract that C3's reverse lookup is "used by transformers to fill `owns`,
/// `usedBy`, `exposedBy`, `routedBy`, `schedules`" (§4.3).
pub(crate) fn seed_reverse_edges(cache: &ResourceCache, id: &str) -> Relationships {
    let resolver = RelationshipResolver::new(cache);
    let mut relationships = Relationships::default();
    for relation in ForwardRelation::ALL {
        let target = relationships.reverse_mut(relation);
        for reference in resolver.find_reverse(id, relation) {
            Relationships::push_unique(target, reference);
        }
    }
    relationships
}

/// The replica-count health rule shared by Deployment and ReplicaSet (§4.2): `error` when nothing
/// is ready, `warning` on partial readiness, `healthy` once `ready == desired`.
pub(crate) fn replica_health(ready: i32, desired: i32) -> Health {
    if ready == 0 {
        Health::Error
    } else if ready < desired {
        Health::Warning
    } else {
        Health::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[rstest]
    #[case(&[], &[("app", "web")], false)]
    #[case(&[("app", "web")], &[], false)]
    #[case(&[("app", "web")], &[("app", "web")], true)]
    #[case(&[("app", "web")], &[("app", "api")], false)]
    #[case(&[("app", "web"), ("tier", "frontend")], &[("app", "web")], true)]
    fn selector_matching(#[case] labels: &[(&str, &str)], #[case] selector: &[(&str, &str)], #[case] expected: bool) {
        assert_eq!(labels_match_selector(&map(labels), &map(selector)), expected);
    }

    #[rstest]
    #[case(0, 3, Health::Error)]
    #[case(1, 3, Health::Warning)]
    #[case(3, 3, Health::Healthy)]
    fn replica_health_rule(#[case] ready: i32, #[case] desired: i32, #[case] expected: Health) {
        assert_eq!(replica_health(ready, desired), expected);
    }
}
