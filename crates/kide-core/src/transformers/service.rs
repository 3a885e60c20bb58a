use k8s_openapi::api::core::v1::Service;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, ResourceRef, Status, resource_id},
};

use super::{common_meta, dedup_by_id, labels_match_selector, owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "Service";

pub fn transform_service(service: &Service, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &service.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let selector = service
        .spec
        .as_ref()
        .and_then(|s| s.selector.clone())
        .unwrap_or_default();

    let exposes = if selector.is_empty() {
        Vec::new()
    } else {
        dedup_by_id(
            cache
                .list_by_namespace(&meta.namespace)
                .into_iter()
                .filter(|candidate| candidate.kind == "Pod" && labels_match_selector(&candidate.labels, &selector))
                .map(|pod| ResourceRef::new(pod.kind, pod.namespace, pod.name))
                .collect(),
        )
    };

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);
    relationships.exposes = exposes;

    let yaml = to_yaml(KIND, &meta.name, service)?;

    Ok(Resource {
        id,
        kind: KIND.to_string(),
        name: meta.name,
        namespace: meta.namespace,
        status: Status {
            phase: "Active".to_string(),
            ready: String::new(),
            message: String::new(),
        },
        health: Health::Healthy,
        relationships,
        labels: meta.labels,
        annotations: meta.annotations,
        created_at: meta.created_at,
        spec: serde_json::to_value(&service.spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}
