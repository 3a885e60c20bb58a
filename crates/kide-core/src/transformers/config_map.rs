use k8s_openapi::api::core::v1::ConfigMap;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, Status, resource_id},
};

use super::{common_meta, owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "ConfigMap";

pub fn transform_config_map(config_map: &ConfigMap, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &config_map.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);

    let yaml = to_yaml(KIND, &meta.name, config_map)?;

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
        spec: serde_json::json!({ "keys": config_map.data.clone().unwrap_or_default().keys().collect::<Vec<_>>() }),
        yaml,
    })
}
