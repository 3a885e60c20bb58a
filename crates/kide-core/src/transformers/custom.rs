use kube::core::DynamicObject;
use snafu::OptionExt as _;

use crate::{
    cache::ResourceCache,
    error::{MissingApiVersionSnafu, MissingNameSnafu, Result},
    model::{Health, Resource, Status, resource_id},
};

use super::{owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "CustomResource";

/// The generic path for CRD-discovered kinds (§9): reads only the well-known top-level fields
/// (`status.phase`, a `Ready` condition) and surfaces the rest of the object verbatim as opaque
/// `spec`. Health is always [`Health::Unknown`] — richer derivation is deliberately deferred.
pub fn transform_custom_resource(object: &DynamicObject, cache: &ResourceCache) -> Result<Resource> {
    let name = object.metadata.name.clone().context(MissingNameSnafu { kind: KIND })?;
    let namespace = object.metadata.namespace.clone().unwrap_or_default();

    let group = group_from_api_version(object)?;
    let kind_label = format!("{}.{group}", object.types.as_ref().map(|t| t.kind.as_str()).unwrap_or(KIND));
    let id = resource_id(&kind_label, &namespace, &name);

    let status_value = object.data.get("status");
    let phase = status_value
        .and_then(|s| s.get("phase"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let ready = status_value
        .and_then(|s| s.get("conditions"))
        .and_then(serde_json::Value::as_array)
        .and_then(|conditions| {
            conditions.iter().find(|c| c.get("type").and_then(serde_json::Value::as_str) == Some("Ready"))
        })
        .and_then(|condition| condition.get("status"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let owner_references = object.metadata.owner_references.clone().unwrap_or_default();

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&owner_references, &namespace);

    let labels = object.metadata.labels.clone().unwrap_or_default().into_iter().collect();
    let annotations = object.metadata.annotations.clone().unwrap_or_default().into_iter().collect();
    let created_at = object
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|t| t.0)
        .unwrap_or_else(chrono::Utc::now);

    let yaml = to_yaml(KIND, &name, object)?;

    Ok(Resource {
        id,
        kind: kind_label,
        name,
        namespace,
        status: Status { phase, ready, message: String::new() },
        health: Health::Unknown,
        relationships,
        labels,
        annotations,
        created_at,
        spec: object.data.clone(),
        yaml,
    })
}

fn group_from_api_version(object: &DynamicObject) -> Result<String> {
    let api_version = object
        .types
        .as_ref()
        .map(|t| t.api_version.clone())
        .context(MissingApiVersionSnafu { kind: KIND.to_string() })?;
    Ok(api_version.split_once('/').map_or_else(|| "".to_string(), |(group, _version)| group.to_string()))
}

#[cfg(test)]
mod tests {
    use kube::core::{ObjectMeta, TypeMeta};

    use super::*;

    fn sample_object() -> DynamicObject {
        DynamicObject {
            types: Some(TypeMeta {
                api_version: "example.com/v1".to_string(),
                kind: "Widget".to_string(),
            }),
            metadata: ObjectMeta {
                name: Some("my-widget".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            data: serde_json::json!({
                "status": {
                    "phase": "Running",
                    "conditions": [{"type": "Ready", "status": "True"}],
                }
            }),
        }
    }

    #[test]
    fn custom_resource_type_label_includes_group() {
        let cache = ResourceCache::new();
        let resource = transform_custom_resource(&sample_object(), &cache).expect("transforms");
        assert_eq!(resource.kind, "Widget.example.com");
        assert_eq!(resource.status.phase, "Running");
        assert_eq!(resource.status.ready, "True");
        assert_eq!(resource.health, Health::Unknown);
    }
}
