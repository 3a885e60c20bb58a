use k8s_openapi::api::apps::v1::ReplicaSet;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Resource, Status, resource_id},
};

use super::{common_meta, owned_by_from_references, replica_health, seed_reverse_edges, to_yaml};

const KIND: &str = "ReplicaSet";

pub fn transform_replica_set(replica_set: &ReplicaSet, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &replica_set.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let status = replica_set.status.as_ref();
    let desired = status
        .map(|s| s.replicas)
        .or(replica_set.spec.as_ref().and_then(|s| s.replicas))
        .unwrap_or(0);
    let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);

    let phase = if ready == desired && desired > 0 {
        "Available"
    } else {
        "Progressing"
    };
    let health = replica_health(ready, desired);

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);

    let yaml = to_yaml(KIND, &meta.name, replica_set)?;

    Ok(Resource {
        id,
        kind: KIND.to_string(),
        name: meta.name,
        namespace: meta.namespace,
        status: Status {
            phase: phase.to_string(),
            ready: format!("{ready}/{desired}"),
            message: String::new(),
        },
        health,
        relationships,
        labels: meta.labels,
        annotations: meta.annotations,
        created_at: meta.created_at,
        spec: serde_json::to_value(&replica_set.spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::apps::v1::{ReplicaSetSpec, ReplicaSetStatus},
        apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference},
    };

    use super::*;

    #[test]
    fn owner_reference_becomes_the_owned_by_edge() {
        let replica_set = ReplicaSet {
            metadata: ObjectMeta {
                name: Some("web-abc123".to_string()),
                namespace: Some("ns1".to_string()),
                owner_references: Some(vec![OwnerReference {
                    kind: "Deployment".to_string(),
                    name: "web".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            spec: Some(ReplicaSetSpec {
                replicas: Some(2),
                ..Default::default()
            }),
            status: Some(ReplicaSetStatus {
                replicas: 2,
                ready_replicas: Some(2),
                ..Default::default()
            }),
        };

        let cache = ResourceCache::new();
        let resource = transform_replica_set(&replica_set, &cache).expect("transforms");

        assert_eq!(resource.relationships.owned_by.len(), 1);
        assert_eq!(resource.relationships.owned_by[0].id, resource_id("Deployment", "ns1", "web"));
        assert_eq!(resource.status.phase, "Available");
    }
}
