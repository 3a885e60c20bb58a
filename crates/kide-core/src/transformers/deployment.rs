use k8s_openapi::api::apps::v1::Deployment;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Resource, Status, resource_id},
};

use super::{common_meta, owned_by_from_references, replica_health, seed_reverse_edges, to_yaml};

const KIND: &str = "Deployment";

pub fn transform_deployment(deployment: &Deployment, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &deployment.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let status = deployment.status.as_ref();
    let desired = status
        .and_then(|s| s.replicas)
        .or(deployment.spec.as_ref().and_then(|s| s.replicas))
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

    let yaml = to_yaml(KIND, &meta.name, deployment)?;

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
        spec: serde_json::to_value(&deployment.spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::apps::v1::{DeploymentSpec, DeploymentStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };
    use rstest::rstest;

    use super::*;
    use crate::model::Health;

    fn deployment_with(desired: i32, ready: i32) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some("web".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(desired),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                replicas: Some(desired),
                ready_replicas: Some(ready),
                ..Default::default()
            }),
        }
    }

    #[rstest]
    #[case(3, 3, "Available", Health::Healthy)]
    #[case(3, 1, "Progressing", Health::Warning)]
    #[case(3, 0, "Progressing", Health::Error)]
    fn phase_and_health_follow_replica_counts(
        #[case] desired: i32,
        #[case] ready: i32,
        #[case] expected_phase: &str,
        #[case] expected_health: Health,
    ) {
        let cache = ResourceCache::new();
        let resource = transform_deployment(&deployment_with(desired, ready), &cache).expect("transforms");
        assert_eq!(resource.status.phase, expected_phase);
        assert_eq!(resource.status.ready, format!("{ready}/{desired}"));
        assert_eq!(resource.health, expected_health);
    }
}
