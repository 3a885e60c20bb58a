use k8s_openapi::api::core::v1::Secret;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, Status, resource_id},
};

use super::{common_meta, owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "Secret";

/// Surfaces only `type` (P7: "A Secret's surfaced `spec` never contains key material"). The
/// serialized `yaml` would otherwise leak `data`/`stringData`, so it is rebuilt from metadata and
/// `type` alone rather than serializing the native object directly.
pub fn transform_secret(secret: &Secret, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &secret.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let secret_type = secret.type_.clone().unwrap_or_else(|| "Opaque".to_string());

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);

    let redacted = RedactedSecret {
        api_version: "v1".to_string(),
        kind: "Secret".to_string(),
        metadata: RedactedMeta {
            name: meta.name.clone(),
            namespace: meta.namespace.clone(),
        },
        type_: secret_type.clone(),
    };
    let yaml = to_yaml(KIND, &meta.name, &redacted)?;

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
        spec: serde_json::json!({ "type": secret_type }),
        yaml,
    })
}

#[derive(serde::Serialize)]
struct RedactedSecret {
    #[serde(rename = "apiVersion")]
    api_version: String,
    kind: String,
    metadata: RedactedMeta,
    #[serde(rename = "type")]
    type_: String,
}

#[derive(serde::Serialize)]
struct RedactedMeta {
    name: String,
    namespace: String,
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    use super::*;
    use crate::cache::ResourceCache;

    #[test]
    fn secret_spec_never_contains_data() {
        let mut secret = Secret {
            metadata: ObjectMeta {
                name: Some("db-creds".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            type_: Some("kubernetes.io/basic-auth".to_string()),
            ..Default::default()
        };
        secret.data = Some(std::collections::BTreeMap::from([(
            "password".to_string(),
            k8s_openapi::ByteString(b"hunter2".to_vec()),
        )]));

        let cache = ResourceCache::new();
        let resource = transform_secret(&secret, &cache).expect("transforms");

        assert_eq!(resource.spec, serde_json::json!({ "type": "kubernetes.io/basic-auth" }));
        assert!(!resource.yaml.contains("hunter2"));
        assert!(!resource.yaml.contains("password"));
    }
}
