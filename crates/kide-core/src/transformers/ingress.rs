use k8s_openapi::api::networking::v1::Ingress;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, ResourceRef, Status, resource_id},
};

use super::{common_meta, dedup_by_id, owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "Ingress";

pub fn transform_ingress(ingress: &Ingress, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &ingress.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let mut routes_to = Vec::new();
    if let Some(spec) = &ingress.spec {
        if let Some(backend) = &spec.default_backend {
            if let Some(service) = &backend.service {
                routes_to.push(ResourceRef::new("Service", meta.namespace.clone(), service.name.clone()));
            }
        }
        for rule in spec.rules.iter().flatten() {
            let Some(http) = rule.http.as_ref() else { continue };
            for path in &http.paths {
                if let Some(service) = &path.backend.service {
                    routes_to.push(ResourceRef::new("Service", meta.namespace.clone(), service.name.clone()));
                }
            }
        }
    }
    let routes_to = dedup_by_id(routes_to);

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);
    relationships.routes_to = routes_to;

    let yaml = to_yaml(KIND, &meta.name, ingress)?;

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
        spec: serde_json::to_value(&ingress.spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressServiceBackend, IngressSpec,
        },
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };

    use super::*;

    fn service_backend(name: &str) -> IngressBackend {
        IngressBackend {
            service: Some(IngressServiceBackend {
                name: name.to_string(),
                port: None,
            }),
            resource: None,
        }
    }

    #[test]
    fn default_backend_and_rule_backends_become_deduped_routes_to_edges() {
        let ingress = Ingress {
            metadata: ObjectMeta {
                name: Some("web-ingress".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec {
                default_backend: Some(service_backend("web-svc")),
                rules: Some(vec![IngressRule {
                    host: Some("example.com".to_string()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![
                            HTTPIngressPath {
                                path: Some("/".to_string()),
                                path_type: "Prefix".to_string(),
                                backend: service_backend("web-svc"),
                            },
                            HTTPIngressPath {
                                path: Some("/api".to_string()),
                                path_type: "Prefix".to_string(),
                                backend: service_backend("api-svc"),
                            },
                        ],
                    }),
                }]),
                ..Default::default()
            }),
            status: None,
        };

        let cache = ResourceCache::new();
        let resource = transform_ingress(&ingress, &cache).expect("transforms");

        assert_eq!(resource.relationships.routes_to.len(), 2);
        let ids: Vec<_> = resource.relationships.routes_to.iter().map(|r| r.id.clone()).collect();
        assert!(ids.contains(&resource_id("Service", "ns1", "web-svc")));
        assert!(ids.contains(&resource_id("Service", "ns1", "api-svc")));
        assert_eq!(resource.status.phase, "Active");
        assert_eq!(resource.health, Health::Healthy);
    }

    #[test]
    fn ingress_without_any_backend_has_no_routes() {
        let ingress = Ingress {
            metadata: ObjectMeta {
                name: Some("bare-ingress".to_string()),
                namespace: Some("ns1".to_string()),
                ..Default::default()
            },
            spec: Some(IngressSpec::default()),
            status: None,
        };

        let cache = ResourceCache::new();
        let resource = transform_ingress(&ingress, &cache).expect("transforms");
        assert!(resource.relationships.routes_to.is_empty());
    }
}
