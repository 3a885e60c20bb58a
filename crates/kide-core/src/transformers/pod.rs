use k8s_openapi::api::core::v1::Pod;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, ResourceRef, Status, resource_id},
};

use super::{common_meta, dedup_by_id, owned_by_from_references, seed_reverse_edges, to_yaml};

const KIND: &str = "Pod";

const CRASH_REASONS: [&str; 3] = ["CrashLoopBackOff", "ImagePullBackOff", "ErrImagePull"];

pub fn transform_pod(pod: &Pod, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &pod.metadata)?;
    let id = resource_id(KIND, &meta.namespace, &meta.name);

    let status = pod.status.as_ref();
    let phase = status.and_then(|s| s.phase.clone()).unwrap_or_else(|| "Unknown".to_string());

    let container_statuses = status.and_then(|s| s.container_statuses.as_ref());
    let total = container_statuses.map_or(0, Vec::len);
    let ready_count = container_statuses
        .map(|statuses| statuses.iter().filter(|c| c.ready).count())
        .unwrap_or(0);
    let ready = format!("{ready_count}/{total}");

    let message = failure_message(status);
    let health = health_for(&phase, ready_count, total, container_statuses);

    let spec = pod.spec.as_ref();
    let depends_on = dedup_by_id(dependency_refs(spec, &meta.namespace));
    let scheduled_on = spec
        .and_then(|s| s.node_name.clone())
        .map(|node_name| vec![ResourceRef::new("Node", "", node_name)])
        .unwrap_or_default();

    let mut relationships = seed_reverse_edges(cache, &id);
    relationships.owned_by = owned_by_from_references(&meta.owner_references, &meta.namespace);
    relationships.depends_on = depends_on;
    relationships.scheduled_on = scheduled_on;

    let yaml = to_yaml(KIND, &meta.name, pod)?;

    Ok(Resource {
        id,
        kind: KIND.to_string(),
        name: meta.name,
        namespace: meta.namespace,
        status: Status { phase, ready, message },
        health,
        relationships,
        labels: meta.labels,
        annotations: meta.annotations,
        created_at: meta.created_at,
        spec: serde_json::to_value(spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}

fn failure_message(status: Option<&k8s_openapi::api::core::v1::PodStatus>) -> String {
    let Some(status) = status else { return String::new() };

    if let Some(statuses) = &status.container_statuses {
        for container in statuses {
            if let Some(waiting) = container.state.as_ref().and_then(|s| s.waiting.as_ref()) {
                if let Some(reason) = &waiting.reason {
                    return format!("{reason}: {}", waiting.message.clone().unwrap_or_default());
                }
            }
            if let Some(terminated) = container.state.as_ref().and_then(|s| s.terminated.as_ref()) {
                if terminated.exit_code != 0 {
                    return terminated
                        .reason
                        .clone()
                        .unwrap_or_else(|| format!("exit code {}", terminated.exit_code));
                }
            }
        }
    }

    if let Some(conditions) = &status.conditions {
        for condition in conditions {
            if condition.status == "False" {
                if let Some(message) = &condition.message {
                    return message.clone();
                }
            }
        }
    }

    String::new()
}

fn health_for(
    phase: &str,
    ready_count: usize,
    total: usize,
    container_statuses: Option<&Vec<k8s_openapi::api::core::v1::ContainerStatus>>,
) -> Health {
    if phase == "Failed" {
        return Health::Error;
    }

    if let Some(statuses) = container_statuses {
        for container in statuses {
            if let Some(waiting) = container.state.as_ref().and_then(|s| s.waiting.as_ref()) {
                if waiting.reason.as_deref().is_some_and(|reason| CRASH_REASONS.contains(&reason)) {
                    return Health::Error;
                }
            }
            if let Some(terminated) = container.state.as_ref().and_then(|s| s.terminated.as_ref()) {
                if terminated.exit_code != 0 {
                    return Health::Error;
                }
            }
        }
    }

    match phase {
        "Running" if total > 0 && ready_count == total => Health::Healthy,
        "Pending" => Health::Warning,
        _ => Health::Unknown,
    }
}

fn dependency_refs(spec: Option<&k8s_openapi::api::core::v1::PodSpec>, namespace: &str) -> Vec<ResourceRef> {
    let Some(spec) = spec else { return Vec::new() };
    let mut refs = Vec::new();

    if let Some(volumes) = &spec.volumes {
        for volume in volumes {
            if let Some(config_map) = &volume.config_map {
                if let Some(name) = &config_map.name {
                    refs.push(ResourceRef::new("ConfigMap", namespace.to_string(), name.clone()));
                }
            }
            if let Some(secret) = &volume.secret {
                if let Some(name) = &secret.secret_name {
                    refs.push(ResourceRef::new("Secret", namespace.to_string(), name.clone()));
                }
            }
            if let Some(projected) = &volume.projected {
                if let Some(sources) = &projected.sources {
                    for source in sources {
                        if let Some(config_map) = &source.config_map {
                            if let Some(name) = &config_map.name {
                                refs.push(ResourceRef::new("ConfigMap", namespace.to_string(), name.clone()));
                            }
                        }
                        if let Some(secret) = &source.secret {
                            if let Some(name) = &secret.name {
                                refs.push(ResourceRef::new("Secret", namespace.to_string(), name.clone()));
                            }
                        }
                    }
                }
            }
        }
    }

    {
        for container in spec.containers.iter().chain(spec.init_containers.iter().flatten()) {
            if let Some(env_from) = &container.env_from {
                for source in env_from {
                    if let Some(config_map) = &source.config_map_ref {
                        if let Some(name) = &config_map.name {
                            refs.push(ResourceRef::new("ConfigMap", namespace.to_string(), name.clone()));
                        }
                    }
                    if let Some(secret) = &source.secret_ref {
                        if let Some(name) = &secret.name {
                            refs.push(ResourceRef::new("Secret", namespace.to_string(), name.clone()));
                        }
                    }
                }
            }
            if let Some(env) = &container.env {
                for var in env {
                    let Some(value_from) = &var.value_from else { continue };
                    if let Some(config_map) = &value_from.config_map_key_ref {
                        if let Some(name) = &config_map.name {
                            refs.push(ResourceRef::new("ConfigMap", namespace.to_string(), name.clone()));
                        }
                    }
                    if let Some(secret) = &value_from.secret_key_ref {
                        if let Some(name) = &secret.name {
                            refs.push(ResourceRef::new("Secret", namespace.to_string(), name.clone()));
                        }
                    }
                }
            }
        }
    }

    refs
}
