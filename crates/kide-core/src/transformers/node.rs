use k8s_openapi::api::core::v1::Node;

use crate::{
    cache::ResourceCache,
    error::Result,
    model::{Health, Resource, Status, resource_id},
};

use super::{common_meta, seed_reverse_edges, to_yaml};

const KIND: &str = "Node";

pub fn transform_node(node: &Node, cache: &ResourceCache) -> Result<Resource> {
    let meta = common_meta(KIND, &node.metadata)?;
    let id = resource_id(KIND, "", &meta.name);

    let unschedulable = node.spec.as_ref().and_then(|s| s.unschedulable).unwrap_or(false);
    let conditions = node.status.as_ref().and_then(|s| s.conditions.as_ref());

    let ready_condition = conditions
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map(|c| c.status.as_str());

    let under_pressure = conditions.is_some_and(|conditions| {
        conditions.iter().any(|c| {
            matches!(c.type_.as_str(), "MemoryPressure" | "DiskPressure" | "PIDPressure") && c.status == "True"
        })
    });

    let phase = match (unschedulable, ready_condition) {
        (true, _) => "Unschedulable",
        (false, Some("True")) => "Ready",
        (false, Some("False")) => "NotReady",
        (false, Some(_) | None) => "Unknown",
    };

    let health = if phase == "NotReady" {
        Health::Error
    } else if phase == "Unschedulable" || under_pressure {
        Health::Warning
    } else if phase == "Ready" {
        Health::Healthy
    } else {
        Health::Unknown
    };

    // Nodes are cluster-scoped and have no owner references in practice, but `seed_reverse_edges`
    // still picks up e.g. Pods `scheduledOn` this node.
    let relationships = seed_reverse_edges(cache, &id);

    let yaml = to_yaml(KIND, &meta.name, node)?;

    Ok(Resource {
        id,
        kind: KIND.to_string(),
        name: meta.name,
        namespace: String::new(),
        status: Status {
            phase: phase.to_string(),
            ready: String::new(),
            message: String::new(),
        },
        health,
        relationships,
        labels: meta.labels,
        annotations: meta.annotations,
        created_at: meta.created_at,
        spec: serde_json::to_value(&node.spec).unwrap_or(serde_json::Value::Null),
        yaml,
    })
}

#[cfg(test)]
mod tests {
    use k8s_openapi::{
        api::core::v1::{NodeCondition, NodeSpec, NodeStatus},
        apimachinery::pkg::apis::meta::v1::ObjectMeta,
    };
    use rstest::rstest;

    use super::*;

    fn node_with(unschedulable: bool, conditions: Vec<NodeCondition>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("worker-1".to_string()),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                unschedulable: Some(unschedulable),
                ..Default::default()
            }),
            status: Some(NodeStatus {
                conditions: Some(conditions),
                ..Default::default()
            }),
        }
    }

    fn condition(type_: &str, status: &str) -> NodeCondition {
        NodeCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(false, vec![condition("Ready", "True")], "Ready", Health::Healthy)]
    #[case(false, vec![condition("Ready", "False")], "NotReady", Health::Error)]
    #[case(true, vec![condition("Ready", "True")], "Unschedulable", Health::Warning)]
    #[case(false, vec![], "Unknown", Health::Unknown)]
    fn node_phase_and_health(
        #[case] unschedulable: bool,
        #[case] conditions: Vec<NodeCondition>,
        #[case] expected_phase: &str,
        #[case] expected_health: Health,
    ) {
        let cache = ResourceCache::new();
        let node = node_with(unschedulable, conditions);
        let resource = transform_node(&node, &cache).expect("transforms");
        assert_eq!(resource.status.phase, expected_phase);
        assert_eq!(resource.health, expected_health);
        assert_eq!(resource.namespace, "");
    }

    #[test]
    fn memory_pressure_is_a_warning_even_when_ready() {
        let cache = ResourceCache::new();
        let node = node_with(false, vec![condition("Ready", "True"), condition("MemoryPressure", "True")]);
        let resource = transform_node(&node, &cache).expect("transforms");
        assert_eq!(resource.health, Health::Warning);
    }
}
