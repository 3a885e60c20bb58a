//! The in-memory [`ResourceCache`] (C1): a thread-safe `id -> Resource` map with namespace and
//! type indexes, shared by the watcher, the relationship resolver, the REST API and the hub
//! snapshot writer.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::model::Resource;

/// Thread-safe mapping of resource id to [`Resource`].
///
/// Readers take the lock only for the duration of cloning out what they need; no lock is ever
/// held across a network write (§5, "Shared-resource policy"). Cloning a [`ResourceCache`] is
/// cheap and shares the same backing map, mirroring the `Arc<RwLock<_>>` reflector pattern used
/// throughout the Kubernetes client ecosystem.
#[derive(Clone, Default)]
pub struct ResourceCache {
    inner: Arc<RwLock<HashMap<String, Resource>>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the resource with the given id, if present.
    pub fn get(&self, id: &str) -> Option<Resource> {
        self.inner.read().get(id).cloned()
    }

    /// Inserts or replaces the resource (I4). Returns the previous value, if any.
    pub fn set(&self, resource: Resource) -> Option<Resource> {
        self.inner.write().insert(resource.id.clone(), resource)
    }

    /// Removes the resource with the given id. Returns it if present; a miss is not an error
    /// (I5, "Transient cache miss" in §7).
    pub fn delete(&self, id: &str) -> Option<Resource> {
        self.inner.write().remove(id)
    }

    /// A consistent snapshot of every resource currently cached.
    pub fn list(&self) -> Vec<Resource> {
        self.inner.read().values().cloned().collect()
    }

    pub fn list_by_type(&self, kind: &str) -> Vec<Resource> {
        self.inner
            .read()
            .values()
            .filter(|resource| resource.kind == kind)
            .cloned()
            .collect()
    }

    pub fn list_by_namespace(&self, namespace: &str) -> Vec<Resource> {
        self.inner
            .read()
            .values()
            .filter(|resource| resource.namespace == namespace)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().len()
    }

    /// Sorted unique non-empty namespaces across every cached resource.
    pub fn namespaces(&self) -> Vec<String> {
        let guard = self.inner.read();
        let mut namespaces: Vec<String> = guard
            .values()
            .map(|resource| resource.namespace.clone())
            .filter(|namespace| !namespace.is_empty())
            .collect();
        namespaces.sort_unstable();
        namespaces.dedup();
        namespaces
    }

    /// Per-type counts plus a `total` entry, optionally restricted to one namespace (§4.9).
    pub fn counts(&self, namespace: Option<&str>) -> HashMap<String, usize> {
        let guard = self.inner.read();
        let mut counts = HashMap::new();
        let mut total = 0usize;
        for resource in guard.values() {
            // Cluster-scoped resources (empty namespace) are always included, matching the
            // "cluster-scoped resources always included" contract in §4.9.
            if let Some(ns) = namespace {
                if !resource.namespace.is_empty() && resource.namespace != ns {
                    continue;
                }
            }
            *counts.entry(resource.kind.clone()).or_insert(0) += 1;
            total += 1;
        }
        counts.insert("total".to_string(), total);
        counts
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{Health, Relationships, Status};

    fn fixture(kind: &str, namespace: &str, name: &str) -> Resource {
        Resource {
            id: crate::model::resource_id(kind, namespace, name),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
            status: Status::default(),
            health: Health::Healthy,
            relationships: Relationships::default(),
            labels: Default::default(),
            annotations: Default::default(),
            created_at: Utc::now(),
            spec: serde_json::Value::Null,
            yaml: String::new(),
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = ResourceCache::new();
        cache.set(fixture("Pod", "default", "web-0"));
        let found = cache.get("Pod:default:web-0").expect("resource present");
        assert_eq!(found.name, "web-0");
    }

    #[test]
    fn delete_of_unknown_id_is_ignored() {
        let cache = ResourceCache::new();
        assert!(cache.delete("Pod:default:missing").is_none());
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = ResourceCache::new();
        cache.set(fixture("Pod", "default", "web-0"));
        cache.set(fixture("Pod", "default", "web-0"));
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn counts_always_includes_cluster_scoped() {
        let cache = ResourceCache::new();
        cache.set(fixture("Pod", "ns1", "p"));
        cache.set(fixture("Node", "", "n1"));
        let counts = cache.counts(Some("ns2"));
        assert_eq!(counts.get("Node"), Some(&1));
        assert_eq!(counts.get("Pod"), None);
        assert_eq!(counts.get("total"), Some(&1));
    }

    #[test]
    fn namespaces_are_sorted_unique_and_exclude_empty() {
        let cache = ResourceCache::new();
        cache.set(fixture("Pod", "b", "p1"));
        cache.set(fixture("Pod", "a", "p2"));
        cache.set(fixture("Node", "", "n1"));
        assert_eq!(cache.namespaces(), vec!["a".to_string(), "b".to_string()]);
    }
}
