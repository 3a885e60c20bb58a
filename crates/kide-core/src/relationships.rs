//! The [`RelationshipResolver`] (C3): reverse-edge lookup and bidirectional patching over the
//! [`ResourceCache`].

use crate::{
    cache::ResourceCache,
    model::{ForwardRelation, Relationships, Resource, ResourceRef},
};

/// Stateless operations over a [`ResourceCache`] that keep the ten-edge relationship graph
/// bidirectionally consistent (I2).
pub struct RelationshipResolver<'a> {
    cache: &'a ResourceCache,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(cache: &'a ResourceCache) -> Self {
        Self { cache }
    }

    /// Scans the cache once, returning every resource whose forward edge of `relation` contains
    /// `target_id`. Used by transformers to fill `owns`/`usedBy`/`exposedBy`/`routedBy`/`schedules`
    /// at construction time, since those reverse edges are otherwise only maintained lazily by
    /// [`Self::update_bidirectional`].
    pub fn find_reverse(&self, target_id: &str, relation: ForwardRelation) -> Vec<ResourceRef> {
        self.cache
            .list()
            .into_iter()
            .filter(|candidate| {
                candidate
                    .relationships
                    .forward(relation)
                    .iter()
                    .any(|reference| reference.id == target_id)
            })
            .map(|candidate| candidate.as_ref())
            .collect()
    }

    /// After `resource` has been placed in the cache, walks each of its forward edges and patches
    /// the referenced resource's reverse edge to include `resource`, re-storing the mutated
    /// resource (§4.3).
    ///
    /// Deletes never call this — stale reverse edges are left in place until the referencing
    /// resource is re-emitted by the next informer resync (I5).
    pub fn update_bidirectional(&self, resource: &Resource) {
        let self_ref = resource.as_ref();

        for relation in ForwardRelation::ALL {
            for target in resource.relationships.forward(relation) {
                let Some(mut referenced) = self.cache.get(&target.id) else {
                    continue;
                };
                let reverse_list = referenced.relationships.reverse_mut(relation);
                Relationships::push_unique(reverse_list, self_ref.clone());
                self.cache.set(referenced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{Health, Status, resource_id};

    fn fixture(kind: &str, namespace: &str, name: &str) -> Resource {
        Resource {
            id: resource_id(kind, namespace, name),
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
    fn ownership_reverse_converges() {
        let cache = ResourceCache::new();
        let deployment = fixture("Deployment", "ns1", "d");
        cache.set(deployment.clone());

        let mut replica_set = fixture("ReplicaSet", "ns1", "r");
        replica_set.relationships.owned_by.push(deployment.as_ref());
        cache.set(replica_set.clone());

        let resolver = RelationshipResolver::new(&cache);
        resolver.update_bidirectional(&replica_set);

        let updated_deployment = cache.get(&deployment.id).expect("deployment present");
        assert_eq!(updated_deployment.relationships.owns, vec![replica_set.as_ref()]);
    }

    #[test]
    fn deleting_owned_resource_leaves_stale_reverse_edge_until_resync() {
        let cache = ResourceCache::new();
        let deployment = fixture("Deployment", "ns1", "d");
        cache.set(deployment.clone());

        let mut replica_set = fixture("ReplicaSet", "ns1", "r");
        replica_set.relationships.owned_by.push(deployment.as_ref());
        cache.set(replica_set.clone());

        let resolver = RelationshipResolver::new(&cache);
        resolver.update_bidirectional(&replica_set);
        cache.delete(&replica_set.id);

        let stale_deployment = cache.get(&deployment.id).expect("deployment present");
        assert_eq!(stale_deployment.relationships.owns.len(), 1, "I5: stale edge is tolerated");
    }

    #[test]
    fn find_reverse_matches_any_candidate_with_the_forward_edge() {
        let cache = ResourceCache::new();
        let deployment = fixture("Deployment", "ns1", "d");
        cache.set(deployment.clone());

        let mut replica_set = fixture("ReplicaSet", "ns1", "r");
        replica_set.relationships.owned_by.push(deployment.as_ref());
        cache.set(replica_set.clone());

        let resolver = RelationshipResolver::new(&cache);
        let owners = resolver.find_reverse(&deployment.id, ForwardRelation::OwnedBy);
        assert_eq!(owners, vec![replica_set.as_ref()]);
    }
}
