//! Wire-level event types shared by the watcher (producer), the hubs (fan-out) and the session
//! gateway (serialization). Field names and casing here are load-bearing — they are the bit-exact
//! JSON frame shapes from §6.

use serde::{Deserialize, Serialize};

use crate::model::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceEventKind {
    Added,
    Modified,
    Deleted,
}

/// Emitted by the watcher (C4) for every informer callback, and fanned out by the resource hub
/// (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceEvent {
    #[serde(rename = "ADDED")]
    Added { resource: Resource },
    #[serde(rename = "MODIFIED")]
    Modified { resource: Resource },
    #[serde(rename = "DELETED")]
    Deleted { resource: Resource },
}

impl ResourceEvent {
    pub fn resource(&self) -> &Resource {
        match self {
            ResourceEvent::Added { resource } | ResourceEvent::Modified { resource } | ResourceEvent::Deleted { resource } => resource,
        }
    }

    pub fn kind(&self) -> ResourceEventKind {
        match self {
            ResourceEvent::Added { .. } => ResourceEventKind::Added,
            ResourceEvent::Modified { .. } => ResourceEventKind::Modified,
            ResourceEvent::Deleted { .. } => ResourceEventKind::Deleted,
        }
    }
}

/// The broadcast lifecycle signal describing whether the active controller's informers have
/// finished their initial population (§4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatusEvent {
    #[serde(rename = "type")]
    pub event_type: SyncStatusTag,
    pub syncing: bool,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub context: String,
}

/// A unit type that always serializes to the literal `"SYNC_STATUS"` string, giving
/// [`SyncStatusEvent`] the same `{"type": "..."}` tagging convention as [`ResourceEvent`] without
/// relying on serde's enum-only internal tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatusTag;

impl Serialize for SyncStatusTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("SYNC_STATUS")
    }
}

impl<'de> Deserialize<'de> for SyncStatusTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value == "SYNC_STATUS" {
            Ok(SyncStatusTag)
        } else {
            Err(serde::de::Error::custom(format!("expected \"SYNC_STATUS\", got {value:?}")))
        }
    }
}

impl SyncStatusEvent {
    pub fn syncing(context: impl Into<String>) -> Self {
        Self { event_type: SyncStatusTag, syncing: true, synced: false, error: None, context: context.into() }
    }

    pub fn synced(context: impl Into<String>) -> Self {
        Self { event_type: SyncStatusTag, syncing: false, synced: true, error: None, context: context.into() }
    }

    pub fn failed(context: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            event_type: SyncStatusTag,
            syncing: false,
            synced: false,
            error: Some(error.into()),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_event_serializes_with_bit_exact_type_tag() {
        let resource = crate::cache::ResourceCache::new();
        let _ = resource; // silence unused in case of future fixture reuse
        let event = ResourceEvent::Added {
            resource: sample_resource(),
        };
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["type"], "ADDED");
        assert!(json["resource"].is_object());
    }

    #[test]
    fn sync_status_event_omits_error_when_absent() {
        let event = SyncStatusEvent::synced("kind-dev");
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["type"], "SYNC_STATUS");
        assert_eq!(json["synced"], true);
        assert!(json.get("error").is_none());
    }

    fn sample_resource() -> Resource {
        use crate::model::{Health, Relationships, Status, resource_id};
        Resource {
            id: resource_id("Pod", "default", "web-0"),
            kind: "Pod".to_string(),
            name: "web-0".to_string(),
            namespace: "default".to_string(),
            status: Status::default(),
            health: Health::Healthy,
            relationships: Relationships::default(),
            labels: Default::default(),
            annotations: Default::default(),
            created_at: chrono::Utc::now(),
            spec: serde_json::Value::Null,
            yaml: String::new(),
        }
    }
}
