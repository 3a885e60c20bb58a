//! Per-session resource filter (§4.6, §4.8, P4).

use kide_core::Resource;

/// A session's namespace/type filter. `None` means unfiltered in either dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub namespace: Option<String>,
    pub kind: Option<String>,
}

impl Filter {
    pub fn new(namespace: Option<String>, kind: Option<String>) -> Self {
        Self { namespace, kind }
    }

    /// Parses the raw `namespace`/`type` query parameters (§4.8): both `""` and `"all"` mean "no
    /// filter" in either dimension.
    pub fn from_query(namespace: Option<&str>, kind: Option<&str>) -> Self {
        Self { namespace: normalize(namespace), kind: normalize(kind) }
    }

    /// P4: `(N=="" or resource.namespace==N or resource.namespace=="") and (T=="" or
    /// resource.type==T)`. A cluster-scoped resource (empty namespace) always passes the
    /// namespace check regardless of `N`.
    pub fn matches(&self, resource: &Resource) -> bool {
        let namespace_ok = match &self.namespace {
            None => true,
            Some(namespace) => resource.namespace.is_empty() || resource.namespace == *namespace,
        };
        let kind_ok = match &self.kind {
            None => true,
            Some(kind) => resource.kind == *kind,
        };
        namespace_ok && kind_ok
    }
}

fn normalize(raw: Option<&str>) -> Option<String> {
    match raw {
        None => None,
        Some(value) if value.is_empty() || value.eq_ignore_ascii_case("all") => None,
        Some(value) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use kide_core::model::{Health, Relationships, Status, resource_id};
    use rstest::rstest;

    use super::*;

    fn resource(kind: &str, namespace: &str) -> Resource {
        Resource {
            id: resource_id(kind, namespace, "x"),
            kind: kind.to_string(),
            name: "x".to_string(),
            namespace: namespace.to_string(),
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

    #[rstest]
    #[case(None, None, "Pod", "ns1", true)]
    #[case(Some("ns1"), None, "Pod", "ns1", true)]
    #[case(Some("ns1"), None, "Pod", "ns2", false)]
    #[case(Some("ns1"), None, "Node", "", true)]
    #[case(None, Some("Pod"), "ConfigMap", "ns2", false)]
    #[case(None, Some("Pod"), "Pod", "ns2", true)]
    fn matches_per_p4(#[case] namespace: Option<&str>, #[case] kind: Option<&str>, #[case] resource_kind: &str, #[case] resource_ns: &str, #[case] expected: bool) {
        let filter = Filter::new(namespace.map(str::to_string), kind.map(str::to_string));
        assert_eq!(filter.matches(&resource(resource_kind, resource_ns)), expected);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("all"), None)]
    #[case(Some("ALL"), None)]
    #[case(Some("ns1"), Some("ns1"))]
    fn from_query_normalizes_empty_and_all(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        let filter = Filter::from_query(raw, None);
        assert_eq!(filter.namespace.as_deref(), expected);
    }
}
