//! Kubeconfig context enumeration and per-context client construction (§10.4, §6
//! "Environment").

use std::path::Path;

use kube::{
    Client, Config,
    config::{KubeConfigOptions, Kubeconfig},
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::error::{BuildClientSnafu, FromKubeconfigSnafu, InClusterSnafu, ReadKubeconfigSnafu, Result};

/// One named context from kubeconfig, as surfaced by `GET /api/contexts` (§4.9, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub namespace: String,
    pub current: bool,
}

/// Reads the kubeconfig at `path`, or (when `None`) `$KUBECONFIG`/`~/.kube/config` via
/// [`kube::Config::infer`]'s own precedence.
fn read_kubeconfig(path: Option<&Path>) -> Result<Kubeconfig> {
    match path {
        Some(path) => Kubeconfig::read_from(path).context(ReadKubeconfigSnafu),
        None => Kubeconfig::read().context(ReadKubeconfigSnafu),
    }
}

/// Reads kubeconfig from `path` (or the default lookup when `None`) and lists every named
/// context.
pub async fn list_contexts(path: Option<&Path>) -> Result<Vec<ContextInfo>> {
    let kubeconfig = read_kubeconfig(path)?;
    Ok(contexts_from(&kubeconfig))
}

fn contexts_from(kubeconfig: &Kubeconfig) -> Vec<ContextInfo> {
    kubeconfig
        .contexts
        .iter()
        .filter_map(|named| {
            let context = named.context.as_ref()?;
            Some(ContextInfo {
                name: named.name.clone(),
                cluster: context.cluster.clone(),
                namespace: context.namespace.clone().unwrap_or_else(|| "default".to_string()),
                current: kubeconfig.current_context.as_deref() == Some(named.name.as_str()),
            })
        })
        .collect()
}

/// Builds a [`Client`] for `context`, or the kubeconfig's current context when `None`.
///
/// In-cluster credentials are auto-detected and preferred when present (§6, "Environment"),
/// matching [`kube::Config::infer`]'s own precedence; kubeconfig contexts (read from
/// `kubeconfig_path`, or the default lookup when `None`) are only consulted when no in-cluster
/// service account is mounted.
pub async fn build_client(context: Option<&str>, kubeconfig_path: Option<&Path>) -> Result<Client> {
    if Config::incluster_env().is_ok() {
        let config = Config::incluster().context(InClusterSnafu)?;
        return Client::try_from(config).context(BuildClientSnafu);
    }

    let kubeconfig = read_kubeconfig(kubeconfig_path)?;
    let options = KubeConfigOptions { context: context.map(str::to_string), ..Default::default() };
    let config = Config::from_kubeconfig(&kubeconfig, &options).await.context(FromKubeconfigSnafu)?;
    Client::try_from(config).context(BuildClientSnafu)
}

#[cfg(test)]
mod tests {
    use kube::config::{Context, NamedContext};

    use super::*;

    fn kubeconfig_with(contexts: Vec<(&str, &str, Option<&str>)>, current: &str) -> Kubeconfig {
        Kubeconfig {
            current_context: Some(current.to_string()),
            contexts: contexts
                .into_iter()
                .map(|(name, cluster, namespace)| NamedContext {
                    name: name.to_string(),
                    context: Some(Context {
                        cluster: cluster.to_string(),
                        namespace: namespace.map(str::to_string),
                        user: "user".to_string(),
                        extensions: None,
                    }),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn marks_the_current_context() {
        let kubeconfig = kubeconfig_with(vec![("dev", "dev-cluster", Some("ns1")), ("prod", "prod-cluster", None)], "dev");
        let contexts = contexts_from(&kubeconfig);
        assert_eq!(contexts.len(), 2);
        assert!(contexts.iter().find(|c| c.name == "dev").unwrap().current);
        assert!(!contexts.iter().find(|c| c.name == "prod").unwrap().current);
    }

    #[test]
    fn defaults_missing_namespace_to_default() {
        let kubeconfig = kubeconfig_with(vec![("prod", "prod-cluster", None)], "prod");
        let contexts = contexts_from(&kubeconfig);
        assert_eq!(contexts[0].namespace, "default");
    }
}
