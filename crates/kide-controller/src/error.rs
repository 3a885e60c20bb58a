use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced while building a cluster client or switching contexts (§7, "Configuration").
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read kubeconfig"))]
    ReadKubeconfig { source: kube::config::KubeconfigError },

    #[snafu(display("context {context:?} was not found in kubeconfig"))]
    ContextNotFound { context: String },

    #[snafu(display("failed to build client configuration from kubeconfig"))]
    FromKubeconfig { source: kube::config::KubeconfigError },

    #[snafu(display("failed to load in-cluster configuration"))]
    InCluster { source: kube::config::InClusterError },

    #[snafu(display("failed to construct Kubernetes client"))]
    BuildClient { source: kube::Error },

    #[snafu(display("a context switch is already in progress"))]
    SwitchInProgress,

    #[snafu(display("watch layer failed to start"))]
    Watch { source: kide_watch::Error },
}
