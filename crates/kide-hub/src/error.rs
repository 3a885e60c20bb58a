use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced while fanning out resource/sync events or opening a log stream (§7).
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("resource hub task is no longer running"))]
    HubGone,

    #[snafu(display("log hub task is no longer running"))]
    LogHubGone,

    #[snafu(display("failed to open log stream for pod {namespace}/{pod} container {container}"))]
    OpenLogStream { namespace: String, pod: String, container: String, source: kube::Error },
}
