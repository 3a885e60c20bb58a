use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced while standing up or tearing down the watch layer (C4).
///
/// These are scoped to startup/discovery; per-event transformer failures are logged and the
/// offending event is dropped instead of propagating here (§7, "Transformer" row).
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to list CustomResourceDefinitions during CRD discovery"))]
    ListCrds { source: kube::Error },

    #[snafu(display("cache sync was cancelled before all informers finished their initial list"))]
    SyncCancelled,
}
