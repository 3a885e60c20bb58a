use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced while transforming a native Kubernetes object into a [`crate::model::Resource`].
///
/// These are always scoped to a single watch event: the caller logs the error and drops the
/// event, it never aborts the watcher (see the "Transformer" row of the error handling table).
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("object {kind} is missing required field `metadata.name`"))]
    MissingName { kind: &'static str },

    #[snafu(display("failed to serialize {kind} {name} to YAML"))]
    SerializeYaml {
        kind: &'static str,
        name: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("custom resource {kind} is missing required field `apiVersion`"))]
    MissingApiVersion { kind: String },
}
