//! CLI surface (§6 "CLI", §10.1): a `clap`-derived argument set following the same
//! `#[arg(long, env, default_value = ...)]` idiom the reference operator framework's
//! `RunArguments`/`CommonOptions` use.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "kide", version, about = "Interactive cluster-observability service", long_about = None)]
pub struct Cli {
    /// Port the HTTP surface binds to, on localhost by default (§6).
    #[arg(long, env = "KIDE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path to a kubeconfig file. Falls back to `$KUBECONFIG`, then `~/.kube/config`, matching
    /// `kube::Config::infer`'s own precedence (§6 "Environment").
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,
}
