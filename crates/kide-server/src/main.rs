use clap::Parser as _;
use kide_server::Cli;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    kide_server::init_telemetry();

    if let Err(error) = kide_server::run(cli).await {
        tracing::error!(%error, "fatal error during startup or serving");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
