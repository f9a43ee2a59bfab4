use std::env;
use std::process::ExitCode;

use errpages::config::Config;
use errpages::server::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ERRPAGES_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let path = env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());

    let config = match Config::load(&path) {
        Ok(config) => {
            info!(%path, "configuration loaded");
            config
        }
        Err(e) => {
            error!(%path, error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut server = match Server::new() {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to initialize server");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run(&config) {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
