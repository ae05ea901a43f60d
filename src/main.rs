//! Master server binary.
//!
//! Loads configuration (TOML file via `MASTERLIST_CONFIG`, environment
//! overrides otherwise), installs the tracing subscriber, and serves until
//! ctrl-c.

use masterlist::config::MasterConfig;
use masterlist::service::MasterServer;
use masterlist::utils::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("masterlist: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&config.logging);

    let server = match MasterServer::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("masterlist: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!(error = %e, "server terminated abnormally");
        std::process::exit(1);
    }
}

fn load_config() -> masterlist::Result<MasterConfig> {
    match std::env::var("MASTERLIST_CONFIG") {
        Ok(path) => MasterConfig::from_file(path),
        Err(_) => MasterConfig::from_env(),
    }
}
