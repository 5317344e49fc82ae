//! Main entry point for the vconf server.
//!
//! Loads configuration, sets up logging, opens the storage backend and runs
//! the HTTP gateway until a termination signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use vconf_persistence::StorageRegistry;
use vconf_server::{AppState, Cli, ServerConfig, startup};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let configuration = ServerConfig::load(cli.config.as_deref())?;

    let _logging_guard = startup::init_logging(&configuration.logging)?;

    let storage = StorageRegistry::with_builtin().open(&configuration.storage)?;
    let app_state = Arc::new(AppState::new(storage.clone()));

    info!(
        address = %configuration.listen.addr(),
        backend = storage.backend_name(),
        "starting config server"
    );

    let server = startup::config_server(app_state, &configuration.listen)?;
    let served = server.await;

    if let Err(e) = storage.close().await {
        error!(error = %e, "failed to close storage backend");
    }

    match served {
        Ok(()) => {
            info!("config server stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "config server terminated with error");
            Err(e.into())
        }
    }
}
