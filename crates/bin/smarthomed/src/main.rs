//! # smarthomed: smarthome daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing` logging
//! - Open the `SQLite` connection pool once and run migrations
//! - Construct the device store (adapter) and inject it into the device service
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use smarthome_adapter_http_axum::router;
use smarthome_adapter_http_axum::state::AppState;
use smarthome_adapter_storage_sqlite_sqlx::{Database, SqliteDeviceStore};
use smarthome_app::services::device_service::DeviceService;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let (filter, filter_error) = env_filter(&config.logging.filter);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if let Some(err) = filter_error {
        tracing::warn!(
            filter = %config.logging.filter,
            error = %err,
            "invalid log filter, falling back to `info`"
        );
    }

    // Database
    let db = Database::connect(&config.database.url).await?;

    // Services
    let device_service = DeviceService::new(SqliteDeviceStore::new(db.pool().clone()));

    // HTTP
    let app = router::build(AppState::new(device_service));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "smarthomed listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    tracing::info!("smarthomed stopped");

    Ok(())
}

/// Parse `directive`, falling back to `info` and handing back the parse error
/// so it can be logged once the subscriber is installed.
fn env_filter(directive: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err)),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
