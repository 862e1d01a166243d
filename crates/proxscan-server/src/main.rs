//! # proxscan-server
//!
//! HTTP server exposing nearby Wi-Fi networks and proximity reports.
//!
//! ## Running
//!
//! ```bash
//! # Development, scripted platform
//! PROXSCAN_CONFIG=./config.toml cargo run --package proxscan-server --features mock-platform
//!
//! # Production
//! PROXSCAN_ENV=production ./proxscan-server
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use proxscan_core::Config;
use proxscan_server::api::create_router;
use proxscan_server::logging;
use proxscan_server::state::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(logging::is_production())?;

    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path)?;
    info!(
        path = %config_path.display(),
        backend = ?config.platform.backend,
        wait_timeout_secs = config.scan.wait_timeout_secs,
        "Starting proxscan-server"
    );

    let addr = config.server.socket_addr()?;
    let state = AppState::new(config)?.shared();
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
