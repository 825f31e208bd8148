//! Server binary: wires configuration, database, seeding, the periodic
//! auction sweep, and the axum HTTP server with graceful shutdown.

use courtyard::{
    api::{self, AppState},
    config::{database, seed, settings::Settings},
    core::auction,
    errors::Result,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How often the background task closes expired auctions.
const AUCTION_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenvy::dotenv().ok();

    // 3. Load runtime settings
    let settings = Settings::load()?;

    // 4. Initialize the database and create any missing tables
    let db = database::create_connection().await?;
    database::create_tables(&db).await?;
    info!("Database initialized");

    // 5. Seed voucher options and the bootstrap admin, when a seed file exists
    match seed::load_config(&settings.config_path) {
        Ok(config) => seed::apply(&db, &config).await?,
        Err(e) => info!("No seed config applied ({e})"),
    }

    // 6. Background sweep closing expired auctions
    let sweep_db = db.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(AUCTION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match auction::deactivate_expired(&sweep_db).await {
                Ok(0) => {}
                Ok(closed) => info!("Closed {closed} expired auction(s)"),
                Err(e) => error!("Auction sweep failed: {e}"),
            }
        }
    });

    // 7. Serve the API
    let state = AppState {
        db,
        settings: Arc::new(settings.clone()),
    };
    let app = api::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
