use std::net::SocketAddr;
use std::time::Duration;
use tower_sessions::session_store::ExpiredDeletion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notesapp_server::{app, open_database, session::session_store, AppState, Config};

/// How often expired session rows are purged
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notesapp_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Notes App Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Open database and run migrations
    let db = open_database(&config.database_path).await?;

    // Uploads are served straight from this directory
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tracing::info!("Upload directory: {}", config.upload_dir);

    // Purge expired sessions in the background
    let store = session_store(&db);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.delete_expired().await {
                tracing::warn!("Failed to delete expired sessions: {}", e);
            }
        }
    });

    let addr: SocketAddr = config.server_address().parse()?;
    let state = AppState::new(db, config);
    let app = app(state);

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
