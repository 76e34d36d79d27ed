use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delivery_sync_server::{build_router, open_store, AppState, Config, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log format can be applied
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "delivery_sync_server=info,tower_http=debug".into());
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Starting Delivery Sync Server...");
    tracing::info!(
        "Environment: {}, Server: {}, CORS origin: {:?}",
        config.environment,
        config.server_address(),
        config.allowed_origin
    );

    // Connect to the managed backend
    let db = open_store(&config.store).await?;

    let app = build_router(AppState::new(db), &config);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
