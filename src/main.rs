use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dm_relay::{
    api::{create_router, AppState},
    config::Config,
    crypto::TokenSigner,
    db,
    error::AppError,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dm_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dm-relay v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    // Connects and runs embedded migrations
    let pool = db::connect(&config).await?;
    tracing::info!("Database ready: {}", config.database_url);

    let tokens = Arc::new(TokenSigner::from_config(&config)?);

    let state = AppState::new(pool.clone(), tokens, config.clone());
    tracing::info!(
        "Relay configured (push timeout {}ms, outbound queue {})",
        config.push_timeout_ms,
        config.outbound_queue_capacity
    );

    let app = create_router(state);

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("  POST /api/auth/register - Register new user");
    tracing::info!("  POST /api/auth/login    - Obtain identity token");
    tracing::info!("  GET  /api/auth/me       - Current user (requires auth)");
    tracing::info!("  GET  /api/users         - Other users (requires auth)");
    tracing::info!("  GET  /api/messages/{{id}} - Conversation history (requires auth)");
    tracing::info!("  GET  /ws                - Relay socket");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
