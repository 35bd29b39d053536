use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twitcanva_api::config::ServerConfig;
use twitcanva_api::router::build_app_router;
use twitcanva_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "twitcanva_api=debug,twitcanva_canvas=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        image_model = %config.generation.config.image_model,
        video_model = %config.generation.config.model,
        "Loaded server configuration",
    );
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // --- Canvas state & event services ---
    let state = AppState::new(config.clone());
    let journal_handle = state.spawn_journal();
    tracing::info!("Canvas store and event journal started");

    // --- Router ---
    let app = build_app_router(state.clone());

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        revision = state.store.revision(),
        "Server stopped accepting connections, cleaning up"
    );

    // Dropping every handle on the bus closes the broadcast channel, which
    // ends the journal loop.
    drop(state);
    if tokio::time::timeout(shutdown_timeout, journal_handle)
        .await
        .is_err()
    {
        tracing::warn!("Event journal did not stop within the shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix) to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
