use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use waypoint_backend::{History, create_app};
use waypoint_history::JsonFileRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting Waypoint backend server...");
    // Load configuration from environment variables or use defaults
    let config = waypoint_backend::config::Config::from_env();
    tracing::info!(
        "Configuration: port={}, history_dir={}, body_limit={}KB, timeout={}s, ingest_token={}",
        config.port,
        config.history_dir,
        config.request_body_limit / 1024,
        config.request_timeout.as_secs(),
        if config.ingest_token.is_some() { "set" } else { "unset" }
    );
    tracing::info!(
        "Rate limits: ingest={}/sec (burst {}), general={}/sec (burst {})",
        config.rate_limit_ingest_per_sec,
        config.rate_limit_ingest_burst,
        config.rate_limit_general_per_sec,
        config.rate_limit_general_burst
    );

    let repository = JsonFileRepository::open(&config.history_dir)?;
    let history: Arc<History> = Arc::new(History::new(repository));

    let app = create_app(
        Arc::clone(&history),
        config.ingest_token.clone(),
        config.request_body_limit,
        config.request_timeout,
        config.rate_limit(),
    );
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Axum server error: {}", e);
    }

    // Keep whatever the last flush interval had not written yet
    let written = tokio::task::spawn_blocking(move || history.flush_all()).await?;
    tracing::info!("Shutdown complete, wrote {} history files", written);
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
