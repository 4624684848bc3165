use portfolio_service::{
    config::AppConfig, db, handlers::health, middleware::AppState,
    repository::SessionRepository, routes, telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    health::set_start_time();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    telemetry::init_telemetry(&config);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Portfolio service starting...");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // Misconfiguration (hash cost bounds, JWT key, storage credentials)
    // is fatal here, before the listener binds.
    let state = Arc::new(AppState::new(config.clone(), db_pool.clone())?);

    let _sweep_handle = start_session_sweep(state.clone());

    let app = routes::create_router(state);

    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    // In-flight requests have drained; now the store connections can go.
    db_pool.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Periodically reap sessions whose TTL has passed without being
/// consumed or revoked.
fn start_session_sweep(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    let interval_secs = state.config.security.session_sweep_interval_secs;
    let sessions = SessionRepository::new(state.db.clone());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match sessions.delete_expired().await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "Swept expired sessions"),
                Err(e) => tracing::warn!("Session sweep failed: {}", e),
            }
        }
    })
}

async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // Bound the drain: if requests are still in flight past the grace
    // period, force the process down.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}
