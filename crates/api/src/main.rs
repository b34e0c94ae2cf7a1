use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rfs_api::config::{NotifyConfig, ServerConfig};
use rfs_api::router::build_app_router;
use rfs_api::state::AppState;
use rfs_db::PgStore;
use rfs_events::{NotificationRouter, RetrySweeper};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rfs_api=debug,rfs_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let notify_config = NotifyConfig::from_env();
    tracing::info!(
        admin_chats = notify_config.telegram_admin_chat_ids.len(),
        admin_whatsapp = notify_config.whatsapp_admins.len(),
        webhook_secret_set = notify_config.telegram_webhook_secret.is_some(),
        "Loaded notification configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = rfs_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    rfs_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    let store = Arc::new(PgStore::new(pool));

    // --- Channels ---
    let channels = notify_config
        .build_channels()
        .expect("Failed to build channel clients");

    let notifier = Arc::new(NotificationRouter::new(
        channels.clone(),
        store.clone(),
        notify_config.router_settings(),
    ));
    let sweeper = Arc::new(RetrySweeper::new(
        store.clone(),
        channels,
        notify_config.sweep_settings(),
    ));

    // Spawn retry sweeper (re-delivers stale pending log entries).
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = {
        let sweeper = Arc::clone(&sweeper);
        let cancel = sweep_cancel.clone();
        let period = notify_config.sweep_interval();
        tokio::spawn(async move {
            sweeper.run(period, cancel).await;
        })
    };

    // --- App state ---
    let state = AppState {
        commerce: store,
        notifier,
        sweeper,
        config: Arc::new(config.clone()),
        notify_config: Arc::new(notify_config),
    };

    let app = build_app_router(state, &config);

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
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    match tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        sweep_handle,
    )
    .await
    {
        Ok(Ok(())) => tracing::info!("Retry sweeper stopped"),
        Ok(Err(e)) => tracing::error!(error = %e, "Retry sweeper task failed"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Retry sweeper did not stop within the shutdown timeout"
        ),
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
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
