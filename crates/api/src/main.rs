use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portal_api::config::{DispatchMode, ServerConfig};
use portal_api::router::build_app_router;
use portal_api::state::AppState;
use portal_events::{standard_subscribers, Dispatcher, EmailConfig, LogMailer, Mailer, PgStore, SmtpMailer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_api=debug,portal_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = portal_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    portal_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    portal_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Dispatcher ---
    let store = Arc::new(PgStore::new(pool.clone()));
    let subscribers = standard_subscribers(store.clone(), store);
    let (dispatcher, queue_worker) = match config.dispatch_mode {
        DispatchMode::Inline => (Dispatcher::inline(subscribers), None),
        DispatchMode::Queued => {
            let (dispatcher, worker) = Dispatcher::queued(subscribers, config.queue_settings());
            (dispatcher, Some(worker))
        }
    };
    tracing::info!(
        mode = ?config.dispatch_mode,
        subscribers = ?dispatcher.subscriber_names(),
        "Dispatcher started"
    );

    // --- Email ---
    let mailer: Arc<dyn Mailer> = match EmailConfig::from_env().map(SmtpMailer::new) {
        Some(Ok(smtp)) => {
            tracing::info!("SMTP mailer configured");
            Arc::new(smtp)
        }
        Some(Err(e)) => {
            tracing::warn!(error = %e, "Invalid SMTP configuration, emails will only be logged");
            Arc::new(LogMailer)
        }
        None => {
            tracing::info!("SMTP_HOST not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let state = AppState::new(pool, config, dispatcher, mailer);
    tracing::info!(root = %state.storage.root().display(), "File storage ready");

    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The router (and with it every dispatcher clone) is gone, so the queue
    // worker drains what is left and exits.
    if let Some(worker) = queue_worker {
        match tokio::time::timeout(shutdown_timeout, worker).await {
            Ok(_) => tracing::info!("Dispatch queue drained"),
            Err(_) => tracing::warn!("Dispatch queue did not drain before the shutdown timeout"),
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
