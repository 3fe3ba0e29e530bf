//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::{AppState, create_app};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStore, PostgresStore, Store};
use tokio::signal;
use tower_sessions::{MemoryStore, SessionStore};
use tower_sessions_sqlx_store::PostgresStore as PgSessionStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve<S, T>(config: Config, store: S, sessions: T, metrics_handle: PrometheusHandle)
where
    S: Store,
    T: SessionStore + Clone,
{
    let state = Arc::new(AppState::new(store, config.require_login_for_checkout));
    let app = create_app(state, sessions, config.secure_cookies, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open the store and session store, then serve
    match config.database_url.clone() {
        Some(url) => {
            let pool = store::connect(&url, config.db_max_connections, config.db_acquire_timeout)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresStore::new(pool.clone());
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");

            let sessions = PgSessionStore::new(pool);
            sessions
                .migrate()
                .await
                .expect("failed to create session table");

            tracing::info!(
                max_connections = config.db_max_connections,
                "using PostgreSQL store"
            );
            serve(config, store, sessions, metrics_handle).await;
        }
        None => {
            let store = InMemoryStore::new();
            api::seed::seed_demo_catalog(&store)
                .await
                .expect("failed to seed demo catalog");

            tracing::warn!("DATABASE_URL not set, using in-memory store");
            serve(config, store, MemoryStore::default(), metrics_handle).await;
        }
    }
}
