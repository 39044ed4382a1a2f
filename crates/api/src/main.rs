// Session auth API server

use anyhow::Context;
use dotenvy::dotenv;
use sessionauth_api::config::{Config, StoreBackend};
use sessionauth_api::{create_router, AppState};
use sessionauth_auth::AuthService;
use sessionauth_database::{
    CredentialStore, Database, MemoryStore, SessionRepository, SessionStore, UserRepository,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    init_tracing();

    tracing::info!("Starting session auth API server");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    tracing::info!("Server: {}", config.bind_address());

    // Pick the backing store
    let (credential_store, session_store, database): (
        Arc<dyn CredentialStore>,
        Arc<dyn SessionStore>,
        Option<Database>,
    ) = match config.store_backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database at {}", config.database.redacted_url());
            let database = Database::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            database.ping().await.context("Database ping failed")?;
            database.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Database connected, migrations applied");

            let pool = database.pool().clone();
            (
                Arc::new(UserRepository::new(pool.clone())),
                Arc::new(SessionRepository::new(pool)),
                Some(database),
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; all users and sessions are lost on restart");
            let store = MemoryStore::new();
            (Arc::new(store.clone()), Arc::new(store), None)
        }
    };

    let auth_service = AuthService::with_stores(credential_store, session_store, config.session.clone());

    let sweep = config.session.cleanup_interval.map(|period| {
        tracing::info!("Expired-session sweep every {:?}", period);
        auth_service.sessions().spawn_expiry_sweep(period)
    });

    let state = Arc::new(AppState::new(auth_service));
    let app = create_router(state);

    tracing::info!("Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   GET  /api/auth?action=me");
    tracing::info!("   POST /api/auth?action=signup|login|logout");
    tracing::info!("   GET  /api/session");

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server ready at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = sweep {
        handle.abort();
    }
    if let Some(database) = database {
        database.close().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sessionauth_api=debug,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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
