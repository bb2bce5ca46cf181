//! KeyGate Server — credential issuance and session management
//!
//! Main entry point that wires all crates together and runs the service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use keygate_core::config::AppConfig;
use keygate_core::error::AppError;

/// How often expired sessions are purged from the store.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("KEYGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting KeyGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection ──────────────────────────────
    let db_pool = keygate_database::DatabasePool::connect(&config.database).await?;
    db_pool.health_check().await?;

    // ── Step 2: Stores ───────────────────────────────────────────
    let credentials: Arc<dyn keygate_database::CredentialStore> = Arc::new(
        keygate_database::repositories::user::UserRepository::new(db_pool.pool().clone()),
    );
    let session_store: Arc<dyn keygate_database::SessionStore> = Arc::new(
        keygate_database::repositories::session::SessionRepository::new(db_pool.pool().clone()),
    );
    let sessions = keygate_auth::session::SessionRegistry::new(session_store);

    // ── Step 3: Collaborators ────────────────────────────────────
    let federation = Arc::new(keygate_auth::federation::HttpFederationProvider::new(
        config.federation.clone(),
    )?);
    let mailer = Arc::new(keygate_service::email::LogMailer::new(config.email.clone()));

    // ── Step 4: Services ─────────────────────────────────────────
    tracing::info!("Initializing services...");
    let auth_service = keygate_service::AuthService::new(
        Arc::clone(&credentials),
        sessions.clone(),
        federation,
        mailer,
        &config.auth,
    );
    let user_service = keygate_service::UserService::new(
        Arc::clone(&credentials),
        sessions.clone(),
        &config.auth,
    );
    let admin_service =
        keygate_service::AdminService::new(Arc::clone(&credentials), sessions.clone());
    tracing::info!("Services initialized");

    // The transport layer is deployment-specific; the wired services are the
    // crate's public surface. Keep them alive for the server's lifetime.
    let _services = (auth_service, user_service, admin_service);

    // ── Step 5: Session purge loop until shutdown ────────────────
    let active = sessions.count_active().await?;
    tracing::info!(active_sessions = active, "KeyGate is running");

    let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
    ticker.tick().await; // the first tick fires immediately
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sessions.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Expired sessions purged"),
                    Err(e) => tracing::warn!("Session purge failed: {e}"),
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("Shutdown signal received, starting graceful shutdown...");
                break;
            }
        }
    }

    db_pool.close().await;
    tracing::info!("KeyGate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
