//! Coursio backend server
//!
//! HTTP entry point wiring configuration, the database pool and the core
//! services into the axum router.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use coursio_server::activity::ActivityService;
use coursio_server::auth::AuthService;
use coursio_server::config::Config;
use coursio_server::db;
use coursio_server::fees::FeeService;
use coursio_server::ledger::LedgerService;
use coursio_server::messaging::MessagingService;
use coursio_server::middleware;
use coursio_server::notify::{LogNotifier, Notifier};
use coursio_server::payment;
use coursio_server::referral::ReferralService;
use coursio_server::request::RequestService;
use coursio_server::routes;
use coursio_server::state::AppState;
use coursio_server::storage::FsDocumentStore;
use coursio_server::wallet::WalletService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting coursio-server");

    // Database pool and schema
    let db_pool = db::create_pool(&config)
        .await
        .context("database connection failed")?;
    db::run_migrations(&db_pool)
        .await
        .context("migration failed")?;

    // Collaborator boundaries
    let gateway = payment::from_config(&config);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let document_store = Arc::new(FsDocumentStore::new(config.document_dir.clone()));

    // Core services
    let ledger_service = LedgerService::new(db_pool.clone());
    let fee_service = FeeService::new(db_pool.clone());
    let referral_service = ReferralService::new(db_pool.clone());
    let request_service = RequestService::new(
        db_pool.clone(),
        fee_service.clone(),
        gateway.clone(),
        notifier.clone(),
    );
    let wallet_service = WalletService::new(
        ledger_service.clone(),
        fee_service.clone(),
        gateway.clone(),
    );
    let auth_service = AuthService::new(
        db_pool.clone(),
        referral_service.clone(),
        config.jwt_secret.clone(),
        config.jwt_access_token_ttl_seconds,
    );
    let messaging_service = MessagingService::new(db_pool.clone(), notifier.clone());
    let activity_service = ActivityService::new(db_pool.clone());

    let app_state = AppState {
        auth_service: Arc::new(auth_service),
        ledger_service: Arc::new(ledger_service),
        referral_service: Arc::new(referral_service),
        request_service: Arc::new(request_service),
        wallet_service: Arc::new(wallet_service),
        fee_service: Arc::new(fee_service),
        messaging_service: Arc::new(messaging_service),
        activity_service: Arc::new(activity_service),
        document_store,
    };

    // Clone db_pool for health check
    let health_db_pool = db_pool.clone();

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::wallet_routes())
        .merge(routes::request_routes())
        .merge(routes::referral_routes())
        .merge(routes::fee_routes())
        .merge(routes::messaging_routes())
        .merge(routes::document_routes())
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(&config));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "Coursio API Server"
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    version: String,
}

/// Health check endpoint
async fn health_check(pool: sqlx::PgPool) -> axum::Json<HealthResponse> {
    let db_status = match db::check_health(&pool).await {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    let status = if db_status == "connected" {
        "healthy"
    } else {
        "unhealthy"
    };

    axum::Json(HealthResponse {
        status: status.to_string(),
        database: db_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins_str = config.cors_allowed_origins.clone().unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
