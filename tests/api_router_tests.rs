//! End-to-end tests through the HTTP router
//!
//! Drive the assembled router with in-memory requests. Require a
//! provisioned PostgreSQL database (TEST_DATABASE_URL); run with
//! `cargo test -- --ignored`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use coursio_server::activity::ActivityService;
use coursio_server::auth::AuthService;
use coursio_server::fees::FeeService;
use coursio_server::ledger::LedgerService;
use coursio_server::messaging::MessagingService;
use coursio_server::notify::{LogNotifier, Notifier};
use coursio_server::payment::MockPaymentGateway;
use coursio_server::referral::ReferralService;
use coursio_server::request::RequestService;
use coursio_server::routes;
use coursio_server::state::AppState;
use coursio_server::storage::FsDocumentStore;
use coursio_server::wallet::WalletService;

async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/coursio_test".to_string());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

fn build_app(pool: &PgPool) -> Router {
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let gateway = Arc::new(MockPaymentGateway);
    let document_dir = std::env::temp_dir().join(format!("coursio-test-{}", Uuid::new_v4()));

    let ledger_service = LedgerService::new(pool.clone());
    let fee_service = FeeService::new(pool.clone());
    let referral_service = ReferralService::new(pool.clone());

    let state = AppState {
        auth_service: Arc::new(AuthService::new(
            pool.clone(),
            referral_service.clone(),
            "test-secret".to_string(),
            3600,
        )),
        ledger_service: Arc::new(ledger_service.clone()),
        referral_service: Arc::new(referral_service),
        request_service: Arc::new(RequestService::new(
            pool.clone(),
            fee_service.clone(),
            gateway.clone(),
            notifier.clone(),
        )),
        wallet_service: Arc::new(WalletService::new(
            ledger_service,
            fee_service.clone(),
            gateway,
        )),
        fee_service: Arc::new(fee_service),
        messaging_service: Arc::new(MessagingService::new(pool.clone(), notifier)),
        activity_service: Arc::new(ActivityService::new(pool.clone())),
        document_store: Arc::new(FsDocumentStore::new(document_dir)),
    };

    Router::new()
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::wallet_routes())
        .merge(routes::request_routes())
        .merge(routes::referral_routes())
        .merge(routes::fee_routes())
        .merge(routes::messaging_routes())
        .merge(routes::document_routes())
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_fee_config_is_public() {
    let pool = setup_test_db().await;
    let app = build_app(&pool);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/config/fees")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["etat_civil"], 5000);
    assert_eq!(json["casier_judiciaire"], 3500);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_register_then_login_flow() {
    let pool = setup_test_db().await;
    let app = build_app(&pool);

    let email = format!("router-{}@test.local", Uuid::new_v4());
    let register_body = serde_json::json!({
        "name": "Jean Dupont",
        "email": email,
        "password": "client123secret",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["user"]["referral_code"].is_string());
    assert_eq!(json["referral_applied"], false);

    let login_body = serde_json::json!({
        "email": email,
        "password": "client123secret",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(login_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_eq!(json["token_type"], "Bearer");
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_bad_credentials_rejected_with_stable_code() {
    let pool = setup_test_db().await;
    let app = build_app(&pool);

    let login_body = serde_json::json!({
        "email": "nobody@test.local",
        "password": "wrong",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(login_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_protected_routes_require_token() {
    let pool = setup_test_db().await;
    let app = build_app(&pool);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/wallet/balance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
