//! Request lifecycle tests
//!
//! Walk the state machine end to end against a real database
//! (TEST_DATABASE_URL); run with `cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use coursio_server::fees::FeeService;
use coursio_server::ledger::{EntryKind, LedgerService};
use coursio_server::models::{PaymentMethod, ServiceType};
use coursio_server::notify::LogNotifier;
use coursio_server::payment::MockPaymentGateway;
use coursio_server::request::{
    RequestError, RequestService, RequestStatus, SubmitServiceRequest,
};

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

fn request_service(pool: &PgPool) -> RequestService {
    RequestService::new(
        pool.clone(),
        FeeService::new(pool.clone()),
        Arc::new(MockPaymentGateway),
        Arc::new(LogNotifier),
    )
}

async fn create_user(pool: &PgPool, role: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, account_status,
                           wallet_balance, referral_count, created_at, updated_at)
        VALUES ($1, $2, $3, '', $4::user_role, 'approved', 0, 0, NOW(), NOW())
        "#,
    )
    .bind(id)
    .bind(format!("Test {} {}", role, id))
    .bind(format!("{}-{}@test.local", role, id))
    .bind(role)
    .execute(pool)
    .await
    .expect("Failed to insert test user");
    id
}

fn wallet_submission(details: &str) -> SubmitServiceRequest {
    SubmitServiceRequest {
        request_type: ServiceType::EtatCivil,
        details: details.to_string(),
        attachments: vec!["cni.pdf".to_string()],
        payment_method: PaymentMethod::Wallet,
        charge_token: None,
    }
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_wallet_submission_debits_exact_price() {
    // Scenario A: balance 5000, ETAT_CIVIL priced 5000 via WALLET
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();

    let request = service
        .submit(client, wallet_submission("Acte de Naissance (Copie)"))
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.price, 5000);
    assert_eq!(ledger.balance_of(client).await.unwrap(), 0);

    let history = ledger.history_of(client).await.unwrap();
    let payment = history
        .iter()
        .find(|e| e.kind == EntryKind::ServicePayment)
        .expect("service payment entry must exist");
    assert_eq!(payment.amount, -5000);
    assert_eq!(payment.related_request_id, Some(request.id));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_insufficient_funds_creates_nothing() {
    // Scenario B: balance 0 submission fails atomically
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    let result = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await;
    assert!(matches!(result, Err(RequestError::Ledger(_))));

    assert_eq!(ledger.balance_of(client).await.unwrap(), 0);
    assert!(ledger.history_of(client).await.unwrap().is_empty());

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM service_requests WHERE client_id = $1")
            .bind(client)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0, "no request row may survive a failed debit");
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_assign_process_close_pays_commission() {
    // Scenario C: assign, start, close; agent earns 10% of 5000
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;
    let agent = create_user(&pool, "agent").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();

    let assigned = service.assign(request.id, agent).await.unwrap();
    assert_eq!(assigned.assigned_agent_id, Some(agent));
    assert_eq!(assigned.status, RequestStatus::Pending);

    let processing = service.start_processing(request.id).await.unwrap();
    assert_eq!(processing.status, RequestStatus::InProgress);

    // start_processing is an idempotent no-op when already in progress
    let again = service.start_processing(request.id).await.unwrap();
    assert_eq!(again.status, RequestStatus::InProgress);

    let closed = service
        .close(request.id, Some("acte_final.pdf".to_string()), false)
        .await
        .unwrap();
    assert_eq!(closed.status, RequestStatus::Validated);
    assert_eq!(closed.final_document.as_deref(), Some("acte_final.pdf"));

    assert_eq!(ledger.balance_of(agent).await.unwrap(), 500);
    let history = ledger.history_of(agent).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, EntryKind::AgentCommission);
    assert_eq!(history[0].related_request_id, Some(request.id));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_close_without_agent_skips_commission() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();

    let closed = service
        .close(request.id, Some("acte.pdf".to_string()), false)
        .await
        .unwrap();
    assert_eq!(closed.status, RequestStatus::Validated);
    assert_eq!(closed.assigned_agent_id, None);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_terminal_states_are_immutable() {
    // Scenario E: every further transition fails with AlreadyTerminal
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;
    let agent = create_user(&pool, "agent").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();
    service
        .close(request.id, Some("acte.pdf".to_string()), false)
        .await
        .unwrap();

    assert!(matches!(
        service.reject(request.id, None).await,
        Err(RequestError::AlreadyTerminal(_))
    ));
    assert!(matches!(
        service.assign(request.id, agent).await,
        Err(RequestError::AlreadyTerminal(_))
    ));
    assert!(matches!(
        service.start_processing(request.id).await,
        Err(RequestError::AlreadyTerminal(_))
    ));
    assert!(matches!(
        service.close(request.id, Some("x.pdf".to_string()), false).await,
        Err(RequestError::AlreadyTerminal(_))
    ));

    let unchanged = service.get(request.id).await.unwrap();
    assert_eq!(unchanged.status, RequestStatus::Validated);
    assert_eq!(unchanged.final_document.as_deref(), Some("acte.pdf"));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_close_without_document_requires_force() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();

    assert!(matches!(
        service.close(request.id, None, false).await,
        Err(RequestError::MissingFinalDocument)
    ));

    // Explicit confirmation permits the documentless close
    let closed = service.close(request.id, None, true).await.unwrap();
    assert_eq!(closed.status, RequestStatus::Validated);
    assert_eq!(closed.final_document, None);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_direct_submission_requires_verified_charge() {
    let pool = setup_test_db().await;
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    // No token
    let result = service
        .submit(
            client,
            SubmitServiceRequest {
                request_type: ServiceType::CasierJudiciaire,
                details: "Bulletin n°3".to_string(),
                attachments: vec![],
                payment_method: PaymentMethod::Direct,
                charge_token: None,
            },
        )
        .await;
    assert!(matches!(result, Err(RequestError::ExternalChargeFailed(_))));

    // Forged token
    let result = service
        .submit(
            client,
            SubmitServiceRequest {
                request_type: ServiceType::CasierJudiciaire,
                details: "Bulletin n°3".to_string(),
                attachments: vec![],
                payment_method: PaymentMethod::Direct,
                charge_token: Some("forged".to_string()),
            },
        )
        .await;
    assert!(matches!(result, Err(RequestError::ExternalChargeFailed(_))));

    // Gateway-issued token for the exact price (3500)
    let token = coursio_server::payment::MockPaymentGateway::issue_token(3500);
    let request = service
        .submit(
            client,
            SubmitServiceRequest {
                request_type: ServiceType::CasierJudiciaire,
                details: "Bulletin n°3".to_string(),
                attachments: vec![],
                payment_method: PaymentMethod::Direct,
                charge_token: Some(token),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.price, 3500);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_assign_rejects_non_agents() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;
    let other_client = create_user(&pool, "client").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();

    assert!(matches!(
        service.assign(request.id, other_client).await,
        Err(RequestError::AgentNotFound)
    ));
    assert!(matches!(
        service.assign(request.id, Uuid::new_v4()).await,
        Err(RequestError::AgentNotFound)
    ));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_reject_without_refund_by_default() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let service = request_service(&pool);
    let client = create_user(&pool, "client").await;

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(client, wallet_submission("Acte de Naissance"))
        .await
        .unwrap();

    let rejected = service
        .reject(request.id, Some("Pièces illisibles".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Pièces illisibles"));

    // Default policy: no automatic refund
    assert_eq!(ledger.balance_of(client).await.unwrap(), 0);
}
