//! Referral bonus and wallet operation tests
//!
//! Require a provisioned PostgreSQL database (TEST_DATABASE_URL); run with
//! `cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use coursio_server::fees::FeeService;
use coursio_server::ledger::{EntryKind, LedgerError, LedgerService};
use coursio_server::payment::{MockPaymentGateway, PaymentGateway};
use coursio_server::referral::{ReferralError, ReferralService};
use coursio_server::wallet::{WalletError, WalletService};

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

async fn create_client_with_code(pool: &PgPool, code: Option<&str>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, account_status,
                           wallet_balance, referral_code, referral_count, created_at, updated_at)
        VALUES ($1, $2, $3, '', 'client', 'approved', 0, $4, 0, NOW(), NOW())
        "#,
    )
    .bind(id)
    .bind(format!("Test Client {}", id))
    .bind(format!("client-{}@test.local", id))
    .bind(code)
    .execute(pool)
    .await
    .expect("Failed to insert test client");
    id
}

fn unique_code() -> String {
    // Referral codes are uppercase alphanumerics; derive one from a UUID
    format!(
        "REF{}",
        Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    )
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_referral_bonus_credited_exactly_once() {
    // Scenario D: the sponsor earns the bonus once, retries change nothing
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let referral = ReferralService::new(pool.clone());

    let code = unique_code();
    let referrer = create_client_with_code(&pool, Some(&code)).await;
    let referred = create_client_with_code(&pool, None).await;

    referral.register_referral(referred, &code).await.unwrap();

    assert_eq!(ledger.balance_of(referrer).await.unwrap(), 500);
    let count: i32 = sqlx::query_scalar("SELECT referral_count FROM users WHERE id = $1")
        .bind(referrer)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Retrying the registration handler must not double-credit
    referral.register_referral(referred, &code).await.unwrap();

    assert_eq!(ledger.balance_of(referrer).await.unwrap(), 500);
    let bonus_entries: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_entries WHERE user_id = $1 AND kind = 'referral_bonus'",
    )
    .bind(referrer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(bonus_entries, 1);

    let count: i32 = sqlx::query_scalar("SELECT referral_count FROM users WHERE id = $1")
        .bind(referrer)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_unknown_and_self_referral_rejected() {
    let pool = setup_test_db().await;
    let referral = ReferralService::new(pool.clone());

    let code = unique_code();
    let owner = create_client_with_code(&pool, Some(&code)).await;

    assert!(matches!(
        referral.register_referral(owner, "NOSUCHCODE1").await,
        Err(ReferralError::UnknownReferralCode(_))
    ));
    assert!(matches!(
        referral.register_referral(owner, &code).await,
        Err(ReferralError::SelfReferral)
    ));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_referral_stats_projection() {
    let pool = setup_test_db().await;
    let referral = ReferralService::new(pool.clone());

    let code = unique_code();
    let referrer = create_client_with_code(&pool, Some(&code)).await;
    let referred_a = create_client_with_code(&pool, None).await;
    let referred_b = create_client_with_code(&pool, None).await;

    referral.register_referral(referred_a, &code).await.unwrap();
    referral.register_referral(referred_b, &code).await.unwrap();

    let stats = referral.stats(referrer).await.unwrap();
    assert_eq!(stats.referral_code.as_deref(), Some(code.as_str()));
    assert_eq!(stats.referral_count, 2);
    assert_eq!(stats.total_earnings, 1000);

    let owner = referral.code_owner(&code).await.unwrap().unwrap();
    assert_eq!(owner.id, referrer);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_recharge_requires_verified_charge() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let wallet = WalletService::new(
        ledger.clone(),
        FeeService::new(pool.clone()),
        Arc::new(MockPaymentGateway),
    );
    let user = create_client_with_code(&pool, None).await;

    // Forged token
    assert!(matches!(
        wallet.recharge(user, 10000, "forged").await,
        Err(WalletError::ExternalChargeFailed(_))
    ));
    assert_eq!(ledger.balance_of(user).await.unwrap(), 0);

    // Below the minimum
    let token = MockPaymentGateway::issue_token(100);
    assert!(matches!(
        wallet.recharge(user, 100, &token).await,
        Err(WalletError::BelowMinimum { .. })
    ));

    // Verified charge
    let token = MockPaymentGateway::issue_token(10000);
    let entry = wallet.recharge(user, 10000, &token).await.unwrap();
    assert_eq!(entry.kind, EntryKind::WalletRecharge);
    assert_eq!(ledger.balance_of(user).await.unwrap(), 10000);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_withdrawal_validates_balance_and_minimum() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let wallet = WalletService::new(
        ledger.clone(),
        FeeService::new(pool.clone()),
        Arc::new(MockPaymentGateway),
    );
    let user = create_client_with_code(&pool, None).await;

    ledger
        .credit(user, 8000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();

    // Below the configured minimum of 5000
    assert!(matches!(
        wallet.withdraw(user, 2000, "ORANGE_MONEY", "+223 70 80 90 00").await,
        Err(WalletError::BelowMinimum { .. })
    ));

    // More than the balance
    assert!(matches!(
        wallet.withdraw(user, 9000, "ORANGE_MONEY", "+223 70 80 90 00").await,
        Err(WalletError::Ledger(LedgerError::InsufficientFunds { .. }))
    ));

    let entry = wallet
        .withdraw(user, 6000, "ORANGE_MONEY", "+223 70 80 90 00")
        .await
        .unwrap();
    assert_eq!(entry.amount, -6000);
    assert_eq!(ledger.balance_of(user).await.unwrap(), 2000);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_failed_payout_reverses_withdrawal() {
    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let wallet = WalletService::new(
        ledger.clone(),
        FeeService::new(pool.clone()),
        Arc::new(MockPaymentGateway),
    );
    let user = create_client_with_code(&pool, None).await;

    ledger
        .credit(user, 8000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();

    // The mock gateway refuses destination "FAIL"
    let result = wallet.withdraw(user, 6000, "ORANGE_MONEY", "FAIL").await;
    assert!(matches!(result, Err(WalletError::ExternalChargeFailed(_))));

    // Debit and compensating credit both exist; the balance is restored
    assert_eq!(ledger.balance_of(user).await.unwrap(), 8000);
    let withdrawal_entries: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_entries WHERE user_id = $1 AND kind = 'withdrawal'",
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(withdrawal_entries, 2);
    assert_eq!(
        ledger.balance_of(user).await.unwrap(),
        ledger.computed_balance_of(user).await.unwrap()
    );
}

#[tokio::test]
#[ignore] // Requires database setup; toggles global config, run serially
async fn test_reject_refunds_when_policy_enabled() {
    use coursio_server::fees::UpdateFeeConfigRequest;
    use coursio_server::models::{PaymentMethod, ServiceType};
    use coursio_server::notify::LogNotifier;
    use coursio_server::request::{RequestService, RequestStatus, SubmitServiceRequest};

    let pool = setup_test_db().await;
    let ledger = LedgerService::new(pool.clone());
    let fees = FeeService::new(pool.clone());
    let service = RequestService::new(
        pool.clone(),
        fees.clone(),
        Arc::new(MockPaymentGateway),
        Arc::new(LogNotifier),
    );
    let client = create_client_with_code(&pool, None).await;

    fees.update(UpdateFeeConfigRequest {
        etat_civil: None,
        casier_judiciaire: None,
        legalisation: None,
        creation_entreprise: None,
        gestion_dossier: None,
        commission_agent_percent: None,
        referral_bonus: None,
        min_withdrawal: None,
        refund_rejected_wallet_payments: Some(true),
    })
    .await
    .unwrap();

    ledger
        .credit(client, 5000, EntryKind::WalletRecharge, None)
        .await
        .unwrap();
    let request = service
        .submit(
            client,
            SubmitServiceRequest {
                request_type: ServiceType::EtatCivil,
                details: "Acte de Naissance".to_string(),
                attachments: vec![],
                payment_method: PaymentMethod::Wallet,
                charge_token: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(ledger.balance_of(client).await.unwrap(), 0);

    let rejected = service.reject(request.id, None).await.unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);

    // Policy on: the wallet payment came back
    assert_eq!(ledger.balance_of(client).await.unwrap(), 5000);

    // Restore the default policy
    fees.update(UpdateFeeConfigRequest {
        etat_civil: None,
        casier_judiciaire: None,
        legalisation: None,
        creation_entreprise: None,
        gestion_dossier: None,
        commission_agent_percent: None,
        referral_bonus: None,
        min_withdrawal: None,
        refund_rejected_wallet_payments: Some(false),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_mock_gateway_round_trip() {
    // No database needed: the gateway boundary is pure
    let token = MockPaymentGateway::issue_token(2500);
    let confirmation = MockPaymentGateway.verify_charge(&token, 2500).await.unwrap();
    assert_eq!(confirmation.amount, 2500);
    assert!(MockPaymentGateway.verify_charge(&token, 9999).await.is_err());
}
