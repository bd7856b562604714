//! Request lifecycle service layer
//!
//! Every transition locks the request row (`SELECT ... FOR UPDATE`), so
//! two transitions on the same request cannot interleave. Gateway calls
//! for DIRECT payments happen before any lock is taken.

use std::sync::Arc;

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::fees::{FeeError, FeeService};
use crate::ledger::{EntryKind, LedgerError, LedgerService};
use crate::models::{AccountStatus, PaymentMethod, UserRole};
use crate::notify::{self, Notifier};
use crate::payment::PaymentGateway;

use super::model::{ListRequestsQuery, RequestStatus, ServiceRequest, SubmitServiceRequest};

/// Lifecycle engine errors
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request is already in terminal state {0}")]
    AlreadyTerminal(String),

    #[error("agent not found")]
    AgentNotFound,

    #[error("request not found")]
    RequestNotFound,

    #[error("a final document is required to close this request")]
    MissingFinalDocument,

    #[error("external charge failed: {0}")]
    ExternalChargeFailed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FeeError> for RequestError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Database(e) => RequestError::Database(e),
            other => RequestError::Database(sqlx::Error::Protocol(other.to_string())),
        }
    }
}

/// Request lifecycle service
pub struct RequestService {
    db_pool: PgPool,
    fee_service: FeeService,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl RequestService {
    pub fn new(
        db_pool: PgPool,
        fee_service: FeeService,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            db_pool,
            fee_service,
            gateway,
            notifier,
        }
    }

    /// Submit a new request. WALLET payments debit the client in the same
    /// transaction that persists the request: on `InsufficientFunds`
    /// neither a request nor a ledger entry survives. DIRECT payments are
    /// gateway-verified before anything is written.
    pub async fn submit(
        &self,
        client_id: Uuid,
        submission: SubmitServiceRequest,
    ) -> Result<ServiceRequest, RequestError> {
        let config = self.fee_service.load().await?;
        let price = config.price_of(submission.request_type);

        if submission.payment_method == PaymentMethod::Direct {
            let token = submission.charge_token.as_deref().ok_or_else(|| {
                RequestError::ExternalChargeFailed("missing charge token".to_string())
            })?;
            self.gateway
                .verify_charge(token, price)
                .await
                .map_err(|e| RequestError::ExternalChargeFailed(e.to_string()))?;
        }

        let request_id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.db_pool.begin().await?;

        if submission.payment_method == PaymentMethod::Wallet {
            LedgerService::debit_in_tx(
                &mut tx,
                client_id,
                price,
                EntryKind::ServicePayment,
                Some(request_id),
            )
            .await?;
        }

        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (
                id, request_type, status, client_id, details, attachments,
                payment_method, price, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(submission.request_type)
        .bind(RequestStatus::Pending)
        .bind(client_id)
        .bind(&submission.details)
        .bind(&submission.attachments)
        .bind(submission.payment_method)
        .bind(price)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request_id,
            client_id = %client_id,
            request_type = ?submission.request_type,
            price = price,
            "Service request submitted"
        );

        Ok(request)
    }

    /// Assign (or reassign) an agent. Permitted in any non-terminal state;
    /// does not change the status.
    pub async fn assign(
        &self,
        request_id: Uuid,
        agent_id: Uuid,
    ) -> Result<ServiceRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;

        let request = Self::lock_request(&mut tx, request_id).await?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyTerminal(
                request.status.as_str().to_string(),
            ));
        }

        let agent = sqlx::query_as::<_, (UserRole, AccountStatus)>(
            "SELECT role, account_status FROM users WHERE id = $1",
        )
        .bind(agent_id)
        .fetch_optional(&mut *tx)
        .await?;

        match agent {
            Some((UserRole::Agent, AccountStatus::Approved)) => {}
            _ => return Err(RequestError::AgentNotFound),
        }

        let updated = sqlx::query_as::<_, ServiceRequest>(
            "UPDATE service_requests SET assigned_agent_id = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(agent_id)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(request_id = %request_id, agent_id = %agent_id, "Request assigned");

        Ok(updated)
    }

    /// PENDING → IN_PROGRESS. Calling it on a request already in progress
    /// is an idempotent no-op.
    pub async fn start_processing(&self, request_id: Uuid) -> Result<ServiceRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;

        let request = Self::lock_request(&mut tx, request_id).await?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyTerminal(
                request.status.as_str().to_string(),
            ));
        }
        if request.status == RequestStatus::InProgress {
            tx.commit().await?;
            return Ok(request);
        }

        let updated = sqlx::query_as::<_, ServiceRequest>(
            "UPDATE service_requests SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(RequestStatus::InProgress)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.fire_status_notification(&updated);

        Ok(updated)
    }

    /// PENDING or IN_PROGRESS → VALIDATED. Stores the final document and
    /// credits the assigned agent's commission in the same transaction.
    /// A documentless close requires the explicit `force` confirmation.
    pub async fn close(
        &self,
        request_id: Uuid,
        final_document: Option<String>,
        force: bool,
    ) -> Result<ServiceRequest, RequestError> {
        if final_document.is_none() && !force {
            return Err(RequestError::MissingFinalDocument);
        }

        let mut tx = self.db_pool.begin().await?;

        let request = Self::lock_request(&mut tx, request_id).await?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyTerminal(
                request.status.as_str().to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $1, final_document = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(RequestStatus::Validated)
        .bind(&final_document)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;

        // No assigned agent means no commission; that is not an error.
        if let Some(agent_id) = updated.assigned_agent_id {
            let percent = sqlx::query_scalar::<_, i64>(
                "SELECT commission_agent_percent FROM fee_config",
            )
            .fetch_one(&mut *tx)
            .await?;

            let commission = updated.price * percent / 100;
            if commission > 0 {
                LedgerService::credit_in_tx(
                    &mut tx,
                    agent_id,
                    commission,
                    EntryKind::AgentCommission,
                    Some(request_id),
                )
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(request_id = %request_id, "Request validated");

        self.fire_status_notification(&updated);

        Ok(updated)
    }

    /// Any non-terminal state → REJECTED. When the rejection-refund policy
    /// is enabled, a WALLET-paid request gets a compensating credit in the
    /// same transaction.
    pub async fn reject(
        &self,
        request_id: Uuid,
        reason: Option<String>,
    ) -> Result<ServiceRequest, RequestError> {
        let mut tx = self.db_pool.begin().await?;
        let updated = Self::reject_in_tx(&mut tx, request_id, reason).await?;
        tx.commit().await?;

        tracing::info!(request_id = %request_id, "Request rejected");

        self.fire_status_notification(&updated);

        Ok(updated)
    }

    /// Rejection body shared with the anonymizing user-deletion cascade.
    pub async fn reject_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
        reason: Option<String>,
    ) -> Result<ServiceRequest, RequestError> {
        let request = Self::lock_request(tx, request_id).await?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyTerminal(
                request.status.as_str().to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $1, rejection_reason = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(RequestStatus::Rejected)
        .bind(&reason)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_one(&mut **tx)
        .await?;

        if updated.payment_method == PaymentMethod::Wallet {
            let refund = sqlx::query_scalar::<_, bool>(
                "SELECT refund_rejected_wallet_payments FROM fee_config",
            )
            .fetch_one(&mut **tx)
            .await?;

            if refund {
                LedgerService::credit_in_tx(
                    tx,
                    updated.client_id,
                    updated.price,
                    EntryKind::ServicePayment,
                    Some(request_id),
                )
                .await?;
            }
        }

        Ok(updated)
    }

    /// Fetch a single request.
    pub async fn get(&self, request_id: Uuid) -> Result<ServiceRequest, RequestError> {
        sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(RequestError::RequestNotFound)
    }

    /// List requests with filtering and pagination.
    pub async fn list(&self, query: ListRequestsQuery) -> Result<Vec<ServiceRequest>, RequestError> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM service_requests WHERE 1=1");

        if let Some(status) = query.status {
            query_builder.push(" AND status = ");
            query_builder.push_bind(status);
        }
        if let Some(client_id) = query.client_id {
            query_builder.push(" AND client_id = ");
            query_builder.push_bind(client_id);
        }
        if let Some(agent_id) = query.assigned_agent_id {
            query_builder.push(" AND assigned_agent_id = ");
            query_builder.push_bind(agent_id);
        }

        query_builder.push(" ORDER BY created_at DESC LIMIT ");
        query_builder.push_bind(limit);
        query_builder.push(" OFFSET ");
        query_builder.push_bind(offset);

        let requests = query_builder
            .build_query_as::<ServiceRequest>()
            .fetch_all(&self.db_pool)
            .await?;

        Ok(requests)
    }

    /// Lock the request row for the duration of the transaction.
    async fn lock_request(
        tx: &mut Transaction<'_, Postgres>,
        request_id: Uuid,
    ) -> Result<ServiceRequest, RequestError> {
        sqlx::query_as::<_, ServiceRequest>(
            "SELECT * FROM service_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RequestError::RequestNotFound)
    }

    fn fire_status_notification(&self, request: &ServiceRequest) {
        notify::notify_status_change(
            self.notifier.clone(),
            request.client_id,
            request.id,
            request.status,
        );
    }
}
