//! Ledger service layer
//!
//! Debits and credits for a given user are serialized through a
//! `SELECT ... FOR UPDATE` on the user row, so the balance check in
//! `debit` cannot race a concurrent write on the same user. Callers that
//! need to compose a ledger write with their own rows (request submission,
//! commission on close) use the `_in_tx` variants inside one transaction.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use super::model::{EntryKind, LedgerEntry};

/// Ledger operation errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("user not found")]
    UserNotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Ledger service over the shared pool
#[derive(Clone)]
pub struct LedgerService {
    db_pool: PgPool,
}

impl LedgerService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Debit a user's wallet. Fails with `InsufficientFunds` if the entry
    /// would drive the balance negative; nothing is written in that case.
    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        related_request_id: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut tx = self.db_pool.begin().await?;
        let entry = Self::debit_in_tx(&mut tx, user_id, amount, kind, related_request_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Credit a user's wallet. `amount` must be strictly positive.
    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        related_request_id: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut tx = self.db_pool.begin().await?;
        let entry = Self::credit_in_tx(&mut tx, user_id, amount, kind, related_request_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Debit inside a caller-owned transaction. Takes the user row lock,
    /// verifies the resulting balance stays non-negative, then appends.
    pub async fn debit_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        related_request_id: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let balance = Self::lock_balance(tx, user_id).await?;
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        Self::append(tx, user_id, -amount, kind, related_request_id).await
    }

    /// Credit inside a caller-owned transaction.
    pub async fn credit_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        amount: i64,
        kind: EntryKind,
        related_request_id: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        Self::lock_balance(tx, user_id).await?;
        Self::append(tx, user_id, amount, kind, related_request_id).await
    }

    /// Current cached balance for a user.
    pub async fn balance_of(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>("SELECT wallet_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    /// Balance recomputed as a fold over the user's entries. Equal to
    /// `balance_of` at all times; exposed for consistency checks.
    pub async fn computed_balance_of(&self, user_id: Uuid) -> Result<i64, LedgerError> {
        let sum = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT SUM(amount) FROM ledger_entries WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(sum.unwrap_or(0))
    }

    /// All entries for a user, most recent first.
    pub async fn history_of(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, user_id, amount, kind, related_request_id, created_at
            FROM ledger_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(entries)
    }

    /// Lock the user row and return the cached balance.
    async fn lock_balance(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<i64, LedgerError> {
        sqlx::query_scalar::<_, i64>("SELECT wallet_balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(LedgerError::UserNotFound)
    }

    /// Append the entry and move the cached balance in the same
    /// transaction. The user row lock is already held.
    async fn append(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        signed_amount: i64,
        kind: EntryKind,
        related_request_id: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        let now = Utc::now();
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            amount: signed_amount,
            kind,
            related_request_id,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, user_id, amount, kind, related_request_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(entry.kind)
        .bind(entry.related_request_id)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        sqlx::query("UPDATE users SET wallet_balance = wallet_balance + $1, updated_at = $2 WHERE id = $3")
            .bind(signed_amount)
            .bind(now)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        tracing::info!(
            user_id = %user_id,
            amount = signed_amount,
            kind = ?kind,
            "Ledger entry appended"
        );

        Ok(entry)
    }
}
