//! Referral graph
//!
//! Records who referred whom and pays the one-time sponsor bonus. The
//! `referrals.referred_id` primary key is the exactly-once guard: a
//! retried registration inserts nothing and therefore credits nothing.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{EntryKind, LedgerError, LedgerService};
use crate::models::User;

/// Referral failures
#[derive(Error, Debug)]
pub enum ReferralError {
    #[error("unknown referral code: {0}")]
    UnknownReferralCode(String),

    #[error("a referral code cannot be applied to its own owner")]
    SelfReferral,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Client-facing affiliate summary
#[derive(Debug, Serialize)]
pub struct ReferralStats {
    pub referral_code: Option<String>,
    pub referral_count: i32,
    pub total_earnings: i64,
}

/// Referral service
#[derive(Clone)]
pub struct ReferralService {
    db_pool: PgPool,
}

impl ReferralService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Record the referral edge for a freshly registered user and credit
    /// the sponsor exactly once. Idempotent for a given `new_user_id`.
    pub async fn register_referral(
        &self,
        new_user_id: Uuid,
        supplied_code: &str,
    ) -> Result<(), ReferralError> {
        let code = supplied_code.trim().to_uppercase();

        let mut tx = self.db_pool.begin().await?;

        let referrer_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE referral_code = $1",
        )
        .bind(&code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ReferralError::UnknownReferralCode(code.clone()))?;

        if referrer_id == new_user_id {
            return Err(ReferralError::SelfReferral);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO referrals (referred_id, referrer_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (referred_id) DO NOTHING
            "#,
        )
        .bind(new_user_id)
        .bind(referrer_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Edge already present: a retried registration must not credit twice.
        if inserted == 0 {
            tx.commit().await?;
            return Ok(());
        }

        let bonus =
            sqlx::query_scalar::<_, i64>("SELECT referral_bonus FROM fee_config")
                .fetch_one(&mut *tx)
                .await?;

        LedgerService::credit_in_tx(&mut tx, referrer_id, bonus, EntryKind::ReferralBonus, None)
            .await?;

        sqlx::query("UPDATE users SET referral_count = referral_count + 1 WHERE id = $1")
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            referrer_id = %referrer_id,
            referred_id = %new_user_id,
            bonus = bonus,
            "Referral recorded"
        );

        Ok(())
    }

    /// Resolve the owner of a referral code.
    pub async fn code_owner(&self, code: &str) -> Result<Option<User>, ReferralError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone_number, password_hash, role, account_status,
                   zone, wallet_balance, referral_code, referral_count, created_at, updated_at
            FROM users
            WHERE referral_code = $1
            "#,
        )
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    /// Affiliate summary for a client's dashboard.
    pub async fn stats(&self, user_id: Uuid) -> Result<ReferralStats, ReferralError> {
        let row = sqlx::query_as::<_, (Option<String>, i32)>(
            "SELECT referral_code, referral_count FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(ReferralError::Ledger(LedgerError::UserNotFound))?;

        let total_earnings = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT SUM(amount) FROM ledger_entries WHERE user_id = $1 AND kind = 'referral_bonus'",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?
        .unwrap_or(0);

        Ok(ReferralStats {
            referral_code: row.0,
            referral_count: row.1,
            total_earnings,
        })
    }

    /// Generate a fresh, unique referral code for a new client. Codes are
    /// short, uppercase and URL-query-safe (e.g. `JEAN2023`).
    pub async fn generate_code(&self, name: &str) -> Result<String, ReferralError> {
        loop {
            let candidate = candidate_code(name, &mut rand::thread_rng());
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE referral_code = $1",
            )
            .bind(&candidate)
            .fetch_one(&self.db_pool)
            .await?;

            if taken == 0 {
                return Ok(candidate);
            }
        }
    }
}

/// Uppercase alphabetic prefix of the holder's name plus random digits.
fn candidate_code(name: &str, rng: &mut impl Rng) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() {
        "USER".to_string()
    } else {
        prefix
    };
    format!("{}{}", prefix, rng.gen_range(10..10000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_code_shape() {
        let mut rng = rand::thread_rng();
        let code = candidate_code("Jean Dupont", &mut rng);
        assert!(code.starts_with("JEAN"));
        assert!(code.len() > 4 && code.len() <= 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_candidate_code_short_name() {
        let mut rng = rand::thread_rng();
        let code = candidate_code("Ami", &mut rng);
        assert!(code.starts_with("AMI"));
    }

    #[test]
    fn test_candidate_code_non_alphabetic_name() {
        let mut rng = rand::thread_rng();
        let code = candidate_code("123 !!", &mut rng);
        assert!(code.starts_with("USER"));
    }

    #[test]
    fn test_candidate_code_url_safe() {
        let mut rng = rand::thread_rng();
        for name in ["Jean Dupont", "Aminata Diallo", "Ömer Ünal", ""] {
            let code = candidate_code(name, &mut rng);
            assert!(!code.contains(' '));
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
