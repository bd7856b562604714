//! Fee schedule and commission configuration
//!
//! A single admin-editable row drives service pricing, agent commission,
//! the referral bonus and the rejection-refund policy. Read by the request
//! engine, wallet and referral services; mutated only through the explicit
//! admin update operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use crate::models::ServiceType;

/// Fee configuration errors
#[derive(Error, Debug)]
pub enum FeeError {
    #[error("invalid percent: {0} (expected 0..=100)")]
    InvalidPercent(i64),

    #[error("invalid fee for {service:?}: {amount}")]
    InvalidFee { service: ServiceType, amount: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Process-wide pricing and commission parameters (FCFA integers)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct FeeConfig {
    pub etat_civil: i64,
    pub casier_judiciaire: i64,
    pub legalisation: i64,
    pub creation_entreprise: i64,
    pub gestion_dossier: i64,
    pub commission_agent_percent: i64,
    pub referral_bonus: i64,
    pub min_withdrawal: i64,
    pub refund_rejected_wallet_payments: bool,
    pub updated_at: DateTime<Utc>,
}

impl FeeConfig {
    /// Price for a service type
    pub fn price_of(&self, service: ServiceType) -> i64 {
        match service {
            ServiceType::EtatCivil => self.etat_civil,
            ServiceType::CasierJudiciaire => self.casier_judiciaire,
            ServiceType::Legalisation => self.legalisation,
            ServiceType::CreationEntreprise => self.creation_entreprise,
            ServiceType::GestionDossier => self.gestion_dossier,
        }
    }

    /// Agent commission for a given request price
    pub fn commission_for(&self, price: i64) -> i64 {
        price * self.commission_agent_percent / 100
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            etat_civil: 5000,
            casier_judiciaire: 3500,
            legalisation: 2000,
            creation_entreprise: 50000,
            gestion_dossier: 5000,
            commission_agent_percent: 10,
            referral_bonus: 500,
            min_withdrawal: 5000,
            refund_rejected_wallet_payments: false,
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

/// Partial admin update; omitted fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateFeeConfigRequest {
    pub etat_civil: Option<i64>,
    pub casier_judiciaire: Option<i64>,
    pub legalisation: Option<i64>,
    pub creation_entreprise: Option<i64>,
    pub gestion_dossier: Option<i64>,
    pub commission_agent_percent: Option<i64>,
    pub referral_bonus: Option<i64>,
    pub min_withdrawal: Option<i64>,
    pub refund_rejected_wallet_payments: Option<bool>,
}

/// Fee configuration service
#[derive(Clone)]
pub struct FeeService {
    db_pool: PgPool,
}

impl FeeService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Load the current configuration.
    pub async fn load(&self) -> Result<FeeConfig, FeeError> {
        let config = sqlx::query_as::<_, FeeConfig>(
            r#"
            SELECT etat_civil, casier_judiciaire, legalisation, creation_entreprise,
                   gestion_dossier, commission_agent_percent, referral_bonus,
                   min_withdrawal, refund_rejected_wallet_payments, updated_at
            FROM fee_config
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        Ok(config)
    }

    /// Apply an admin edit and return the updated configuration.
    pub async fn update(&self, update: UpdateFeeConfigRequest) -> Result<FeeConfig, FeeError> {
        let mut tx = self.db_pool.begin().await?;

        let current = sqlx::query_as::<_, FeeConfig>(
            r#"
            SELECT etat_civil, casier_judiciaire, legalisation, creation_entreprise,
                   gestion_dossier, commission_agent_percent, referral_bonus,
                   min_withdrawal, refund_rejected_wallet_payments, updated_at
            FROM fee_config
            FOR UPDATE
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let next = FeeConfig {
            etat_civil: update.etat_civil.unwrap_or(current.etat_civil),
            casier_judiciaire: update.casier_judiciaire.unwrap_or(current.casier_judiciaire),
            legalisation: update.legalisation.unwrap_or(current.legalisation),
            creation_entreprise: update
                .creation_entreprise
                .unwrap_or(current.creation_entreprise),
            gestion_dossier: update.gestion_dossier.unwrap_or(current.gestion_dossier),
            commission_agent_percent: update
                .commission_agent_percent
                .unwrap_or(current.commission_agent_percent),
            referral_bonus: update.referral_bonus.unwrap_or(current.referral_bonus),
            min_withdrawal: update.min_withdrawal.unwrap_or(current.min_withdrawal),
            refund_rejected_wallet_payments: update
                .refund_rejected_wallet_payments
                .unwrap_or(current.refund_rejected_wallet_payments),
            updated_at: Utc::now(),
        };

        validate(&next)?;

        sqlx::query(
            r#"
            UPDATE fee_config SET
                etat_civil = $1, casier_judiciaire = $2, legalisation = $3,
                creation_entreprise = $4, gestion_dossier = $5,
                commission_agent_percent = $6, referral_bonus = $7,
                min_withdrawal = $8, refund_rejected_wallet_payments = $9,
                updated_at = $10
            "#,
        )
        .bind(next.etat_civil)
        .bind(next.casier_judiciaire)
        .bind(next.legalisation)
        .bind(next.creation_entreprise)
        .bind(next.gestion_dossier)
        .bind(next.commission_agent_percent)
        .bind(next.referral_bonus)
        .bind(next.min_withdrawal)
        .bind(next.refund_rejected_wallet_payments)
        .bind(next.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(percent = next.commission_agent_percent, "Fee configuration updated");

        Ok(next)
    }
}

fn validate(config: &FeeConfig) -> Result<(), FeeError> {
    if !(0..=100).contains(&config.commission_agent_percent) {
        return Err(FeeError::InvalidPercent(config.commission_agent_percent));
    }
    for service in ServiceType::ALL {
        let amount = config.price_of(service);
        if amount <= 0 {
            return Err(FeeError::InvalidFee { service, amount });
        }
    }
    Ok(())
}
