//! Wallet operations
//!
//! Recharge and withdrawal flows over the ledger. External gateway calls
//! are made outside the ledger's locked critical section: a recharge is
//! verified before the credit, and a withdrawal debits first, then
//! initiates the payout and reverses the debit if the payout is refused.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::fees::{FeeError, FeeService};
use crate::ledger::{EntryKind, LedgerEntry, LedgerError, LedgerService};
use crate::payment::PaymentGateway;

/// Smallest accepted recharge (FCFA)
pub const MIN_RECHARGE: i64 = 500;

/// Wallet operation errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("amount {requested} is below the minimum of {minimum}")]
    BelowMinimum { minimum: i64, requested: i64 },

    #[error("external charge failed: {0}")]
    ExternalChargeFailed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FeeError> for WalletError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Database(e) => WalletError::Database(e),
            other => WalletError::Database(sqlx::Error::Protocol(other.to_string())),
        }
    }
}

/// Wallet service
pub struct WalletService {
    ledger: LedgerService,
    fee_service: FeeService,
    gateway: Arc<dyn PaymentGateway>,
}

impl WalletService {
    pub fn new(
        ledger: LedgerService,
        fee_service: FeeService,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            ledger,
            fee_service,
            gateway,
        }
    }

    /// Credit the wallet after the gateway confirms the external charge.
    pub async fn recharge(
        &self,
        user_id: Uuid,
        amount: i64,
        charge_token: &str,
    ) -> Result<LedgerEntry, WalletError> {
        if amount < MIN_RECHARGE {
            return Err(WalletError::BelowMinimum {
                minimum: MIN_RECHARGE,
                requested: amount,
            });
        }

        self.gateway
            .verify_charge(charge_token, amount)
            .await
            .map_err(|e| WalletError::ExternalChargeFailed(e.to_string()))?;

        let entry = self
            .ledger
            .credit(user_id, amount, EntryKind::WalletRecharge, None)
            .await?;

        tracing::info!(user_id = %user_id, amount = amount, "Wallet recharged");

        Ok(entry)
    }

    /// Debit the wallet and push the funds out through the gateway. The
    /// debit is validated against the current balance first; a refused
    /// payout is compensated with a reversal credit (the ledger stays
    /// append-only) and reported as `ExternalChargeFailed`.
    pub async fn withdraw(
        &self,
        user_id: Uuid,
        amount: i64,
        method: &str,
        destination: &str,
    ) -> Result<LedgerEntry, WalletError> {
        let config = self.fee_service.load().await?;
        if amount < config.min_withdrawal {
            return Err(WalletError::BelowMinimum {
                minimum: config.min_withdrawal,
                requested: amount,
            });
        }

        let entry = self
            .ledger
            .debit(user_id, amount, EntryKind::Withdrawal, None)
            .await?;

        if let Err(e) = self
            .gateway
            .initiate_payout(user_id, amount, method, destination)
            .await
        {
            self.ledger
                .credit(user_id, amount, EntryKind::Withdrawal, None)
                .await?;
            tracing::warn!(user_id = %user_id, amount = amount, error = %e, "Payout refused, withdrawal reversed");
            return Err(WalletError::ExternalChargeFailed(e.to_string()));
        }

        tracing::info!(user_id = %user_id, amount = amount, "Withdrawal completed");

        Ok(entry)
    }
}
