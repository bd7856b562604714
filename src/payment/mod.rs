//! Payment-gateway collaborator boundary
//!
//! The core never implements charge or payout logic; it only consumes this
//! narrow interface. DIRECT-paid submissions and wallet recharges must be
//! verified here before any row is written, and the verification always
//! happens outside the ledger's locked critical section.

use axum::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

/// Gateway failures
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("charge not verified: {0}")]
    ChargeNotVerified(String),

    #[error("payout failed: {0}")]
    PayoutFailed(String),

    #[error("gateway transport error: {0}")]
    Transport(String),
}

/// Verified external charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeConfirmation {
    pub token: String,
    pub amount: i64,
}

/// Accepted external payout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfirmation {
    pub reference: String,
    pub amount: i64,
}

/// External payment provider interface
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirm that `token` represents a settled charge of exactly `amount`.
    async fn verify_charge(&self, token: &str, amount: i64)
        -> Result<ChargeConfirmation, GatewayError>;

    /// Push `amount` to the user's external account (Orange Money, MTN
    /// MoMo, bank card...).
    async fn initiate_payout(
        &self,
        user_id: Uuid,
        amount: i64,
        method: &str,
        destination: &str,
    ) -> Result<PayoutConfirmation, GatewayError>;
}

/// Select the gateway implementation from configuration; without a
/// configured provider URL the deterministic mock is used.
pub fn from_config(config: &Config) -> Arc<dyn PaymentGateway> {
    match &config.payment_gateway_url {
        Some(url) => Arc::new(HttpPaymentGateway::new(url.clone())),
        None => {
            tracing::warn!("PAYMENT_GATEWAY_URL not set, using mock payment gateway");
            Arc::new(MockPaymentGateway)
        }
    }
}

/// Real provider spoken to over HTTP
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChargeStatusResponse {
    status: String,
    amount: i64,
}

#[derive(Debug, Serialize)]
struct PayoutRequestBody<'a> {
    user_id: Uuid,
    amount: i64,
    method: &'a str,
    destination: &'a str,
}

#[derive(Debug, Deserialize)]
struct PayoutResponseBody {
    reference: String,
    status: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn verify_charge(
        &self,
        token: &str,
        amount: i64,
    ) -> Result<ChargeConfirmation, GatewayError> {
        let url = format!("{}/charges/{}", self.base_url, token);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::ChargeNotVerified(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let charge: ChargeStatusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if charge.status != "confirmed" {
            return Err(GatewayError::ChargeNotVerified(format!(
                "charge status is '{}'",
                charge.status
            )));
        }
        if charge.amount != amount {
            return Err(GatewayError::ChargeNotVerified(format!(
                "charge amount {} does not match expected {}",
                charge.amount, amount
            )));
        }

        Ok(ChargeConfirmation {
            token: token.to_string(),
            amount,
        })
    }

    async fn initiate_payout(
        &self,
        user_id: Uuid,
        amount: i64,
        method: &str,
        destination: &str,
    ) -> Result<PayoutConfirmation, GatewayError> {
        let url = format!("{}/payouts", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PayoutRequestBody {
                user_id,
                amount,
                method,
                destination,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::PayoutFailed(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let payout: PayoutResponseBody = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if payout.status != "accepted" {
            return Err(GatewayError::PayoutFailed(format!(
                "payout status is '{}'",
                payout.status
            )));
        }

        Ok(PayoutConfirmation {
            reference: payout.reference,
            amount,
        })
    }
}

/// Deterministic stand-in for development and tests. Only accepts tokens
/// it issued itself via [`MockPaymentGateway::issue_token`], and fails any
/// payout whose destination is `"FAIL"` so the reversal path stays
/// exercisable.
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    pub fn issue_token(amount: i64) -> String {
        format!("mock-{}-{}", amount, Uuid::new_v4())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn verify_charge(
        &self,
        token: &str,
        amount: i64,
    ) -> Result<ChargeConfirmation, GatewayError> {
        let expected_prefix = format!("mock-{}-", amount);
        if token.starts_with(&expected_prefix) {
            Ok(ChargeConfirmation {
                token: token.to_string(),
                amount,
            })
        } else {
            Err(GatewayError::ChargeNotVerified(
                "token was not issued for this amount".to_string(),
            ))
        }
    }

    async fn initiate_payout(
        &self,
        _user_id: Uuid,
        amount: i64,
        _method: &str,
        destination: &str,
    ) -> Result<PayoutConfirmation, GatewayError> {
        if destination == "FAIL" {
            return Err(GatewayError::PayoutFailed("destination rejected".to_string()));
        }
        Ok(PayoutConfirmation {
            reference: format!("mock-payout-{}", Uuid::new_v4()),
            amount,
        })
    }
}
