//! Wallet HTTP handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::AuthenticatedUser;
use crate::ledger::LedgerEntry;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// GET /api/wallet/balance - Current spendable balance
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger_service.balance_of(user.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// GET /api/wallet/history - Ledger entries, most recent first
pub async fn get_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let entries = state.ledger_service.history_of(user.user_id).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub amount: i64,
    pub charge_token: String,
}

/// POST /api/wallet/recharge - Credit the wallet after an external charge
pub async fn recharge(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<RechargeRequest>,
) -> Result<Json<LedgerEntry>, ApiError> {
    let entry = state
        .wallet_service
        .recharge(user.user_id, req.amount, &req.charge_token)
        .await?;
    Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: i64,
    /// Payout channel (ORANGE_MONEY, MTN_MOMO, CARD...)
    pub method: String,
    /// Phone number or account identifier on the payout channel
    pub destination: String,
}

/// POST /api/wallet/withdraw - Debit the wallet and pay out externally
pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<LedgerEntry>, ApiError> {
    let entry = state
        .wallet_service
        .withdraw(user.user_id, req.amount, &req.method, &req.destination)
        .await?;
    Ok(Json(entry))
}
