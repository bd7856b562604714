//! Wallet route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/api/wallet/balance", get(get_balance))
        .route("/api/wallet/history", get(get_history))
        .route("/api/wallet/recharge", post(recharge))
        .route("/api/wallet/withdraw", post(withdraw))
}
