//! Referral route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn referral_routes() -> Router<AppState> {
    Router::new()
        .route("/api/referrals/me", get(my_referral_stats))
        .route("/api/referrals/validate/:code", get(validate_code))
}
