//! Referral HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::handlers::AuthenticatedUser;
use crate::referral::ReferralStats;
use crate::state::AppState;

/// GET /api/referrals/me - Affiliate summary for the current user
pub async fn my_referral_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ReferralStats>, ApiError> {
    let stats = state.referral_service.stats(user.user_id).await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct ValidateCodeResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

/// GET /api/referrals/validate/:code - Check a referral code before
/// registration (drives the sign-up form hint)
pub async fn validate_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ValidateCodeResponse>, ApiError> {
    let owner = state.referral_service.code_owner(&code).await?;

    Ok(Json(match owner {
        Some(user) => ValidateCodeResponse {
            valid: true,
            owner_name: Some(user.name),
        },
        None => ValidateCodeResponse {
            valid: false,
            owner_name: None,
        },
    }))
}
