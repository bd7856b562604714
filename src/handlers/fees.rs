//! Fee configuration HTTP handlers

use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::fees::{FeeConfig, UpdateFeeConfigRequest};
use crate::handlers::AdminUser;
use crate::state::AppState;

/// GET /api/config/fees - Current fee schedule (drives the pricing UI)
pub async fn get_fee_config(
    State(state): State<AppState>,
) -> Result<Json<FeeConfig>, ApiError> {
    let config = state.fee_service.load().await?;
    Ok(Json(config))
}

/// PUT /api/config/fees - Edit the fee schedule (admin)
pub async fn update_fee_config(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<UpdateFeeConfigRequest>,
) -> Result<Json<FeeConfig>, ApiError> {
    let config = state.fee_service.update(req).await?;
    Ok(Json(config))
}
