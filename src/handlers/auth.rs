//! Authentication and registration HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    ActivityAction, AgentApplicationRequest, AuthTokensResponse, LoginRequest,
    PartnerApplicationRequest, RegisterClientRequest, RegisterClientResponse, UserResponse,
};
use crate::state::AppState;

/// POST /api/auth/register - Client self-service registration
pub async fn register_client(
    State(state): State<AppState>,
    Json(req): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<RegisterClientResponse>), ApiError> {
    req.validate()?;

    let outcome = state.auth_service.register_client(req).await?;

    state
        .activity_service
        .record(
            outcome.user.id,
            &outcome.user.name,
            outcome.user.role,
            ActivityAction::Register,
            "Account created",
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterClientResponse {
            user: outcome.user.into(),
            referral_applied: outcome.referral_applied,
            referral_error: outcome.referral_error,
        }),
    ))
}

/// POST /api/auth/login - Verify credentials and issue an access token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    req.validate()?;

    let tokens = state.auth_service.login(&req.email, &req.password).await?;

    state
        .activity_service
        .record(
            tokens.user.id,
            &tokens.user.name,
            tokens.user.role,
            ActivityAction::Login,
            "Signed in",
        )
        .await;

    Ok(Json(tokens))
}

/// POST /api/auth/agent-applications - Apply for an agent account
pub async fn apply_agent(
    State(state): State<AppState>,
    Json(req): Json<AgentApplicationRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()?;

    let user = state.auth_service.apply_agent(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/auth/partner-applications - Apply for a partner account
pub async fn apply_partner(
    State(state): State<AppState>,
    Json(req): Json<PartnerApplicationRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()?;

    let user = state.auth_service.apply_partner(req).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
