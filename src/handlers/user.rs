//! User management HTTP handlers (admin dashboard)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::{AdminUser, AuthenticatedUser};
use crate::models::{ActivityEntry, SetRoleRequest, UserResponse};
use crate::state::AppState;

/// GET /api/users - List all users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.auth_service.list_users().await?;
    Ok(Json(users.into_iter().map(|u| u.into()).collect()))
}

/// GET /api/users/me - Current user profile
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.auth_service.get_user_by_id(user.user_id).await?;
    Ok(Json(profile.into()))
}

/// POST /api/users/:id/approve - Approve a pending agent/partner account
pub async fn approve_account(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.approve_account(user_id).await?;
    Ok(Json(user.into()))
}

/// PUT /api/users/:id/role - Change a user's role
pub async fn set_role(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth_service.set_role(user_id, req.role).await?;
    Ok(Json(user.into()))
}

/// DELETE /api/users/:id - Anonymize a user and reject their open requests
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.auth_service.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// GET /api/activity - Recent activity log (admin dashboard)
pub async fn recent_activity(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let entries = state
        .activity_service
        .recent(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(entries))
}
