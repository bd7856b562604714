//! Service-request HTTP handlers
//!
//! Submission is open to any authenticated user; processing transitions
//! are agent/admin-gated and assignment is admin-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::{AdminUser, AgentUser, AuthenticatedUser};
use crate::models::{ActivityAction, UserRole};
use crate::request::{
    AssignRequestPayload, CloseRequestPayload, ListRequestsQuery, RejectRequestPayload,
    ServiceRequest, SubmitServiceRequest,
};
use crate::state::AppState;

/// POST /api/requests - Submit a new service request
pub async fn submit_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SubmitServiceRequest>,
) -> Result<(StatusCode, Json<ServiceRequest>), ApiError> {
    req.validate()?;

    let details = req.details.clone();
    let request = state.request_service.submit(user.user_id, req).await?;

    state
        .activity_service
        .record(
            user.user_id,
            &user.email,
            user.role,
            ActivityAction::CreateRequest,
            &details,
        )
        .await;

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/requests - List requests, scoped by role: admins see
/// everything, agents their assignments, clients their own submissions.
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(mut query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<ServiceRequest>>, ApiError> {
    match user.role {
        UserRole::Admin => {}
        UserRole::Agent => query.assigned_agent_id = Some(user.user_id),
        _ => query.client_id = Some(user.user_id),
    }

    let requests = state.request_service.list(query).await?;
    Ok(Json(requests))
}

/// GET /api/requests/:id - Fetch a single request
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let request = state.request_service.get(request_id).await?;

    let allowed = match user.role {
        UserRole::Admin => true,
        UserRole::Agent => request.assigned_agent_id == Some(user.user_id),
        _ => request.client_id == user.user_id,
    };
    if !allowed {
        return Err(ApiError::Forbidden(
            "Not allowed to view this request".to_string(),
        ));
    }

    Ok(Json(request))
}

/// PUT /api/requests/:id/assign - Assign or reassign an agent (admin)
pub async fn assign_request(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(request_id): Path<Uuid>,
    Json(req): Json<AssignRequestPayload>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let request = state
        .request_service
        .assign(request_id, req.agent_id)
        .await?;

    state
        .activity_service
        .record(
            admin.user_id,
            &admin.email,
            admin.role,
            ActivityAction::UpdateStatus,
            &format!("Assigned request {} to agent {}", request_id, req.agent_id),
        )
        .await;

    Ok(Json(request))
}

/// POST /api/requests/:id/start - Move a pending request into processing
pub async fn start_processing(
    State(state): State<AppState>,
    AgentUser(agent): AgentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let request = state.request_service.start_processing(request_id).await?;

    state
        .activity_service
        .record(
            agent.user_id,
            &agent.email,
            agent.role,
            ActivityAction::UpdateStatus,
            &format!("Request {} moved to IN_PROGRESS", request_id),
        )
        .await;

    Ok(Json(request))
}

/// POST /api/requests/:id/close - Validate a request with its final document
pub async fn close_request(
    State(state): State<AppState>,
    AgentUser(agent): AgentUser,
    Path(request_id): Path<Uuid>,
    Json(req): Json<CloseRequestPayload>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let request = state
        .request_service
        .close(request_id, req.final_document, req.force)
        .await?;

    state
        .activity_service
        .record(
            agent.user_id,
            &agent.email,
            agent.role,
            ActivityAction::UpdateStatus,
            &format!("Request {} VALIDATED", request_id),
        )
        .await;

    Ok(Json(request))
}

/// POST /api/requests/:id/reject - Reject a request
pub async fn reject_request(
    State(state): State<AppState>,
    AgentUser(agent): AgentUser,
    Path(request_id): Path<Uuid>,
    Json(req): Json<RejectRequestPayload>,
) -> Result<Json<ServiceRequest>, ApiError> {
    let request = state
        .request_service
        .reject(request_id, req.reason)
        .await?;

    state
        .activity_service
        .record(
            agent.user_id,
            &agent.email,
            agent.role,
            ActivityAction::UpdateStatus,
            &format!("Request {} REJECTED", request_id),
        )
        .await;

    Ok(Json(request))
}
