//! Messaging and moderation HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::{AdminUser, AgentUser, AuthenticatedUser};
use crate::messaging::model::{ModerateCommentRequest, ReplyRequest, SendMessageRequest, SubmitCommentRequest};
use crate::messaging::{BlogComment, Message};
use crate::state::AppState;

/// POST /api/messages - Send a message to a role inbox
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    req.validate()?;

    let sender = state.auth_service.get_user_by_id(user.user_id).await?;
    let message = state
        .messaging_service
        .send_message(
            sender.id,
            &sender.name,
            req.receiver_role,
            &req.subject,
            &req.content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/messages/inbox - Messages addressed to the caller's role
pub async fn inbox(
    State(state): State<AppState>,
    AgentUser(user): AgentUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.messaging_service.inbox(user.role).await?;
    Ok(Json(messages))
}

/// GET /api/messages/mine - The caller's full message thread
pub async fn my_messages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.messaging_service.thread_for_user(user.user_id).await?;
    Ok(Json(messages))
}

/// POST /api/messages/:id/reply - Support reply to a message
pub async fn reply_message(
    State(state): State<AppState>,
    AgentUser(user): AgentUser,
    Path(message_id): Path<Uuid>,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    req.validate()?;

    let responder = state.auth_service.get_user_by_id(user.user_id).await?;
    let reply = state
        .messaging_service
        .reply(responder.id, &responder.name, message_id, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// POST /api/messages/:id/read - Mark a message as read
pub async fn mark_message_read(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.messaging_service.mark_read(message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/comments - Submit a blog comment into the moderation queue
pub async fn submit_comment(
    State(state): State<AppState>,
    Json(req): Json<SubmitCommentRequest>,
) -> Result<(StatusCode, Json<BlogComment>), ApiError> {
    req.validate()?;

    let comment = state
        .messaging_service
        .submit_comment(&req.post_id, &req.author_name, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/comments/pending - The moderation queue (admin)
pub async fn pending_comments(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<BlogComment>>, ApiError> {
    let comments = state.messaging_service.pending_comments().await?;
    Ok(Json(comments))
}

/// POST /api/comments/:id/moderate - Approve or reject a comment (admin)
pub async fn moderate_comment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(comment_id): Path<Uuid>,
    Json(req): Json<ModerateCommentRequest>,
) -> Result<Json<BlogComment>, ApiError> {
    let comment = state
        .messaging_service
        .moderate_comment(comment_id, req.approve)
        .await?;
    Ok(Json(comment))
}
