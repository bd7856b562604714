//! Messaging and moderation route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn messaging_routes() -> Router<AppState> {
    Router::new()
        .route("/api/messages", post(send_message))
        .route("/api/messages/inbox", get(inbox))
        .route("/api/messages/mine", get(my_messages))
        .route("/api/messages/:id/reply", post(reply_message))
        .route("/api/messages/:id/read", post(mark_message_read))
        .route("/api/comments", post(submit_comment))
        .route("/api/comments/pending", get(pending_comments))
        .route("/api/comments/:id/moderate", post(moderate_comment))
}
