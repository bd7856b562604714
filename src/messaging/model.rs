//! Messaging and moderation data model

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::models::UserRole;

/// A support message. Replies are flagged `is_admin_response` and target
/// a specific recipient.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub receiver_role: UserRole,
    pub receiver_id: Option<Uuid>,
    pub subject: String,
    pub content: String,
    pub is_read: bool,
    pub is_admin_response: bool,
    pub created_at: DateTime<Utc>,
}

/// Moderation states for blog comments
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "comment_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "PENDING",
            CommentStatus::Approved => "APPROVED",
            CommentStatus::Rejected => "REJECTED",
        }
    }
}

/// A blog comment awaiting (or past) moderation
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct BlogComment {
    pub id: Uuid,
    pub post_id: String,
    pub author_name: String,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
}

/// New message payload
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_role: UserRole,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Support reply payload
#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// New comment payload
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitCommentRequest {
    #[validate(length(min = 1, max = 100))]
    pub post_id: String,
    #[validate(length(min = 1, max = 100))]
    pub author_name: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Moderation decision payload
#[derive(Debug, Deserialize)]
pub struct ModerateCommentRequest {
    pub approve: bool,
}
