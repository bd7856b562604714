//! Messaging service layer

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserRole;
use crate::notify::{self, Notifier};

use super::model::{BlogComment, CommentStatus, Message};

/// Messaging failures
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("message not found")]
    MessageNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("comment already moderated: {0}")]
    AlreadyModerated(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Messaging and moderation service
pub struct MessagingService {
    db_pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl MessagingService {
    pub fn new(db_pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { db_pool, notifier }
    }

    /// Send a message to a role inbox (client → admin/agent support).
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        sender_name: &str,
        receiver_role: UserRole,
        subject: &str,
        content: &str,
    ) -> Result<Message, MessagingError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (
                id, sender_id, sender_name, receiver_role, receiver_id, subject,
                content, is_read, is_admin_response, created_at
            )
            VALUES ($1, $2, $3, $4, NULL, $5, $6, FALSE, FALSE, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(sender_name)
        .bind(receiver_role)
        .bind(subject)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(message)
    }

    /// Support reply to an existing message. The reply targets the
    /// original sender directly and fires the notification collaborator.
    pub async fn reply(
        &self,
        responder_id: Uuid,
        responder_name: &str,
        original_id: Uuid,
        content: &str,
    ) -> Result<Message, MessagingError> {
        let original = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(original_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(MessagingError::MessageNotFound)?;

        let subject = if original.subject.starts_with("RE:") {
            original.subject.clone()
        } else {
            format!("RE: {}", original.subject)
        };

        let reply = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (
                id, sender_id, sender_name, receiver_role, receiver_id, subject,
                content, is_read, is_admin_response, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, TRUE, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(responder_id)
        .bind(responder_name)
        .bind(UserRole::Client)
        .bind(original.sender_id)
        .bind(&subject)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        notify::notify_reply(self.notifier.clone(), original.sender_id, subject);

        Ok(reply)
    }

    /// Role inbox, most recent first.
    pub async fn inbox(&self, role: UserRole) -> Result<Vec<Message>, MessagingError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE receiver_role = $1 AND receiver_id IS NULL ORDER BY created_at DESC",
        )
        .bind(role)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    /// Everything sent to or by a specific user.
    pub async fn thread_for_user(&self, user_id: Uuid) -> Result<Vec<Message>, MessagingError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE sender_id = $1 OR receiver_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    /// Mark a message as read.
    pub async fn mark_read(&self, message_id: Uuid) -> Result<(), MessagingError> {
        let rows = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1")
            .bind(message_id)
            .execute(&self.db_pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(MessagingError::MessageNotFound);
        }
        Ok(())
    }

    /// Submit a blog comment; it enters the moderation queue as pending.
    pub async fn submit_comment(
        &self,
        post_id: &str,
        author_name: &str,
        content: &str,
    ) -> Result<BlogComment, MessagingError> {
        let comment = sqlx::query_as::<_, BlogComment>(
            r#"
            INSERT INTO blog_comments (id, post_id, author_name, content, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_name)
        .bind(content)
        .bind(CommentStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(comment)
    }

    /// Approve or reject a pending comment. Decisions are final.
    pub async fn moderate_comment(
        &self,
        comment_id: Uuid,
        approve: bool,
    ) -> Result<BlogComment, MessagingError> {
        let mut tx = self.db_pool.begin().await?;

        let comment = sqlx::query_as::<_, BlogComment>(
            "SELECT * FROM blog_comments WHERE id = $1 FOR UPDATE",
        )
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MessagingError::CommentNotFound)?;

        if comment.status != CommentStatus::Pending {
            return Err(MessagingError::AlreadyModerated(
                comment.status.as_str().to_string(),
            ));
        }

        let status = if approve {
            CommentStatus::Approved
        } else {
            CommentStatus::Rejected
        };

        let updated = sqlx::query_as::<_, BlogComment>(
            "UPDATE blog_comments SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Pending comments awaiting moderation, oldest first.
    pub async fn pending_comments(&self) -> Result<Vec<BlogComment>, MessagingError> {
        let comments = sqlx::query_as::<_, BlogComment>(
            "SELECT * FROM blog_comments WHERE status = 'pending' ORDER BY created_at ASC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(comments)
    }
}
