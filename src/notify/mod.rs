//! Notification collaborator boundary
//!
//! Invoked on request-status transitions and support replies. All call
//! sites are fire-and-forget: a delivery failure must never roll back the
//! state change that triggered it, so dispatch happens on a detached task.

use axum::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::request::RequestStatus;

/// Outbound notification interface (email/SMS relay lives behind it)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn request_status_changed(
        &self,
        client_id: Uuid,
        request_id: Uuid,
        status: RequestStatus,
    );

    async fn message_replied(&self, recipient_id: Uuid, subject: &str);
}

/// Default implementation: structured log lines only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_status_changed(
        &self,
        client_id: Uuid,
        request_id: Uuid,
        status: RequestStatus,
    ) {
        tracing::info!(
            client_id = %client_id,
            request_id = %request_id,
            status = ?status,
            "Notification: request status changed"
        );
    }

    async fn message_replied(&self, recipient_id: Uuid, subject: &str) {
        tracing::info!(
            recipient_id = %recipient_id,
            subject = %subject,
            "Notification: support reply sent"
        );
    }
}

/// Dispatch a status notification without blocking or failing the caller.
pub fn notify_status_change(
    notifier: Arc<dyn Notifier>,
    client_id: Uuid,
    request_id: Uuid,
    status: RequestStatus,
) {
    tokio::spawn(async move {
        notifier
            .request_status_changed(client_id, request_id, status)
            .await;
    });
}

/// Dispatch a reply notification without blocking or failing the caller.
pub fn notify_reply(notifier: Arc<dyn Notifier>, recipient_id: Uuid, subject: String) {
    tokio::spawn(async move {
        notifier.message_replied(recipient_id, &subject).await;
    });
}
