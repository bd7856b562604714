//! Activity log
//!
//! Best-effort audit trail of user actions for the admin dashboard. A
//! failed append is logged and swallowed; it never fails the operation
//! that triggered it.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ActivityAction, ActivityEntry, UserRole};

#[derive(Clone)]
pub struct ActivityService {
    db_pool: PgPool,
}

impl ActivityService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Append an activity row. Best effort.
    pub async fn record(
        &self,
        user_id: Uuid,
        user_name: &str,
        user_role: UserRole,
        action: ActivityAction,
        details: &str,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (id, user_id, user_name, user_role, action, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(user_name)
        .bind(user_role)
        .bind(action)
        .bind(details)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to append activity log entry");
        }
    }

    /// Most recent activity, for the admin dashboard.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, sqlx::Error> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, user_id, user_name, user_role, action, details, created_at
            FROM activity_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.db_pool)
        .await
    }
}
