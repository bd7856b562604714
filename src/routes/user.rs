//! User management route definitions

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/me", get(get_me))
        .route("/api/users/:id/approve", post(approve_account))
        .route("/api/users/:id/role", put(set_role))
        .route("/api/users/:id", delete(delete_user))
        .route("/api/activity", get(recent_activity))
}
