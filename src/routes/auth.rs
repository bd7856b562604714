//! Authentication route definitions

use axum::{routing::post, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register_client))
        .route("/api/auth/login", post(login))
        .route("/api/auth/agent-applications", post(apply_agent))
        .route("/api/auth/partner-applications", post(apply_partner))
}
