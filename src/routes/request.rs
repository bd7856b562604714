//! Service-request route definitions

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/api/requests", post(submit_request))
        .route("/api/requests", get(list_requests))
        .route("/api/requests/:id", get(get_request))
        .route("/api/requests/:id/assign", put(assign_request))
        .route("/api/requests/:id/start", post(start_processing))
        .route("/api/requests/:id/close", post(close_request))
        .route("/api/requests/:id/reject", post(reject_request))
}
