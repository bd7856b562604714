//! Fee configuration route definitions

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn fee_routes() -> Router<AppState> {
    Router::new()
        .route("/api/config/fees", get(get_fee_config))
        .route("/api/config/fees", put(update_fee_config))
}
