//! Document upload/download HTTP handlers
//!
//! The API only ever exchanges opaque file refs; content goes straight to
//! the document store.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::handlers::AuthenticatedUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_ref: String,
}

/// POST /api/documents - Store a document and return its opaque ref
pub async fn upload_document(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty document body".to_string()));
    }

    let name = query.name.unwrap_or_else(|| "document".to_string());
    let file_ref = state.document_store.store(body.to_vec(), &name).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { file_ref })))
}

/// GET /api/documents/:ref - Fetch a stored document
pub async fn download_document(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(file_ref): Path<String>,
) -> Result<Vec<u8>, ApiError> {
    let bytes = state.document_store.retrieve(&file_ref).await?;
    Ok(bytes)
}
