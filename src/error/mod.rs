//! Centralized API error handling
//!
//! Every engine/ledger failure is a first-class outcome with a stable
//! machine-readable code; the UI layer owns the human wording.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::fees::FeeError;
use crate::ledger::LedgerError;
use crate::messaging::MessagingError;
use crate::referral::ReferralError;
use crate::request::RequestError;
use crate::storage::StorageError;
use crate::wallet::WalletError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Unknown referral code: {0}")]
    UnknownReferralCode(String),

    #[error("A referral code cannot be applied to its own owner")]
    SelfReferral,

    #[error("Request is already in terminal state {0}")]
    AlreadyTerminal(String),

    #[error("Agent not found")]
    AgentNotFound,

    #[error("Request not found")]
    RequestNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("External charge failed: {0}")]
    ExternalChargeFailed(String),

    #[error("A final document is required to close this request")]
    MissingFinalDocument,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            ApiError::InvalidAmount(_) => "INVALID_AMOUNT",
            ApiError::UnknownReferralCode(_) => "UNKNOWN_REFERRAL_CODE",
            ApiError::SelfReferral => "SELF_REFERRAL",
            ApiError::AlreadyTerminal(_) => "ALREADY_TERMINAL",
            ApiError::AgentNotFound => "AGENT_NOT_FOUND",
            ApiError::RequestNotFound => "REQUEST_NOT_FOUND",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::ExternalChargeFailed(_) => "EXTERNAL_CHARGE_FAILED",
            ApiError::MissingFinalDocument => "MISSING_FINAL_DOCUMENT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_)
            | ApiError::AgentNotFound
            | ApiError::RequestNotFound
            | ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_)
            | ApiError::InvalidAmount(_)
            | ApiError::UnknownReferralCode(_)
            | ApiError::SelfReferral
            | ApiError::MissingFinalDocument
            | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) | ApiError::AlreadyTerminal(_) => StatusCode::CONFLICT,
            ApiError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ExternalChargeFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured context for the caller (never pre-formatted prose)
    fn context(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::InsufficientFunds { balance, requested } => Some(serde_json::json!({
                "balance": balance,
                "requested": requested,
            })),
            ApiError::InvalidAmount(amount) => Some(serde_json::json!({ "amount": amount })),
            ApiError::UnknownReferralCode(code) => Some(serde_json::json!({ "code": code })),
            ApiError::AlreadyTerminal(status) => Some(serde_json::json!({ "status": status })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
                details: self.context(),
            },
        };

        (status, Json(body)).into_response()
    }
}

// Conversions from domain error types

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { balance, requested } => {
                ApiError::InsufficientFunds { balance, requested }
            }
            LedgerError::InvalidAmount(amount) => ApiError::InvalidAmount(amount),
            LedgerError::UserNotFound => ApiError::UserNotFound,
            LedgerError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        match err {
            ReferralError::UnknownReferralCode(code) => ApiError::UnknownReferralCode(code),
            ReferralError::SelfReferral => ApiError::SelfReferral,
            ReferralError::Ledger(e) => e.into(),
            ReferralError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::AlreadyTerminal(status) => ApiError::AlreadyTerminal(status),
            RequestError::AgentNotFound => ApiError::AgentNotFound,
            RequestError::RequestNotFound => ApiError::RequestNotFound,
            RequestError::MissingFinalDocument => ApiError::MissingFinalDocument,
            RequestError::ExternalChargeFailed(reason) => ApiError::ExternalChargeFailed(reason),
            RequestError::Ledger(e) => e.into(),
            RequestError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::EmailTaken(email) => {
                ApiError::Conflict(format!("Email already registered: {}", email))
            }
            AuthError::UserNotFound => ApiError::UserNotFound,
            AuthError::Token(e) => ApiError::Unauthorized(e.to_string()),
            AuthError::Hash(e) => ApiError::InternalError(e),
            AuthError::Referral(e) => (*e).into(),
            AuthError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::BelowMinimum { minimum, requested } => ApiError::BadRequest(format!(
                "Amount {} is below the minimum of {}",
                requested, minimum
            )),
            WalletError::ExternalChargeFailed(reason) => ApiError::ExternalChargeFailed(reason),
            WalletError::Ledger(e) => e.into(),
            WalletError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::MessageNotFound => ApiError::NotFound("Message not found".to_string()),
            MessagingError::CommentNotFound => ApiError::NotFound("Comment not found".to_string()),
            MessagingError::AlreadyModerated(status) => {
                ApiError::Conflict(format!("Comment already moderated: {}", status))
            }
            MessagingError::Database(e) => ApiError::DatabaseError(e.to_string()),
        }
    }
}

impl From<FeeError> for ApiError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::Database(e) => ApiError::DatabaseError(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(file_ref) => {
                ApiError::NotFound(format!("Document not found: {}", file_ref))
            }
            StorageError::InvalidRef(file_ref) => {
                ApiError::BadRequest(format!("Invalid file reference: {}", file_ref))
            }
            StorageError::Io(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ApiError::InsufficientFunds {
                balance: 0,
                requested: 5000
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            ApiError::AlreadyTerminal("VALIDATED".to_string()).error_code(),
            "ALREADY_TERMINAL"
        );
        assert_eq!(ApiError::InvalidCredentials.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(ApiError::AgentNotFound.error_code(), "AGENT_NOT_FOUND");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InsufficientFunds {
                balance: 100,
                requested: 700
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::AlreadyTerminal("REJECTED".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ExternalChargeFailed("declined".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_insufficient_funds_context() {
        let err = ApiError::InsufficientFunds {
            balance: 1000,
            requested: 1500,
        };
        let ctx = err.context().unwrap();
        assert_eq!(ctx["balance"], 1000);
        assert_eq!(ctx["requested"], 1500);
    }

    #[test]
    fn test_ledger_error_conversion() {
        let api: ApiError = LedgerError::InsufficientFunds {
            balance: 0,
            requested: 5000,
        }
        .into();
        assert_eq!(api.error_code(), "INSUFFICIENT_FUNDS");

        let api: ApiError = LedgerError::InvalidAmount(-5).into();
        assert_eq!(api.error_code(), "INVALID_AMOUNT");
    }
}
