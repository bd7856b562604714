//! Service-request data model

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::models::{PaymentMethod, ServiceType};

/// Request state machine states
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Validated,
    Rejected,
}

impl RequestStatus {
    /// Terminal states are immutable: no transition, assignment or edit
    /// may touch a request once it reaches one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Validated | RequestStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::InProgress => "IN_PROGRESS",
            RequestStatus::Validated => "VALIDATED",
            RequestStatus::Rejected => "REJECTED",
        }
    }
}

/// A unit of administrative work. Never deleted, only transitioned.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub request_type: ServiceType,
    pub status: RequestStatus,
    pub client_id: Uuid,
    pub assigned_agent_id: Option<Uuid>,
    pub details: String,
    pub attachments: Vec<String>,
    pub final_document: Option<String>,
    pub payment_method: PaymentMethod,
    pub price: i64,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client submission payload. `details` is the flattened summary the
/// boundary builds from the service-specific sub-fields.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitServiceRequest {
    pub request_type: ServiceType,
    #[validate(length(min = 1, max = 2000))]
    pub details: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub payment_method: PaymentMethod,
    /// Gateway confirmation token, required for DIRECT payments
    pub charge_token: Option<String>,
}

/// Close payload
#[derive(Debug, Deserialize)]
pub struct CloseRequestPayload {
    pub final_document: Option<String>,
    /// Explicit confirmation for a documentless close
    #[serde(default)]
    pub force: bool,
}

/// Reject payload
#[derive(Debug, Deserialize)]
pub struct RejectRequestPayload {
    pub reason: Option<String>,
}

/// Assignment payload
#[derive(Debug, Deserialize)]
pub struct AssignRequestPayload {
    pub agent_id: Uuid,
}

/// List filter with pagination
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<RequestStatus>,
    pub client_id: Option<Uuid>,
    pub assigned_agent_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
