//! Request/response payloads for authentication and registration

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserResponse;

/// Client self-service registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterClientRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone_number: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Optional referral code of the sponsor
    pub referral_code: Option<String>,
}

/// Agent application; the account stays pending until an admin approves it.
#[derive(Debug, Deserialize, Validate)]
pub struct AgentApplicationRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 2))]
    pub country: String,
    #[validate(length(min = 2))]
    pub city: String,
    pub address: Option<String>,
    pub profession: Option<String>,
    /// Preferred commission payout channel (Orange Money, MTN MoMo, ...)
    pub payment_mode: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Partner application; same pending-approval lifecycle as agents.
#[derive(Debug, Deserialize, Validate)]
pub struct PartnerApplicationRequest {
    #[validate(length(min = 2, max = 150))]
    pub company_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub postal_address: Option<String>,
    pub physical_address: Option<String>,
    pub executive_name: Option<String>,
    pub executive_email: Option<String>,
    pub executive_phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login payload
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Issued identity
#[derive(Debug, Serialize)]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Outcome of a client registration, including what happened to the
/// supplied referral code (a bad code does not fail the registration).
#[derive(Debug, Serialize)]
pub struct RegisterClientResponse {
    pub user: UserResponse,
    pub referral_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_error: Option<String>,
}

/// Admin role change payload
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: super::UserRole,
}
