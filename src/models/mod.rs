//! Data models for the Coursio backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub account_status: AccountStatus,
    pub zone: Option<String>,
    pub wallet_balance: i64,
    pub referral_code: Option<String>,
    pub referral_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            account_status: user.account_status,
            zone: user.zone,
            wallet_balance: user.wallet_balance,
            referral_code: user.referral_code,
            referral_count: user.referral_count,
            created_at: user.created_at,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Client,
    Agent,
    Admin,
    Partner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Agent => "agent",
            UserRole::Admin => "admin",
            UserRole::Partner => "partner",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "client" => Some(UserRole::Client),
            "agent" => Some(UserRole::Agent),
            "admin" => Some(UserRole::Admin),
            "partner" => Some(UserRole::Partner),
            _ => None,
        }
    }
}

/// Account status; agent and partner applications stay pending until an
/// admin approves them.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Pending,
    Approved,
}

/// Brokered service categories
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    EtatCivil,
    CasierJudiciaire,
    Legalisation,
    CreationEntreprise,
    GestionDossier,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::EtatCivil,
        ServiceType::CasierJudiciaire,
        ServiceType::Legalisation,
        ServiceType::CreationEntreprise,
        ServiceType::GestionDossier,
    ];
}

/// Payment method chosen at submission
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Wallet,
    Direct,
}

/// Activity log actions
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "activity_action", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    Register,
    CreateRequest,
    UpdateStatus,
    Comment,
}

/// Activity log row
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_role: UserRole,
    pub action: ActivityAction,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Public user view (never carries the credential hash)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub account_status: AccountStatus,
    pub zone: Option<String>,
    pub wallet_balance: i64,
    pub referral_code: Option<String>,
    pub referral_count: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_json_names_match_api() {
        let json = serde_json::to_string(&ServiceType::EtatCivil).unwrap();
        assert_eq!(json, "\"ETAT_CIVIL\"");
        let json = serde_json::to_string(&ServiceType::CreationEntreprise).unwrap();
        assert_eq!(json, "\"CREATION_ENTREPRISE\"");

        let parsed: ServiceType = serde_json::from_str("\"CASIER_JUDICIAIRE\"").unwrap();
        assert_eq!(parsed, ServiceType::CasierJudiciaire);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Client,
            UserRole::Agent,
            UserRole::Admin,
            UserRole::Partner,
        ] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("superuser"), None);
    }

    #[test]
    fn test_user_response_hides_credential() {
        let json = serde_json::to_string(&UserResponse {
            id: Uuid::new_v4(),
            name: "Jean Dupont".to_string(),
            email: "jean@mail.com".to_string(),
            phone_number: None,
            role: UserRole::Client,
            account_status: AccountStatus::Approved,
            zone: None,
            wallet_balance: 15000,
            referral_code: Some("JEAN2023".to_string()),
            referral_count: 3,
            created_at: Utc::now(),
        })
        .unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("JEAN2023"));
    }
}
