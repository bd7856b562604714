//! Authentication service
//!
//! Registration, credential verification and the admin-gated account
//! lifecycle. Agent and partner applications are created pending and stay
//! unusable until approved.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AccountStatus, AgentApplicationRequest, AuthTokensResponse, PartnerApplicationRequest,
    RegisterClientRequest, User, UserRole,
};
use crate::referral::{ReferralError, ReferralService};
use crate::request::RequestService;

use super::jwt::{generate_access_token, JwtError};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Referral(#[from] Box<ReferralError>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Hash(e.to_string())
    }
}

/// Outcome of a client registration
pub struct RegistrationOutcome {
    pub user: User,
    pub referral_applied: bool,
    pub referral_error: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    referral_service: ReferralService,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        referral_service: ReferralService,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
    ) -> Self {
        Self {
            db_pool,
            referral_service,
            jwt_secret,
            access_token_ttl_seconds,
        }
    }

    /// Client self-service registration. A fresh referral code is minted
    /// for the new client; a supplied sponsor code is applied afterwards
    /// and a bad code does not fail the registration.
    pub async fn register_client(
        &self,
        req: RegisterClientRequest,
    ) -> Result<RegistrationOutcome, AuthError> {
        self.ensure_email_free(&req.email).await?;

        let password_hash = hash_password(&req.password)?;
        let referral_code = self
            .referral_service
            .generate_code(&req.name)
            .await
            .map_err(Box::new)?;

        let user = self
            .insert_user(NewUser {
                name: &req.name,
                email: &req.email,
                phone_number: req.phone_number.as_deref(),
                password_hash: &password_hash,
                role: UserRole::Client,
                account_status: AccountStatus::Approved,
                zone: None,
                referral_code: Some(&referral_code),
            })
            .await?;

        let (referral_applied, referral_error) = match &req.referral_code {
            Some(code) if !code.trim().is_empty() => {
                match self.referral_service.register_referral(user.id, code).await {
                    Ok(()) => (true, None),
                    Err(e @ (ReferralError::UnknownReferralCode(_) | ReferralError::SelfReferral)) => {
                        tracing::debug!(error = %e, "Referral code not applied");
                        (false, Some(e.to_string()))
                    }
                    Err(e) => return Err(Box::new(e).into()),
                }
            }
            _ => (false, None),
        };

        tracing::info!(user_id = %user.id, "Client registered");

        Ok(RegistrationOutcome {
            user,
            referral_applied,
            referral_error,
        })
    }

    /// Agent application; the account stays pending until approved.
    pub async fn apply_agent(&self, req: AgentApplicationRequest) -> Result<User, AuthError> {
        self.ensure_email_free(&req.email).await?;
        let password_hash = hash_password(&req.password)?;
        let zone = format!("{}, {}", req.city, req.country);

        let user = self
            .insert_user(NewUser {
                name: &req.full_name,
                email: &req.email,
                phone_number: req.phone.as_deref(),
                password_hash: &password_hash,
                role: UserRole::Agent,
                account_status: AccountStatus::Pending,
                zone: Some(&zone),
                referral_code: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, zone = %zone, "Agent application received");

        Ok(user)
    }

    /// Partner application; same pending lifecycle as agents.
    pub async fn apply_partner(&self, req: PartnerApplicationRequest) -> Result<User, AuthError> {
        self.ensure_email_free(&req.email).await?;
        let password_hash = hash_password(&req.password)?;

        let user = self
            .insert_user(NewUser {
                name: &req.company_name,
                email: &req.email,
                phone_number: req.phone.as_deref(),
                password_hash: &password_hash,
                role: UserRole::Partner,
                account_status: AccountStatus::Pending,
                zone: req.physical_address.as_deref(),
                referral_code: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Partner application received");

        Ok(user)
    }

    /// Verify credentials and issue an access token. Pending accounts are
    /// rejected the same way as bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokensResponse, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if user.account_status != AccountStatus::Approved {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token =
            generate_access_token(&user, &self.jwt_secret, self.access_token_ttl_seconds)?;

        Ok(AuthTokensResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: user.into(),
        })
    }

    /// Approve a pending agent/partner account.
    pub async fn approve_account(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET account_status = 'approved', updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user_id, "Account approved");

        Ok(user)
    }

    /// Change a user's role. Admin-gated at the boundary.
    pub async fn set_role(&self, user_id: Uuid, role: UserRole) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(role)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user_id, role = ?role, "Role changed");

        Ok(user)
    }

    /// Delete a user. The row is anonymized rather than removed so the
    /// ledger keeps balancing, and the user's open requests are rejected.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        let mut tx = self.db_pool.begin().await?;

        let rows = sqlx::query(
            r#"
            UPDATE users SET
                name = 'Deleted user',
                email = 'deleted-' || id::text || '@anonymized.invalid',
                phone_number = NULL,
                password_hash = '',
                zone = NULL,
                referral_code = NULL,
                updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AuthError::UserNotFound);
        }

        let open_requests = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM service_requests WHERE client_id = $1 AND status IN ('pending', 'in_progress')",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        for request_id in open_requests {
            RequestService::reject_in_tx(
                &mut tx,
                request_id,
                Some("Account deleted".to_string()),
            )
            .await
            .map_err(|e| AuthError::Database(sqlx::Error::Protocol(e.to_string())))?;
        }

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "User anonymized");

        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// All users, newest first. Admin dashboard listing.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.db_pool)
            .await?;

        Ok(users)
    }

    /// Get JWT secret (for extractor access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(user)
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), AuthError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken(email.to_string()));
        }
        Ok(())
    }

    async fn insert_user(&self, new_user: NewUser<'_>) -> Result<User, AuthError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, name, email, phone_number, password_hash, role, account_status,
                zone, wallet_balance, referral_code, referral_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, 0, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.phone_number)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.account_status)
        .bind(new_user.zone)
        .bind(new_user.referral_code)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }
}

struct NewUser<'a> {
    name: &'a str,
    email: &'a str,
    phone_number: Option<&'a str>,
    password_hash: &'a str,
    role: UserRole,
    account_status: AccountStatus,
    zone: Option<&'a str>,
    referral_code: Option<&'a str>,
}
