//! API handlers for the Coursio backend

pub mod auth;
pub mod documents;
pub mod fees;
pub mod messaging;
pub mod referral;
pub mod request;
pub mod user;
pub mod wallet;

pub use auth::*;
pub use documents::*;
pub use fees::*;
pub use messaging::*;
pub use referral::*;
pub use request::*;
pub use user::*;
pub use wallet::*;

// Re-export extractors from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AgentUser, AuthenticatedUser};
