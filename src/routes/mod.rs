//! Route definitions for the Coursio API

mod auth;
mod documents;
mod fees;
mod messaging;
mod referral;
mod request;
mod user;
mod wallet;

pub use auth::auth_routes;
pub use documents::document_routes;
pub use fees::fee_routes;
pub use messaging::messaging_routes;
pub use referral::referral_routes;
pub use request::request_routes;
pub use user::user_routes;
pub use wallet::wallet_routes;
