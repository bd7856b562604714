//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::activity::ActivityService;
use crate::auth::AuthService;
use crate::fees::FeeService;
use crate::ledger::LedgerService;
use crate::messaging::MessagingService;
use crate::referral::ReferralService;
use crate::request::RequestService;
use crate::storage::DocumentStore;
use crate::wallet::WalletService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub ledger_service: Arc<LedgerService>,
    pub referral_service: Arc<ReferralService>,
    pub request_service: Arc<RequestService>,
    pub wallet_service: Arc<WalletService>,
    pub fee_service: Arc<FeeService>,
    pub messaging_service: Arc<MessagingService>,
    pub activity_service: Arc<ActivityService>,
    pub document_store: Arc<dyn DocumentStore>,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<LedgerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ledger_service.clone()
    }
}

impl FromRef<AppState> for Arc<ReferralService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.referral_service.clone()
    }
}

impl FromRef<AppState> for Arc<RequestService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.request_service.clone()
    }
}

impl FromRef<AppState> for Arc<WalletService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.wallet_service.clone()
    }
}

impl FromRef<AppState> for Arc<FeeService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.fee_service.clone()
    }
}

impl FromRef<AppState> for Arc<MessagingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.messaging_service.clone()
    }
}

impl FromRef<AppState> for Arc<ActivityService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.activity_service.clone()
    }
}
