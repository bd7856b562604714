//! Ledger data model

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// Why a ledger entry exists
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "entry_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    ServicePayment,
    ReferralBonus,
    AgentCommission,
    WalletRecharge,
    Withdrawal,
}

/// One immutable balance-affecting event. Credits are positive, debits
/// negative; entries are never updated or deleted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub kind: EntryKind,
    pub related_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
