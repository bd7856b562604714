//! Append-only wallet ledger
//!
//! Single source of truth for every balance change. The `wallet_balance`
//! column on `users` is a cached projection updated atomically with each
//! entry append, under the user row lock.

pub mod model;
pub mod service;

pub use model::{EntryKind, LedgerEntry};
pub use service::{LedgerError, LedgerService};
