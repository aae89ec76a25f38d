//! Repository implementations for ledger tables
//!
//! Repositories encapsulate SQL and map rows to plain row structs; domain
//! mapping happens in the adapters. Read methods run on the pool. Methods
//! that take a `&mut PgConnection` run inside the caller's transaction.

pub mod accounts;
pub mod transactions;
pub mod ledger_entries;

pub use accounts::{AccountRepository, AccountRow, NewAccount};
pub use transactions::{TransactionRepository, TransactionRow};
pub use ledger_entries::{LedgerEntryRepository, LedgerEntryRow};
