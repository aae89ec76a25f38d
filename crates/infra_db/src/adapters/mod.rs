//! Storage Port Adapters
//!
//! This module connects the ledger storage ports to PostgreSQL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::TransactionStore;
//!
//! let store = PostgresLedgerStore::new(pool, Duration::from_secs(5));
//! let transaction = store.find_transaction(id).await?;
//! ```

pub mod ledger;

pub use ledger::{PgUnitOfWork, PostgresLedgerStore};
