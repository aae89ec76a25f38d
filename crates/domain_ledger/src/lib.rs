//! Ledger Domain - Double-Entry Transaction Engine
//!
//! This crate accepts groups of signed monetary movements and commits them
//! as one atomic, balanced, authorized unit, keeping every account's cached
//! balance equal to the sum of its append-only entry history.
//!
//! # Components
//!
//! - [`EntryValidator`]: structural checks (cardinality, non-zero, balance)
//! - [`AuthorizationGuard`]: account resolution, ownership, single currency
//! - [`BalanceProjector`]: incremental apply with the ASSET floor, and
//!   recomputation from history for audit and repair
//! - [`TransactionCoordinator`]: the commit protocol; the only writer
//!
//! # Sign convention
//!
//! Entry amounts are signed minor units. An entry adds its amount to the
//! account balance regardless of the account type, and the amounts of one
//! transaction always sum to zero.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{TransactionCoordinator, ProposedEntry, ActorType};
//!
//! let coordinator = TransactionCoordinator::new(storage);
//!
//! let transaction = coordinator
//!     .submit(
//!         "Move cash to savings",
//!         actor_id,
//!         ActorType::User,
//!         vec![
//!             ProposedEntry::new(checking, -10_000),
//!             ProposedEntry::new(savings, 10_000),
//!         ],
//!     )
//!     .await?;
//! ```

pub mod account;
pub mod transaction;
pub mod validation;
pub mod authorization;
pub mod projection;
pub mod coordinator;
pub mod ports;
pub mod error;

pub use account::{Account, AccountType};
pub use transaction::{Transaction, LedgerEntry, ProposedEntry, ActorType};
pub use validation::{EntryValidator, ValidatedEntries};
pub use authorization::{AuthorizationGuard, ResolvedAccounts};
pub use projection::{BalanceProjector, BalanceReconciliation};
pub use coordinator::{
    TransactionCoordinator, SubmissionState, AccountBalance, TransactionFilter, ListingLimits,
};
pub use ports::{
    AccountStore, LedgerStore, TransactionStore, UnitOfWork, UnitOfWorkProvider, LedgerStorage,
    Page, PageRequest,
};
#[cfg(any(test, feature = "mock"))]
pub use ports::memory::{InMemoryLedgerStore, FailurePoint};
pub use error::{LedgerError, ValidationError, AuthorizationError, BusinessRuleError};
