//! Ledger Storage Ports
//!
//! This module defines what the ledger engine needs from storage. The
//! coordinator only ever talks to these traits; adapters live elsewhere:
//!
//! - **PostgreSQL Adapter**: `infra_db::adapters::PostgresLedgerStore`
//! - **In-memory Adapter**: [`memory::InMemoryLedgerStore`] (tests, feature `mock`)
//!
//! # Units of work
//!
//! Every write happens inside a [`UnitOfWork`] obtained from
//! [`UnitOfWorkProvider::begin`]. A unit is all-or-nothing: nothing it wrote
//! is visible to anyone until [`UnitOfWork::commit`] succeeds, and dropping
//! a unit without committing rolls it back. Account locks taken with
//! [`UnitOfWork::lock_account`] are held until the unit ends.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerStorage, TransactionCoordinator};
//! use std::sync::Arc;
//!
//! let storage: Arc<dyn LedgerStorage> = Arc::new(PostgresLedgerStore::new(pool));
//! let coordinator = TransactionCoordinator::new(storage);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, ActorId, DomainPort, HealthCheckable, MinorUnits, PortError, TransactionId};

use crate::account::Account;
use crate::transaction::{LedgerEntry, Transaction};

#[cfg(any(test, feature = "mock"))]
pub mod memory;

/// One page of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Maximum items per page
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Number of items to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// Total number of matching items across all pages
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

/// Read access to account snapshots
#[async_trait]
pub trait AccountStore: DomainPort {
    /// Loads the given accounts; ids that do not exist are simply absent
    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, PortError>;

    /// Loads one account without locking it
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError>;

    /// Overwrites the cached balance outside any unit of work
    ///
    /// Not used by the engine, which writes balances only through a unit.
    /// Kept for administrative tooling and drift simulation in tests.
    async fn update_balance(&self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError>;
}

/// Read access to committed ledger entries
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// All entries ever committed against an account, oldest first
    async fn entries_by_account(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError>;

    /// Entries of one transaction in submission order
    async fn entries_by_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, PortError>;
}

/// Read access to committed transactions
#[async_trait]
pub trait TransactionStore: DomainPort {
    /// Loads a transaction together with its entries
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, PortError>;

    /// Transactions touching at least one account owned by `owner_id`,
    /// optionally narrowed to one account, newest first
    async fn transactions_by_owner(
        &self,
        owner_id: ActorId,
        account_id: Option<AccountId>,
        request: PageRequest,
    ) -> Result<Page<Transaction>, PortError>;
}

/// An open atomic unit of work
#[async_trait]
pub trait UnitOfWork: Send {
    /// Stages the transaction row
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError>;

    /// Stages one ledger entry row
    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), PortError>;

    /// Takes the exclusive lock on an account and returns its current row
    ///
    /// Returns `Ok(None)` if the account does not exist. Lock waits are
    /// bounded; a timeout is reported as a conflict.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError>;

    /// Committed entries of an account as seen from inside this unit
    async fn entries_for_account(&mut self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError>;

    /// Stages a new cached balance for an account locked by this unit
    async fn update_balance(&mut self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError>;

    /// Makes every staged write visible atomically and releases locks
    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    /// Discards every staged write and releases locks
    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// Opens units of work
#[async_trait]
pub trait UnitOfWorkProvider: DomainPort {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PortError>;
}

/// Everything the coordinator needs from storage
pub trait LedgerStorage:
    AccountStore + LedgerStore + TransactionStore + UnitOfWorkProvider + HealthCheckable
{
}

impl<T> LedgerStorage for T where
    T: AccountStore + LedgerStore + TransactionStore + UnitOfWorkProvider + HealthCheckable
{
}
