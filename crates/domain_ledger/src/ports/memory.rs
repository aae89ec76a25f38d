//! In-memory storage adapter
//!
//! Behaves like the PostgreSQL adapter where the engine can tell the
//! difference: writes made inside a unit are invisible until commit, every
//! account has its own exclusive lock with a bounded wait, and a dropped
//! unit leaves no trace. Faults can be injected at chosen points to
//! exercise rollback.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use core_kernel::{
    AccountId, ActorId, AdapterHealth, Currency, DomainPort, HealthCheckResult, HealthCheckable,
    MinorUnits, PortError, TransactionId,
};

use super::{
    AccountStore, LedgerStore, Page, PageRequest, TransactionStore, UnitOfWork, UnitOfWorkProvider,
};
use crate::account::{Account, AccountType};
use crate::transaction::{LedgerEntry, Transaction};

/// Default bound on how long a unit waits for an account lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an injected fault fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    InsertTransaction,
    InsertEntry,
    UpdateBalance,
    Commit,
}

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<AccountId, Account>,
    /// Transaction headers; entries live in `entries`
    transactions: HashMap<TransactionId, Transaction>,
    entries: Vec<LedgerEntry>,
}

impl State {
    fn assemble(&self, header: &Transaction) -> Transaction {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .iter()
            .filter(|e| e.transaction_id == header.id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.position);
        Transaction {
            entries,
            ..header.clone()
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: RwLock<State>,
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    lock_timeout: Duration,
    failure: Mutex<Option<FailurePoint>>,
}

impl Inner {
    async fn account_lock(&self, id: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Consumes the injected fault if it is armed for `point`
    async fn trip(&self, point: FailurePoint) -> Result<(), PortError> {
        let mut failure = self.failure.lock().await;
        if *failure == Some(point) {
            *failure = None;
            return Err(PortError::internal(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

/// In-memory implementation of every ledger storage port
#[derive(Debug, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(State::default()),
                locks: Mutex::new(HashMap::new()),
                lock_timeout,
                failure: Mutex::new(None),
            }),
        }
    }

    /// Registers a new account with a zero balance
    pub async fn create_account(
        &self,
        owner_id: ActorId,
        account_type: AccountType,
        currency: Currency,
    ) -> Account {
        let account = Account::new(owner_id, account_type, currency);
        self.seed_account(account.clone()).await;
        account
    }

    /// Inserts an account snapshot as-is
    ///
    /// A non-zero seeded balance has no entry history behind it, so
    /// recomputation will report it as drift.
    pub async fn seed_account(&self, account: Account) {
        self.inner.state.write().await.accounts.insert(account.id, account);
    }

    /// Arms a one-shot fault at the given point
    pub async fn fail_next(&self, point: FailurePoint) {
        *self.inner.failure.lock().await = Some(point);
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.state.read().await.transactions.len()
    }

    pub async fn entry_count(&self) -> usize {
        self.inner.state.read().await.entries.len()
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory adapter always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryLedgerStore {
    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, PortError> {
        let state = self.inner.state.read().await;
        Ok(ids.iter().filter_map(|id| state.accounts.get(id).cloned()).collect())
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError> {
        Ok(self.inner.state.read().await.accounts.get(&id).cloned())
    }

    async fn update_balance(&self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError> {
        let mut state = self.inner.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Account", id))?;
        account.balance = balance.clone();
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn entries_by_account(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError> {
        let state = self.inner.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn entries_by_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let state = self.inner.state.read().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.transaction_id == transaction_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedgerStore {
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, PortError> {
        let state = self.inner.state.read().await;
        Ok(state.transactions.get(&id).map(|header| state.assemble(header)))
    }

    async fn transactions_by_owner(
        &self,
        owner_id: ActorId,
        account_id: Option<AccountId>,
        request: PageRequest,
    ) -> Result<Page<Transaction>, PortError> {
        let state = self.inner.state.read().await;

        let mut matching: Vec<Transaction> = state
            .transactions
            .values()
            .map(|header| state.assemble(header))
            .filter(|tx| {
                tx.entries.iter().any(|e| {
                    state
                        .accounts
                        .get(&e.account_id)
                        .is_some_and(|a| a.owner_id == owner_id)
                })
            })
            .filter(|tx| match account_id {
                Some(id) => tx.entries.iter().any(|e| e.account_id == id),
                None => true,
            })
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();

        Ok(Page::new(items, request, total))
    }
}

#[async_trait]
impl UnitOfWorkProvider for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PortError> {
        Ok(Box::new(InMemoryUnitOfWork {
            inner: Arc::clone(&self.inner),
            guards: BTreeMap::new(),
            transactions: Vec::new(),
            entries: Vec::new(),
            balances: BTreeMap::new(),
        }))
    }
}

/// A unit of work over [`InMemoryLedgerStore`]
///
/// Writes are staged locally and applied under one state write lock at
/// commit. Account lock guards are released when the unit is consumed or
/// dropped.
pub struct InMemoryUnitOfWork {
    inner: Arc<Inner>,
    guards: BTreeMap<AccountId, OwnedMutexGuard<()>>,
    transactions: Vec<Transaction>,
    entries: Vec<LedgerEntry>,
    balances: BTreeMap<AccountId, MinorUnits>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        self.inner.trip(FailurePoint::InsertTransaction).await?;
        let header = Transaction {
            entries: Vec::new(),
            ..transaction.clone()
        };
        self.transactions.push(header);
        Ok(())
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), PortError> {
        self.inner.trip(FailurePoint::InsertEntry).await?;
        if !self.transactions.iter().any(|t| t.id == entry.transaction_id) {
            return Err(PortError::validation(format!(
                "entry references unknown transaction {}",
                entry.transaction_id
            )));
        }
        if !self.inner.state.read().await.accounts.contains_key(&entry.account_id) {
            return Err(PortError::validation(format!(
                "entry references unknown account {}",
                entry.account_id
            )));
        }
        self.entries.push(entry.clone());
        Ok(())
    }

    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        if !self.guards.contains_key(&id) {
            let lock = self.inner.account_lock(id).await;
            let started = Instant::now();
            let guard = tokio::time::timeout(self.inner.lock_timeout, lock.lock_owned())
                .await
                .map_err(|_| PortError::Timeout {
                    operation: format!("lock account {}", id),
                    duration_ms: started.elapsed().as_millis() as u64,
                })?;
            self.guards.insert(id, guard);
        }

        let state = self.inner.state.read().await;
        let Some(mut account) = state.accounts.get(&id).cloned() else {
            drop(state);
            self.guards.remove(&id);
            return Ok(None);
        };
        if let Some(staged) = self.balances.get(&id) {
            account.balance = staged.clone();
        }
        Ok(Some(account))
    }

    async fn entries_for_account(&mut self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError> {
        let state = self.inner.state.read().await;
        Ok(state
            .entries
            .iter()
            .chain(self.entries.iter())
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn update_balance(&mut self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError> {
        self.inner.trip(FailurePoint::UpdateBalance).await?;
        if !self.guards.contains_key(&id) {
            return Err(PortError::internal(format!(
                "balance update on {} without holding its lock",
                id
            )));
        }
        self.balances.insert(id, balance.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let unit = *self;
        unit.inner.trip(FailurePoint::Commit).await?;

        let mut state = unit.inner.state.write().await;
        if let Some(missing) = unit.balances.keys().find(|id| !state.accounts.contains_key(*id)) {
            return Err(PortError::not_found("Account", missing));
        }
        for (id, balance) in unit.balances {
            if let Some(account) = state.accounts.get_mut(&id) {
                account.balance = balance;
            }
        }
        for header in unit.transactions {
            state.transactions.insert(header.id, header);
        }
        state.entries.extend(unit.entries);
        drop(state);

        drop(unit.guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unit_writes_invisible_until_commit() {
        let store = InMemoryLedgerStore::new();
        let account = store
            .create_account(ActorId::new(), AccountType::Asset, Currency::USD)
            .await;

        let mut unit = store.begin().await.unwrap();
        unit.lock_account(account.id).await.unwrap();
        unit.update_balance(account.id, &MinorUnits::from(700)).await.unwrap();

        let outside = store.find_account(account.id).await.unwrap().unwrap();
        assert!(outside.balance.is_zero());

        unit.commit().await.unwrap();
        let after = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(after.balance, MinorUnits::from(700));
    }

    #[tokio::test]
    async fn test_dropped_unit_releases_lock() {
        let store = InMemoryLedgerStore::with_lock_timeout(Duration::from_millis(50));
        let account = store
            .create_account(ActorId::new(), AccountType::Asset, Currency::USD)
            .await;

        let mut first = store.begin().await.unwrap();
        first.lock_account(account.id).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let blocked = second.lock_account(account.id).await;
        assert!(matches!(blocked, Err(PortError::Timeout { .. })));

        drop(first);
        assert!(second.lock_account(account.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_balance_update_requires_lock() {
        let store = InMemoryLedgerStore::new();
        let account = store
            .create_account(ActorId::new(), AccountType::Equity, Currency::EUR)
            .await;

        let mut unit = store.begin().await.unwrap();
        let result = unit.update_balance(account.id, &MinorUnits::from(1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let store = InMemoryLedgerStore::new();
        store.fail_next(FailurePoint::Commit).await;

        let unit = store.begin().await.unwrap();
        assert!(unit.commit().await.is_err());

        let unit = store.begin().await.unwrap();
        assert!(unit.commit().await.is_ok());
    }
}
