//! Test Data Builders
//!
//! Provides a builder for seeded in-memory ledgers. Tests name only the
//! accounts they care about and take defaults for everything else.

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AccountId, ActorId, Currency, MinorUnits};
use domain_ledger::{
    AccountType, ActorType, InMemoryLedgerStore, ListingLimits, ProposedEntry,
    TransactionCoordinator,
};

use crate::fixtures::EntryFixtures;

/// One account requested from a [`LedgerBuilder`]
#[derive(Debug, Clone)]
struct PlannedAccount {
    account_type: AccountType,
    currency: Currency,
    opening: i64,
}

/// Builder for an in-memory ledger with funded accounts
///
/// Every account is owned by the builder's owner. Opening balances are
/// posted as real transactions from an equity capital account, so entry
/// history and cached balances agree from the start.
pub struct LedgerBuilder {
    owner: ActorId,
    lock_timeout: Option<Duration>,
    limits: ListingLimits,
    accounts: Vec<PlannedAccount>,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self {
            owner: ActorId::new(),
            lock_timeout: None,
            limits: ListingLimits::default(),
            accounts: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: ActorId) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn with_limits(mut self, limits: ListingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Adds a USD account with an opening balance
    pub fn with_account(self, account_type: AccountType, opening: i64) -> Self {
        self.with_currency_account(account_type, Currency::USD, opening)
    }

    pub fn with_currency_account(
        mut self,
        account_type: AccountType,
        currency: Currency,
        opening: i64,
    ) -> Self {
        self.accounts.push(PlannedAccount {
            account_type,
            currency,
            opening,
        });
        self
    }

    /// Creates the store, the accounts, and the funding transactions
    ///
    /// # Panics
    ///
    /// Panics if a funding transaction is rejected
    pub async fn build(self) -> SeededLedger {
        let store = match self.lock_timeout {
            Some(timeout) => InMemoryLedgerStore::with_lock_timeout(timeout),
            None => InMemoryLedgerStore::new(),
        };
        let coordinator =
            TransactionCoordinator::new(Arc::new(store.clone())).with_limits(self.limits);

        let mut capital = std::collections::BTreeMap::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for planned in self.accounts {
            let account = store
                .create_account(self.owner, planned.account_type, planned.currency)
                .await;
            if planned.opening != 0 {
                let source = match capital.get(&planned.currency) {
                    Some(id) => *id,
                    None => {
                        let equity = store
                            .create_account(self.owner, AccountType::Equity, planned.currency)
                            .await;
                        capital.insert(planned.currency, equity.id);
                        equity.id
                    }
                };
                coordinator
                    .submit(
                        "opening balance",
                        self.owner,
                        ActorType::System,
                        vec![
                            ProposedEntry::new(source, -planned.opening),
                            ProposedEntry::new(account.id, planned.opening),
                        ],
                    )
                    .await
                    .expect("opening balance transaction");
            }
            accounts.push(account.id);
        }

        SeededLedger {
            store,
            coordinator,
            owner: self.owner,
            accounts,
        }
    }
}

/// An in-memory ledger produced by [`LedgerBuilder`]
#[derive(Clone)]
pub struct SeededLedger {
    pub store: InMemoryLedgerStore,
    pub coordinator: TransactionCoordinator,
    pub owner: ActorId,
    /// Accounts in the order they were requested
    pub accounts: Vec<AccountId>,
}

impl SeededLedger {
    /// The `index`-th requested account
    ///
    /// # Panics
    ///
    /// Panics if fewer accounts were requested
    pub fn account(&self, index: usize) -> AccountId {
        self.accounts[index]
    }

    /// Moves `amount` between two accounts as the owner
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<domain_ledger::Transaction, domain_ledger::LedgerError> {
        self.coordinator
            .submit(
                "transfer",
                self.owner,
                ActorType::User,
                EntryFixtures::transfer(from, to, amount),
            )
            .await
    }

    /// Current cached balance
    ///
    /// # Panics
    ///
    /// Panics if the account does not exist
    pub async fn balance(&self, account_id: AccountId) -> MinorUnits {
        self.coordinator
            .get_balance(account_id)
            .await
            .expect("account balance")
            .balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ledger_builder_funds_accounts() {
        let ledger = LedgerBuilder::new()
            .with_account(AccountType::Asset, 5_000)
            .with_account(AccountType::Liability, 0)
            .build()
            .await;

        assert_eq!(ledger.balance(ledger.account(0)).await, MinorUnits::from(5_000));
        assert_eq!(ledger.balance(ledger.account(1)).await, MinorUnits::zero());
        assert_eq!(ledger.store.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_ledger_builder_uses_one_capital_account_per_currency() {
        let ledger = LedgerBuilder::new()
            .with_currency_account(AccountType::Asset, Currency::EUR, 100)
            .with_currency_account(AccountType::Asset, Currency::EUR, 200)
            .build()
            .await;

        ledger
            .transfer(ledger.account(0), ledger.account(1), 50)
            .await
            .unwrap();
        assert_eq!(ledger.balance(ledger.account(1)).await, MinorUnits::from(250));
    }
}
