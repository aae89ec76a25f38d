//! Account resolution, ownership and currency checks

use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

use core_kernel::{AccountId, ActorId, Currency};

use crate::account::Account;
use crate::error::{AuthorizationError, LedgerError};
use crate::ports::AccountStore;
use crate::validation::ValidatedEntries;

/// Snapshots of every account referenced by a validated entry set
///
/// These are read-time copies used for the fail-fast pre-check; they are
/// never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccounts {
    accounts: BTreeMap<AccountId, Account>,
}

impl ResolvedAccounts {
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// Accounts in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The single currency shared by all accounts
    pub fn currency(&self) -> Option<Currency> {
        self.accounts.values().next().map(|a| a.currency)
    }
}

/// Resolves referenced accounts and enforces ownership and currency uniformity
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGuard;

impl AuthorizationGuard {
    pub fn new() -> Self {
        Self
    }

    /// Loads the referenced accounts from `accounts` and checks them against the actor
    #[instrument(skip(self, accounts, entries), fields(account_count = entries.account_ids().len()))]
    pub async fn authorize<S>(
        &self,
        accounts: &S,
        entries: &ValidatedEntries,
        actor_id: ActorId,
    ) -> Result<ResolvedAccounts, LedgerError>
    where
        S: AccountStore + ?Sized,
    {
        let ids: Vec<AccountId> = entries.account_ids().into_iter().collect();
        let found = accounts.find_accounts(&ids).await?;
        Ok(Self::check(&ids, found, actor_id)?)
    }

    /// Pure part of [`authorize`](Self::authorize)
    ///
    /// Checks run in a fixed order, each over accounts in ascending id
    /// order: missing accounts, then ownership, then currency.
    pub fn check(
        requested: &[AccountId],
        found: Vec<Account>,
        actor_id: ActorId,
    ) -> Result<ResolvedAccounts, AuthorizationError> {
        let accounts: BTreeMap<AccountId, Account> =
            found.into_iter().map(|a| (a.id, a)).collect();

        let requested: BTreeSet<AccountId> = requested.iter().copied().collect();
        if let Some(missing) = requested.iter().find(|id| !accounts.contains_key(*id)) {
            return Err(AuthorizationError::AccountNotFound(*missing));
        }

        if let Some(foreign) = accounts.values().find(|a| !a.is_owned_by(actor_id)) {
            return Err(AuthorizationError::Forbidden {
                account_id: foreign.id,
            });
        }

        let currencies: BTreeSet<Currency> = accounts.values().map(|a| a.currency).collect();
        if currencies.len() > 1 {
            return Err(AuthorizationError::CurrencyMismatch {
                currencies: currencies.into_iter().collect(),
            });
        }

        Ok(ResolvedAccounts { accounts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;

    fn account(owner: ActorId, currency: Currency) -> Account {
        Account::new(owner, AccountType::Asset, currency)
    }

    #[test]
    fn test_owned_same_currency_accounts_resolve() {
        let owner = ActorId::new();
        let a = account(owner, Currency::USD);
        let b = account(owner, Currency::USD);
        let resolved =
            AuthorizationGuard::check(&[a.id, b.id], vec![a.clone(), b.clone()], owner).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.currency(), Some(Currency::USD));
        assert_eq!(resolved.get(&a.id), Some(&a));
    }

    #[test]
    fn test_missing_account_reported_before_ownership() {
        let owner = ActorId::new();
        let foreign = account(ActorId::new(), Currency::USD);
        let missing = AccountId::new();
        let result = AuthorizationGuard::check(&[foreign.id, missing], vec![foreign], owner);
        assert_eq!(result, Err(AuthorizationError::AccountNotFound(missing)));
    }

    #[test]
    fn test_foreign_account_is_forbidden() {
        let owner = ActorId::new();
        let mine = account(owner, Currency::USD);
        let theirs = account(ActorId::new(), Currency::USD);
        let result =
            AuthorizationGuard::check(&[mine.id, theirs.id], vec![mine, theirs.clone()], owner);
        assert_eq!(
            result,
            Err(AuthorizationError::Forbidden {
                account_id: theirs.id
            })
        );
    }

    #[test]
    fn test_ownership_reported_before_currency() {
        let owner = ActorId::new();
        let mine = account(owner, Currency::USD);
        let theirs = account(ActorId::new(), Currency::EUR);
        let result = AuthorizationGuard::check(&[mine.id, theirs.id], vec![mine, theirs], owner);
        assert!(matches!(result, Err(AuthorizationError::Forbidden { .. })));
    }

    #[test]
    fn test_mixed_currencies_are_rejected() {
        let owner = ActorId::new();
        let usd = account(owner, Currency::USD);
        let eur = account(owner, Currency::EUR);
        let result = AuthorizationGuard::check(&[usd.id, eur.id], vec![usd, eur], owner);
        assert_eq!(
            result,
            Err(AuthorizationError::CurrencyMismatch {
                currencies: vec![Currency::EUR, Currency::USD]
            })
        );
    }
}
