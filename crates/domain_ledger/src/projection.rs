//! Balance projection
//!
//! Two modes that never share a code path:
//!
//! - **apply**: the incremental step used when committing. Adds a delta to an
//!   account snapshot and enforces the ASSET floor.
//! - **recompute**: sums an account's full entry history. Used for audit and
//!   explicit repair only.

use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, MinorUnits};

use crate::account::Account;
use crate::error::BusinessRuleError;
use crate::transaction::LedgerEntry;

/// Comparison of a cached balance against its entry history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReconciliation {
    pub account_id: AccountId,
    /// Sum of every committed entry of the account
    pub recomputed: MinorUnits,
    /// Cached balance observed before any repair
    pub cached: MinorUnits,
    pub in_sync: bool,
    /// True if the recomputed value was written over the cached one
    pub repaired: bool,
}

/// Stateless balance arithmetic
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceProjector;

impl BalanceProjector {
    pub fn new() -> Self {
        Self
    }

    /// Projects `delta` onto the account's balance
    ///
    /// Fails with `InsufficientBalance` if the account is floor-checked and
    /// the projected balance would be negative.
    pub fn apply(&self, account: &Account, delta: &MinorUnits) -> Result<MinorUnits, BusinessRuleError> {
        let projected = &account.balance + delta;
        if account.account_type.is_floor_checked() && projected.is_negative() {
            return Err(BusinessRuleError::InsufficientBalance {
                account_id: account.id,
                current: account.balance.clone(),
                required_magnitude: delta.abs(),
            });
        }
        Ok(projected)
    }

    /// Sums entry amounts; order does not matter
    pub fn recompute<'a, I>(&self, entries: I) -> MinorUnits
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries.into_iter().map(|e| &e.amount).sum()
    }

    /// Compares the account's cached balance with its recomputed history
    pub fn reconcile(&self, account: &Account, entries: &[LedgerEntry]) -> BalanceReconciliation {
        let recomputed = self.recompute(entries.iter().filter(|e| e.account_id == account.id));
        let in_sync = recomputed == account.balance;
        BalanceReconciliation {
            account_id: account.id,
            recomputed,
            cached: account.balance.clone(),
            in_sync,
            repaired: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use chrono::Utc;
    use core_kernel::{ActorId, Currency, LedgerEntryId, TransactionId};

    fn account(account_type: AccountType, balance: i64) -> Account {
        Account::new(ActorId::new(), account_type, Currency::USD).with_balance(balance)
    }

    fn entry(account_id: AccountId, amount: i64) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new_v7(),
            transaction_id: TransactionId::new_v7(),
            account_id,
            amount: MinorUnits::from(amount),
            position: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_asset_may_reach_exactly_zero() {
        let projector = BalanceProjector::new();
        let cash = account(AccountType::Asset, 10_000);
        let projected = projector.apply(&cash, &MinorUnits::from(-10_000)).unwrap();
        assert!(projected.is_zero());
    }

    #[test]
    fn test_asset_below_zero_is_insufficient() {
        let projector = BalanceProjector::new();
        let cash = account(AccountType::Asset, 40_000);
        let err = projector.apply(&cash, &MinorUnits::from(-100_000)).unwrap_err();
        assert_eq!(
            err,
            BusinessRuleError::InsufficientBalance {
                account_id: cash.id,
                current: MinorUnits::from(40_000),
                required_magnitude: MinorUnits::from(100_000),
            }
        );
    }

    #[test]
    fn test_liability_and_equity_are_not_floor_checked() {
        let projector = BalanceProjector::new();
        for account_type in [AccountType::Liability, AccountType::Equity] {
            let acc = account(account_type, 0);
            let projected = projector.apply(&acc, &MinorUnits::from(-5)).unwrap();
            assert_eq!(projected, MinorUnits::from(-5));
        }
    }

    #[test]
    fn test_reconcile_detects_drift() {
        let projector = BalanceProjector::new();
        let acc = account(AccountType::Asset, 999);
        let entries = vec![entry(acc.id, 500), entry(acc.id, -100), entry(AccountId::new(), 7)];

        let report = projector.reconcile(&acc, &entries);
        assert_eq!(report.recomputed, MinorUnits::from(400));
        assert_eq!(report.cached, MinorUnits::from(999));
        assert!(!report.in_sync);
        assert!(!report.repaired);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::account::AccountType;
    use chrono::Utc;
    use core_kernel::{ActorId, Currency, LedgerEntryId, TransactionId};
    use proptest::prelude::*;

    /// Legs as (booked to the reconciled account, amount), in generated
    /// order and reordered
    fn history_strategy() -> impl Strategy<Value = (Vec<(bool, i64)>, Vec<(bool, i64)>)> {
        prop::collection::vec((any::<bool>(), -1_000_000_000_000i64..1_000_000_000_000i64), 0..40)
            .prop_flat_map(|legs| (Just(legs.clone()), Just(legs).prop_shuffle()))
    }

    fn entries(own: AccountId, other: AccountId, legs: &[(bool, i64)]) -> Vec<LedgerEntry> {
        legs.iter()
            .map(|(is_own, amount)| LedgerEntry {
                id: LedgerEntryId::new_v7(),
                transaction_id: TransactionId::new_v7(),
                account_id: if *is_own { own } else { other },
                amount: MinorUnits::from(*amount),
                position: 0,
                created_at: Utc::now(),
            })
            .collect()
    }

    proptest! {
        #[test]
        fn test_recompute_ignores_entry_order((original, shuffled) in history_strategy()) {
            let projector = BalanceProjector::new();
            let own = AccountId::new();
            let forward = entries(own, own, &original);
            let reordered = entries(own, own, &shuffled);

            let expected: i64 = original.iter().map(|(_, amount)| amount).sum();
            prop_assert_eq!(projector.recompute(&forward), MinorUnits::from(expected));
            prop_assert_eq!(projector.recompute(&reordered), MinorUnits::from(expected));
            prop_assert_eq!(projector.recompute(&forward), projector.recompute(&forward));
        }

        #[test]
        fn test_reconcile_ignores_entry_order((original, shuffled) in history_strategy()) {
            let projector = BalanceProjector::new();
            let balance: i64 = original.iter().filter(|(is_own, _)| *is_own).map(|(_, amount)| amount).sum();
            let account = Account::new(ActorId::new(), AccountType::Asset, Currency::USD)
                .with_balance(balance);
            let other = AccountId::new();

            let forward = entries(account.id, other, &original);
            let reordered = entries(account.id, other, &shuffled);

            let first = projector.reconcile(&account, &forward);
            let second = projector.reconcile(&account, &reordered);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.in_sync);
            prop_assert_eq!(&first.recomputed, &MinorUnits::from(balance));

            let again = projector.reconcile(&account, &forward);
            prop_assert_eq!(first, again);
        }
    }
}
