//! Custom Test Assertions
//!
//! Provides ledger-specific assertion helpers that give more meaningful
//! error messages than standard assertions.

use core_kernel::{AccountId, MinorUnits};
use domain_ledger::{
    BalanceReconciliation, LedgerError, LedgerStore, Transaction, TransactionCoordinator,
};

/// Asserts that a committed transaction sums to zero
pub fn assert_balanced(transaction: &Transaction) {
    assert!(
        transaction.is_balanced(),
        "Transaction {} is unbalanced: entries sum to {}",
        transaction.id,
        transaction.total()
    );
}

/// Asserts that entry positions run 0..n in order
pub fn assert_entry_positions(transaction: &Transaction) {
    let positions: Vec<u32> = transaction.entries.iter().map(|e| e.position).collect();
    let expected: Vec<u32> = (0..transaction.entries.len() as u32).collect();
    assert_eq!(
        positions, expected,
        "Transaction {} has out-of-order entry positions",
        transaction.id
    );
}

/// Asserts that a reconciliation found no drift
pub fn assert_in_sync(reconciliation: &BalanceReconciliation) {
    assert!(
        reconciliation.in_sync,
        "Account {} drifted: cached={}, recomputed={}",
        reconciliation.account_id,
        reconciliation.cached,
        reconciliation.recomputed
    );
}

/// Asserts that an error carries the expected kind
pub fn assert_error_kind<T: std::fmt::Debug>(result: &Result<T, LedgerError>, kind: &str) {
    match result {
        Err(error) => assert_eq!(error.kind(), kind, "Unexpected error: {error}"),
        Ok(value) => panic!("Expected {kind} error, got Ok({value:?})"),
    }
}

/// Asserts that the cached balance equals the sum of the entry history
///
/// # Panics
///
/// Panics if the account is missing or the history cannot be read
pub async fn assert_balance_matches_history<S>(
    coordinator: &TransactionCoordinator,
    store: &S,
    account_id: AccountId,
) where
    S: LedgerStore + ?Sized,
{
    let cached = coordinator
        .get_balance(account_id)
        .await
        .expect("account balance")
        .balance;
    let history: MinorUnits = store
        .entries_by_account(account_id)
        .await
        .expect("entry history")
        .iter()
        .map(|entry| &entry.amount)
        .sum();
    assert_eq!(
        cached, history,
        "Account {account_id}: cached balance {cached} differs from history {history}"
    );
}
