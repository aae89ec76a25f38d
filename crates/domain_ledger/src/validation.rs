//! Structural validation of proposed entry sets

use std::collections::{BTreeMap, BTreeSet};

use core_kernel::{AccountId, MinorUnits};

use crate::error::ValidationError;
use crate::transaction::ProposedEntry;

/// Minimum number of entries in a transaction
pub const MIN_ENTRIES: usize = 2;

/// An entry set that passed [`EntryValidator::validate`]
///
/// Only the validator constructs this type, so holding one is proof that
/// the entries are at least two, all non-zero, and sum to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntries {
    entries: Vec<ProposedEntry>,
}

impl ValidatedEntries {
    /// Entries in submission order
    pub fn entries(&self) -> &[ProposedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct referenced accounts, ascending
    pub fn account_ids(&self) -> BTreeSet<AccountId> {
        self.entries.iter().map(|e| e.account_id).collect()
    }

    /// Net movement per distinct account, ascending by account id
    pub fn net_by_account(&self) -> BTreeMap<AccountId, MinorUnits> {
        let mut net: BTreeMap<AccountId, MinorUnits> = BTreeMap::new();
        for entry in &self.entries {
            *net.entry(entry.account_id).or_default() += &entry.amount;
        }
        net
    }

    pub fn into_entries(self) -> Vec<ProposedEntry> {
        self.entries
    }
}

/// Pure structural validator
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryValidator;

impl EntryValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates an entry set; the first failing rule wins
    ///
    /// 1. fewer than two entries
    /// 2. any zero amount (reported with its index)
    /// 3. amounts not summing to zero
    pub fn validate(&self, entries: Vec<ProposedEntry>) -> Result<ValidatedEntries, ValidationError> {
        if entries.len() < MIN_ENTRIES {
            return Err(ValidationError::InvalidEntryCount {
                count: entries.len(),
            });
        }

        if let Some(index) = entries.iter().position(|e| e.amount.is_zero()) {
            return Err(ValidationError::ZeroAmountEntry { index });
        }

        let sum: MinorUnits = entries.iter().map(|e| &e.amount).sum();
        if !sum.is_zero() {
            return Err(ValidationError::UnbalancedTransaction { sum });
        }

        Ok(ValidatedEntries { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(account: AccountId, amount: i64) -> ProposedEntry {
        ProposedEntry::new(account, amount)
    }

    #[test]
    fn test_balanced_pair_is_valid() {
        let a = AccountId::new();
        let b = AccountId::new();
        let validated = EntryValidator::new()
            .validate(vec![entry(a, -10_000), entry(b, 10_000)])
            .unwrap();
        assert_eq!(validated.len(), 2);
        assert_eq!(validated.account_ids().len(), 2);
    }

    #[test]
    fn test_single_entry_is_rejected() {
        let result = EntryValidator::new().validate(vec![entry(AccountId::new(), -10_000)]);
        assert_eq!(result, Err(ValidationError::InvalidEntryCount { count: 1 }));
    }

    #[test]
    fn test_count_rule_wins_over_zero_rule() {
        let result = EntryValidator::new().validate(vec![entry(AccountId::new(), 0)]);
        assert_eq!(result, Err(ValidationError::InvalidEntryCount { count: 1 }));
    }

    #[test]
    fn test_zero_rule_wins_over_balance_rule() {
        let a = AccountId::new();
        let result = EntryValidator::new().validate(vec![entry(a, 500), entry(a, 0), entry(a, 7)]);
        assert_eq!(result, Err(ValidationError::ZeroAmountEntry { index: 1 }));
    }

    #[test]
    fn test_unbalanced_reports_sum() {
        let result = EntryValidator::new()
            .validate(vec![entry(AccountId::new(), -10_000), entry(AccountId::new(), 5_000)]);
        assert_eq!(
            result,
            Err(ValidationError::UnbalancedTransaction {
                sum: MinorUnits::from(-5_000)
            })
        );
    }

    #[test]
    fn test_net_by_account_collapses_repeats() {
        let a = AccountId::new();
        let b = AccountId::new();
        let validated = EntryValidator::new()
            .validate(vec![entry(a, -300), entry(b, 500), entry(a, -200)])
            .unwrap();
        let net = validated.net_by_account();
        assert_eq!(net[&a], MinorUnits::from(-500));
        assert_eq!(net[&b], MinorUnits::from(500));
    }
}
