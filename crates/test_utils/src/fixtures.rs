//! Pre-built Test Fixtures
//!
//! Fixed ids, amounts, entry sets and request bodies shared by the adapter
//! and HTTP suites.

use core_kernel::{AccountId, ActorId, MinorUnits};
use domain_ledger::ProposedEntry;
use num_bigint::BigInt;
use serde_json::{json, Value};
use uuid::Uuid;

/// Fixture for minor-unit amounts
pub struct AmountFixtures;

impl AmountFixtures {
    /// An amount far outside the `i64` range
    pub fn beyond_i64() -> MinorUnits {
        MinorUnits::from(BigInt::from(i64::MAX) * BigInt::from(1_000_000))
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A fixed actor that owns nothing
    pub fn stranger() -> ActorId {
        ActorId::from(Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_0002))
    }

    /// An account id that is never registered
    pub fn unknown_account() -> AccountId {
        AccountId::from(Uuid::from_u128(0x0192_0000_0000_7000_8000_0000_0000_dead))
    }
}

/// Fixture for proposed entry sets
pub struct EntryFixtures;

impl EntryFixtures {
    /// Two balanced legs moving `amount` from `from` to `to`
    pub fn transfer(from: AccountId, to: AccountId, amount: impl Into<MinorUnits>) -> Vec<ProposedEntry> {
        let amount = amount.into();
        vec![
            ProposedEntry::new(from, -amount.clone()),
            ProposedEntry::new(to, amount),
        ]
    }
}

/// Fixture for JSON request bodies
pub struct RequestFixtures;

impl RequestFixtures {
    /// Body for `POST /api/v1/transactions`
    pub fn transfer_body(from: AccountId, to: AccountId, amount: i64) -> Value {
        json!({
            "description": "fixture transfer",
            "entries": [
                { "account_id": from, "amount": (-amount).to_string() },
                { "account_id": to, "amount": amount.to_string() },
            ],
        })
    }

    /// Body with one leg per amount, cycling through `accounts`
    pub fn entries_body(accounts: &[AccountId], amounts: &[i64]) -> Value {
        let entries: Vec<Value> = amounts
            .iter()
            .zip(accounts.iter().cycle())
            .map(|(amount, account)| json!({ "account_id": account, "amount": amount.to_string() }))
            .collect();
        json!({ "description": "fixture legs", "entries": entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_fixture_is_balanced() {
        let entries = EntryFixtures::transfer(AccountId::new(), AccountId::new(), 500);
        let total: MinorUnits = entries.iter().map(|e| &e.amount).sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_beyond_i64_exceeds_machine_range() {
        assert!(AmountFixtures::beyond_i64().as_bigint() > &BigInt::from(i64::MAX));
    }

    #[test]
    fn test_transfer_body_uses_string_amounts() {
        let body = RequestFixtures::transfer_body(AccountId::new(), AccountId::new(), 250);
        assert_eq!(body["entries"][0]["amount"], "-250");
        assert_eq!(body["entries"][1]["amount"], "250");
    }

    #[test]
    fn test_entries_body_cycles_accounts() {
        let a = AccountId::new();
        let b = AccountId::new();
        let body = RequestFixtures::entries_body(&[a, b], &[5, -2, -3]);
        let entries = body["entries"].as_array().unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["account_id"], serde_json::to_value(a).unwrap());
        assert_eq!(entries[2]["amount"], "-3");
    }
}
