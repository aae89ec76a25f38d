//! Account snapshots
//!
//! Accounts are registered by an outside collaborator with a zero balance.
//! Inside the engine an [`Account`] is a read snapshot: the cached balance is
//! only ever written back through a unit of work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, ActorId, Currency, MinorUnits, Money};

/// Types of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Asset accounts; their balance may not go below zero
    Asset,
    /// Liability accounts
    Liability,
    /// Equity accounts
    Equity,
}

impl AccountType {
    /// Returns true if the balance of this account type must stay non-negative
    ///
    /// Only ASSET accounts carry the floor. LIABILITY and EQUITY balances
    /// may go negative under the single additive sign convention.
    pub fn is_floor_checked(&self) -> bool {
        matches!(self, AccountType::Asset)
    }

    /// Returns the storage/wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASSET" => Ok(AccountType::Asset),
            "LIABILITY" => Ok(AccountType::Liability),
            "EQUITY" => Ok(AccountType::Equity),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// An account as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// The actor allowed to move funds through this account
    pub owner_id: ActorId,
    /// Account type
    pub account_type: AccountType,
    /// Unit of account
    pub currency: Currency,
    /// Cached balance in minor units
    pub balance: MinorUnits,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a freshly registered account with a zero balance
    pub fn new(owner_id: ActorId, account_type: AccountType, currency: Currency) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            account_type,
            currency,
            balance: MinorUnits::zero(),
            created_at: Utc::now(),
        }
    }

    /// Returns a copy carrying the given balance
    pub fn with_balance(mut self, balance: impl Into<MinorUnits>) -> Self {
        self.balance = balance.into();
        self
    }

    /// Returns true if the account is owned by `actor_id`
    pub fn is_owned_by(&self, actor_id: ActorId) -> bool {
        self.owner_id == actor_id
    }

    /// Returns the cached balance tagged with the account currency
    pub fn balance_money(&self) -> Money {
        Money::new(self.balance.clone(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_assets_are_floor_checked() {
        assert!(AccountType::Asset.is_floor_checked());
        assert!(!AccountType::Liability.is_floor_checked());
        assert!(!AccountType::Equity.is_floor_checked());
    }

    #[test]
    fn test_new_account_starts_at_zero() {
        let account = Account::new(ActorId::new(), AccountType::Asset, Currency::USD);
        assert!(account.balance.is_zero());
        assert_eq!(account.balance_money().to_string(), "0.00 USD");
    }

    #[test]
    fn test_account_type_wire_names() {
        assert_eq!(AccountType::Liability.to_string(), "LIABILITY");
        assert_eq!("equity".parse::<AccountType>().unwrap(), AccountType::Equity);
        assert!("REVENUE".parse::<AccountType>().is_err());
    }
}
