//! Transactions and ledger entries
//!
//! A [`Transaction`] owns its [`LedgerEntry`] records. Both are created
//! together by the coordinator and never mutated afterwards.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, ActorId, LedgerEntryId, MinorUnits, TransactionId};

use crate::error::ValidationError;

/// Kind of actor that initiated a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorType {
    User,
    System,
    Webhook,
}

impl ActorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::User => "USER",
            ActorType::System => "SYSTEM",
            ActorType::Webhook => "WEBHOOK",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(ActorType::User),
            "SYSTEM" => Ok(ActorType::System),
            "WEBHOOK" => Ok(ActorType::Webhook),
            other => Err(format!("unknown actor type: {}", other)),
        }
    }
}

/// A movement proposed by a caller, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedEntry {
    pub account_id: AccountId,
    /// Signed minor units; positive increases the account balance
    pub amount: MinorUnits,
}

impl ProposedEntry {
    pub fn new(account_id: AccountId, amount: impl Into<MinorUnits>) -> Self {
        Self {
            account_id,
            amount: amount.into(),
        }
    }
}

/// A committed, append-only movement against one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: MinorUnits,
    /// Zero-based index of the entry within its transaction's submission order
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

/// A balanced group of ledger entries committed as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub actor_id: ActorId,
    pub actor_type: ActorType,
    pub created_at: DateTime<Utc>,
    /// Entries in submission order
    pub entries: Vec<LedgerEntry>,
}

impl Transaction {
    /// Builds a transaction from already validated entries
    ///
    /// Every entry shares the transaction's timestamp and receives its
    /// submission index as `position`. The timestamp is cut to microseconds,
    /// the precision of `TIMESTAMPTZ`, so the returned value equals what a
    /// later read loads back.
    pub(crate) fn from_proposed(
        description: impl Into<String>,
        actor_id: ActorId,
        actor_type: ActorType,
        entries: &[ProposedEntry],
    ) -> Result<Self, ValidationError> {
        let id = TransactionId::new_v7();
        let created_at = Utc::now().trunc_subsecs(6);
        let entries = entries
            .iter()
            .enumerate()
            .map(|(position, proposed)| {
                let position = u32::try_from(position)
                    .map_err(|_| ValidationError::InvalidEntryCount { count: entries.len() })?;
                Ok(LedgerEntry {
                    id: LedgerEntryId::new_v7(),
                    transaction_id: id,
                    account_id: proposed.account_id,
                    amount: proposed.amount.clone(),
                    position,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self {
            id,
            description: description.into(),
            actor_id,
            actor_type,
            created_at,
            entries,
        })
    }

    /// Distinct accounts touched, in ascending id order
    pub fn account_ids(&self) -> BTreeSet<AccountId> {
        self.entries.iter().map(|e| e.account_id).collect()
    }

    /// Sum of all entry amounts
    pub fn total(&self) -> MinorUnits {
        self.entries.iter().map(|e| &e.amount).sum()
    }

    /// Returns true if the entries sum to zero
    pub fn is_balanced(&self) -> bool {
        self.total().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_proposed_keeps_submission_order() {
        let a = AccountId::new();
        let b = AccountId::new();
        let proposed = vec![ProposedEntry::new(b, 2500), ProposedEntry::new(a, -2500)];

        let tx = Transaction::from_proposed("rent", ActorId::new(), ActorType::User, &proposed).unwrap();

        assert_eq!(tx.entries.len(), 2);
        assert_eq!(tx.entries[0].account_id, b);
        assert_eq!(tx.entries[0].position, 0);
        assert_eq!(tx.entries[1].account_id, a);
        assert_eq!(tx.entries[1].position, 1);
        assert!(tx.entries.iter().all(|e| e.transaction_id == tx.id));
        assert!(tx.entries.iter().all(|e| e.created_at == tx.created_at));
        assert!(tx.is_balanced());
    }

    #[test]
    fn test_timestamps_fit_database_precision() {
        let proposed = vec![
            ProposedEntry::new(AccountId::new(), 100),
            ProposedEntry::new(AccountId::new(), -100),
        ];

        for _ in 0..20 {
            let tx = Transaction::from_proposed("tick", ActorId::new(), ActorType::System, &proposed)
                .unwrap();
            assert_eq!(tx.created_at.timestamp_subsec_nanos() % 1_000, 0);
            assert!(tx.entries.iter().all(|e| e.created_at == tx.created_at));
        }
    }

    #[test]
    fn test_actor_type_parsing() {
        assert_eq!("webhook".parse::<ActorType>().unwrap(), ActorType::Webhook);
        assert_eq!(ActorType::System.to_string(), "SYSTEM");
        assert!("robot".parse::<ActorType>().is_err());
    }
}
