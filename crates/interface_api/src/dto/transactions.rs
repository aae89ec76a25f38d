//! Transaction DTOs

use chrono::{DateTime, Utc};
use core_kernel::{AccountId, ActorId, LedgerEntryId, MinorUnits, TransactionId};
use domain_ledger::{ActorType, LedgerEntry, Page, ProposedEntry, Transaction, TransactionFilter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitTransactionRequest {
    #[serde(default)]
    pub description: String,
    pub entries: Vec<EntryRequest>,
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub account_id: AccountId,
    pub amount: MinorUnits,
}

impl From<EntryRequest> for ProposedEntry {
    fn from(entry: EntryRequest) -> Self {
        ProposedEntry::new(entry.account_id, entry.amount)
    }
}

/// Query string of the listing route
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    pub account_id: Option<AccountId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ListTransactionsQuery> for TransactionFilter {
    fn from(query: ListTransactionsQuery) -> Self {
        TransactionFilter {
            account_id: query.account_id,
            page: query.page,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: LedgerEntryId,
    pub account_id: AccountId,
    pub amount: MinorUnits,
    pub position: u32,
}

impl From<LedgerEntry> for EntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            position: entry.position,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub description: String,
    pub actor_id: ActorId,
    pub actor_type: ActorType,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<EntryResponse>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            description: transaction.description,
            actor_id: transaction.actor_id,
            actor_type: transaction.actor_type,
            created_at: transaction.created_at,
            entries: transaction.entries.into_iter().map(EntryResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionPageResponse {
    pub items: Vec<TransactionResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<Page<Transaction>> for TransactionPageResponse {
    fn from(page: Page<Transaction>) -> Self {
        let total_pages = page.total_pages();
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages,
            items: page.items.into_iter().map(TransactionResponse::from).collect(),
        }
    }
}
