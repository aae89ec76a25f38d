//! Ledger entry repository
//!
//! Entries are append-only: this repository inserts and reads, nothing else.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const ENTRY_COLUMNS: &str = "id, transaction_id, account_id, amount, position, created_at";

/// Repository for the `ledger_entries` table
#[derive(Debug, Clone)]
pub struct LedgerEntryRepository {
    pool: PgPool,
}

impl LedgerEntryRepository {
    /// Creates a new LedgerEntryRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entries of one account, oldest first
    pub async fn find_by_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntryRow>, DatabaseError> {
        Self::fetch_by_account(&self.pool, account_id).await
    }

    /// Entries of one transaction in submission order
    pub async fn find_by_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<LedgerEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE transaction_id = $1 ORDER BY position"
        );
        let rows = sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Entries of several transactions, grouped by transaction in submission order
    pub async fn find_by_transactions(
        &self,
        transaction_ids: &[Uuid],
    ) -> Result<Vec<LedgerEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE transaction_id = ANY($1) \
             ORDER BY transaction_id, position"
        );
        let rows = sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(transaction_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts one entry inside the caller's transaction
    pub async fn insert(conn: &mut PgConnection, entry: &LedgerEntryRow) -> Result<(), DatabaseError> {
        let sql = format!("INSERT INTO ledger_entries ({ENTRY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)");
        sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.transaction_id)
            .bind(entry.account_id)
            .bind(&entry.amount)
            .bind(entry.position)
            .bind(entry.created_at)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn fetch_by_account<'e, E>(
        executor: E,
        account_id: Uuid,
    ) -> Result<Vec<LedgerEntryRow>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE account_id = $1 \
             ORDER BY created_at, transaction_id, position"
        );
        let rows = sqlx::query_as::<_, LedgerEntryRow>(&sql)
            .bind(account_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }
}

/// Database row for a ledger entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerEntryRow {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
