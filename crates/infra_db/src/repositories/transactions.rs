//! Transaction repository
//!
//! Transaction headers only; entries live in `ledger_entries` and are loaded
//! by [`LedgerEntryRepository`](super::LedgerEntryRepository).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const TRANSACTION_COLUMNS: &str = "t.id, t.description, t.actor_id, t.actor_type, t.created_at";

// A transaction is visible to an owner if any of its entries touches one of
// the owner's accounts; $2 optionally narrows to one account.
const OWNER_FILTER: &str = "\
    EXISTS (SELECT 1 FROM ledger_entries e JOIN accounts a ON a.id = e.account_id \
            WHERE e.transaction_id = t.id AND a.owner_id = $1) \
    AND ($2::uuid IS NULL OR EXISTS (SELECT 1 FROM ledger_entries f \
            WHERE f.transaction_id = t.id AND f.account_id = $2))";

/// Repository for the `transactions` table
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads one transaction header
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TransactionRow>, DatabaseError> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE t.id = $1");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// One page of headers visible to `owner_id`, newest first, plus the total count
    pub async fn find_by_owner(
        &self,
        owner_id: Uuid,
        account_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<TransactionRow>, i64), DatabaseError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions t WHERE {OWNER_FILTER} \
             ORDER BY t.created_at DESC, t.id DESC LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(owner_id)
            .bind(account_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM transactions t WHERE {OWNER_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(owner_id)
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Inserts a header inside the caller's transaction
    pub async fn insert(conn: &mut PgConnection, row: &TransactionRow) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO transactions (id, description, actor_id, actor_type, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(row.id)
        .bind(&row.description)
        .bind(row.actor_id)
        .bind(row.actor_type)
        .bind(row.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}

/// Database row for a transaction header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub description: String,
    pub actor_id: Uuid,
    pub actor_type: ActorType,
    pub created_at: DateTime<Utc>,
}

/// Actor type enum for database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "actor_type", rename_all = "UPPERCASE")]
pub enum ActorType {
    User,
    System,
    Webhook,
}
