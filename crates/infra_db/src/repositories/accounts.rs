//! Account repository
//!
//! Account rows carry the cached balance. Registration inserts with a zero
//! balance; afterwards the balance changes only through a locked unit of
//! work or an explicit administrative overwrite.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const ACCOUNT_COLUMNS: &str = "id, owner_id, account_type, currency, balance, created_at";

/// Repository for the `accounts` table
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Creates a new AccountRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers an account with a zero balance
    pub async fn create(&self, account: NewAccount) -> Result<AccountRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO accounts (id, owner_id, account_type, currency, balance, created_at) \
             VALUES ($1, $2, $3, $4, 0, $5) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.id)
            .bind(account.owner_id)
            .bind(account.account_type)
            .bind(&account.currency)
            .bind(account.created_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Loads one account without locking it
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AccountRow>, DatabaseError> {
        Self::fetch_by_id(&self.pool, id).await
    }

    /// Loads several accounts; missing ids are absent from the result
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<AccountRow>, DatabaseError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1) ORDER BY id");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Overwrites the cached balance outside any unit of work
    pub async fn overwrite_balance(&self, id: Uuid, balance: &BigDecimal) -> Result<(), DatabaseError> {
        Self::write_balance(&self.pool, id, balance).await
    }

    /// Locks an account row for the rest of the surrounding transaction
    ///
    /// Uses `FOR NO KEY UPDATE`: exclusive against other lockers and
    /// writers, but compatible with the `KEY SHARE` locks that inserting
    /// ledger entries takes through their foreign key.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR NO KEY UPDATE");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<AccountRow>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub(crate) async fn write_balance<'e, E>(
        executor: E,
        id: Uuid,
        balance: &BigDecimal,
    ) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE accounts SET balance = $2 WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Account", id));
        }
        Ok(())
    }
}

/// Database row for an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub account_type: AccountType,
    pub currency: String,
    pub balance: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// Data for registering an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub account_type: AccountType,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Account type enum for database
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "UPPERCASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
}
