//! PostgreSQL Ledger Adapter
//!
//! Implements every ledger storage port on top of the repositories.
//!
//! # Units of work
//!
//! Each [`PgUnitOfWork`] owns one `sqlx::Transaction`. The first statement
//! of every unit sets a transaction-local `lock_timeout`, so a unit that
//! waits too long for an account row fails with SQLSTATE 55P03, which is
//! reported as a conflict. Dropping an uncommitted unit rolls it back.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::{LedgerStorage, TransactionCoordinator};
//! use std::sync::Arc;
//!
//! let store = PostgresLedgerStore::new(pool, Duration::from_secs(5));
//! let coordinator = TransactionCoordinator::new(Arc::new(store));
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, ActorId, AdapterHealth, Currency, DomainPort, HealthCheckResult, HealthCheckable,
    LedgerEntryId, MinorUnits, PortError, TransactionId,
};
use domain_ledger::{
    Account, AccountStore, AccountType, ActorType, LedgerEntry, LedgerStore, Page, PageRequest,
    Transaction, TransactionStore, UnitOfWork, UnitOfWorkProvider,
};

use crate::error::DatabaseError;
use crate::numeric::{from_numeric, to_numeric};
use crate::repositories::accounts::AccountType as DbAccountType;
use crate::repositories::transactions::ActorType as DbActorType;
use crate::repositories::{
    AccountRepository, AccountRow, LedgerEntryRepository, LedgerEntryRow, NewAccount,
    TransactionRepository, TransactionRow,
};

/// PostgreSQL-backed implementation of the ledger storage ports
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
    accounts: AccountRepository,
    transactions: TransactionRepository,
    entries: LedgerEntryRepository,
}

impl PostgresLedgerStore {
    /// Creates the adapter; `lock_timeout` bounds row lock waits per unit
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            entries: LedgerEntryRepository::new(pool.clone()),
            pool,
            lock_timeout,
        }
    }

    /// Registers a new account with a zero balance
    #[instrument(skip(self), fields(owner_id = %owner_id))]
    pub async fn register_account(
        &self,
        owner_id: ActorId,
        account_type: AccountType,
        currency: Currency,
    ) -> Result<Account, PortError> {
        let row = self
            .accounts
            .create(NewAccount {
                id: Uuid::now_v7(),
                owner_id: owner_id.into(),
                account_type: account_type_to_db(account_type),
                currency: currency.code().to_string(),
                created_at: Utc::now(),
            })
            .await?;
        row_to_account(row)
    }

    async fn assemble(&self, headers: Vec<TransactionRow>) -> Result<Vec<Transaction>, PortError> {
        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let rows = self.entries.find_by_transactions(&ids).await?;

        let mut by_transaction: HashMap<Uuid, Vec<LedgerEntry>> = HashMap::new();
        for row in rows {
            let transaction_id = row.transaction_id;
            by_transaction
                .entry(transaction_id)
                .or_default()
                .push(row_to_entry(row)?);
        }

        headers
            .into_iter()
            .map(|header| {
                let entries = by_transaction.remove(&header.id).unwrap_or_default();
                Ok(row_to_transaction(header, entries))
            })
            .collect()
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    /// Checks database connectivity with `SELECT 1`
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-ledger-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl AccountStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(count = ids.len()))]
    async fn find_accounts(&self, ids: &[AccountId]) -> Result<Vec<Account>, PortError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
        let rows = self.accounts.find_by_ids(&ids).await?;
        rows.into_iter().map(row_to_account).collect()
    }

    #[instrument(skip(self), fields(account_id = %id))]
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError> {
        self.accounts
            .find_by_id(id.into())
            .await?
            .map(row_to_account)
            .transpose()
    }

    #[instrument(skip(self, balance), fields(account_id = %id))]
    async fn update_balance(&self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError> {
        self.accounts
            .overwrite_balance(id.into(), &to_numeric(balance))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn entries_by_account(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError> {
        let rows = self.entries.find_by_account(account_id.into()).await?;
        rows.into_iter().map(row_to_entry).collect()
    }

    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    async fn entries_by_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let rows = self.entries.find_by_transaction(transaction_id.into()).await?;
        rows.into_iter().map(row_to_entry).collect()
    }
}

#[async_trait]
impl TransactionStore for PostgresLedgerStore {
    #[instrument(skip(self), fields(transaction_id = %id))]
    async fn find_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, PortError> {
        let Some(header) = self.transactions.find_by_id(id.into()).await? else {
            return Ok(None);
        };
        let rows = self.entries.find_by_transaction(header.id).await?;
        let entries = rows.into_iter().map(row_to_entry).collect::<Result<Vec<_>, _>>()?;
        Ok(Some(row_to_transaction(header, entries)))
    }

    #[instrument(skip(self, request), fields(owner_id = %owner_id, page = request.page, limit = request.limit))]
    async fn transactions_by_owner(
        &self,
        owner_id: ActorId,
        account_id: Option<AccountId>,
        request: PageRequest,
    ) -> Result<Page<Transaction>, PortError> {
        let offset = i64::try_from(request.offset())
            .map_err(|_| PortError::validation("page offset out of range"))?;
        let (headers, total) = self
            .transactions
            .find_by_owner(
                owner_id.into(),
                account_id.map(Uuid::from),
                i64::from(request.limit),
                offset,
            )
            .await?;
        debug!(rows = headers.len(), total, "Loaded transaction page");

        let items = self.assemble(headers).await?;
        Ok(Page::new(items, request, total.max(0) as u64))
    }
}

#[async_trait]
impl UnitOfWorkProvider for PostgresLedgerStore {
    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// A unit of work backed by one PostgreSQL transaction
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.id))]
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), PortError> {
        let row = TransactionRow {
            id: transaction.id.into(),
            description: transaction.description.clone(),
            actor_id: transaction.actor_id.into(),
            actor_type: actor_type_to_db(transaction.actor_type),
            created_at: transaction.created_at,
        };
        TransactionRepository::insert(&mut self.tx, &row).await?;
        Ok(())
    }

    #[instrument(skip(self, entry), fields(account_id = %entry.account_id, position = entry.position))]
    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<(), PortError> {
        let position = i32::try_from(entry.position)
            .map_err(|_| PortError::validation("entry position out of range"))?;
        let row = LedgerEntryRow {
            id: entry.id.into(),
            transaction_id: entry.transaction_id.into(),
            account_id: entry.account_id.into(),
            amount: to_numeric(&entry.amount),
            position,
            created_at: entry.created_at,
        };
        LedgerEntryRepository::insert(&mut self.tx, &row).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id))]
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        AccountRepository::lock_for_update(&mut self.tx, id.into())
            .await?
            .map(row_to_account)
            .transpose()
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    async fn entries_for_account(&mut self, account_id: AccountId) -> Result<Vec<LedgerEntry>, PortError> {
        let rows = LedgerEntryRepository::fetch_by_account(&mut *self.tx, account_id.into()).await?;
        rows.into_iter().map(row_to_entry).collect()
    }

    #[instrument(skip(self, balance), fields(account_id = %id))]
    async fn update_balance(&mut self, id: AccountId, balance: &MinorUnits) -> Result<(), PortError> {
        AccountRepository::write_balance(&mut *self.tx, id.into(), &to_numeric(balance)).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

// ============================================================================
// Row <-> domain mapping
// ============================================================================

fn row_to_account(row: AccountRow) -> Result<Account, PortError> {
    let currency = Currency::new(&row.currency)
        .map_err(|e| PortError::validation(format!("account {}: {}", row.id, e)))?;
    Ok(Account {
        id: AccountId::from(row.id),
        owner_id: ActorId::from(row.owner_id),
        account_type: account_type_from_db(row.account_type),
        currency,
        balance: from_numeric(row.balance)?,
        created_at: row.created_at,
    })
}

fn row_to_entry(row: LedgerEntryRow) -> Result<LedgerEntry, PortError> {
    let position = u32::try_from(row.position)
        .map_err(|_| PortError::validation(format!("entry {} has negative position", row.id)))?;
    Ok(LedgerEntry {
        id: LedgerEntryId::from(row.id),
        transaction_id: TransactionId::from(row.transaction_id),
        account_id: AccountId::from(row.account_id),
        amount: from_numeric(row.amount)?,
        position,
        created_at: row.created_at,
    })
}

fn row_to_transaction(row: TransactionRow, entries: Vec<LedgerEntry>) -> Transaction {
    Transaction {
        id: TransactionId::from(row.id),
        description: row.description,
        actor_id: ActorId::from(row.actor_id),
        actor_type: actor_type_from_db(row.actor_type),
        created_at: row.created_at,
        entries,
    }
}

fn account_type_to_db(account_type: AccountType) -> DbAccountType {
    match account_type {
        AccountType::Asset => DbAccountType::Asset,
        AccountType::Liability => DbAccountType::Liability,
        AccountType::Equity => DbAccountType::Equity,
    }
}

fn account_type_from_db(account_type: DbAccountType) -> AccountType {
    match account_type {
        DbAccountType::Asset => AccountType::Asset,
        DbAccountType::Liability => AccountType::Liability,
        DbAccountType::Equity => AccountType::Equity,
    }
}

fn actor_type_to_db(actor_type: ActorType) -> DbActorType {
    match actor_type {
        ActorType::User => DbActorType::User,
        ActorType::System => DbActorType::System,
        ActorType::Webhook => DbActorType::Webhook,
    }
}

fn actor_type_from_db(actor_type: DbActorType) -> ActorType {
    match actor_type {
        DbActorType::User => ActorType::User,
        DbActorType::System => ActorType::System,
        DbActorType::Webhook => ActorType::Webhook,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_row_to_account_maps_every_field() {
        let row = AccountRow {
            id: Uuid::now_v7(),
            owner_id: Uuid::new_v4(),
            account_type: DbAccountType::Liability,
            currency: "EUR".to_string(),
            balance: BigDecimal::from_str("-250").unwrap(),
            created_at: Utc::now(),
        };

        let account = row_to_account(row.clone()).unwrap();
        assert_eq!(Uuid::from(account.id), row.id);
        assert_eq!(account.account_type, AccountType::Liability);
        assert_eq!(account.currency, Currency::EUR);
        assert_eq!(account.balance, MinorUnits::from(-250));
    }

    #[test]
    fn test_row_with_bad_currency_is_rejected() {
        let row = AccountRow {
            id: Uuid::now_v7(),
            owner_id: Uuid::new_v4(),
            account_type: DbAccountType::Asset,
            currency: "usd".to_string(),
            balance: BigDecimal::from(0),
            created_at: Utc::now(),
        };
        assert!(matches!(row_to_account(row), Err(PortError::Validation { .. })));
    }

    #[test]
    fn test_enum_mapping_round_trips() {
        for account_type in [AccountType::Asset, AccountType::Liability, AccountType::Equity] {
            assert_eq!(account_type_from_db(account_type_to_db(account_type)), account_type);
        }
        for actor_type in [ActorType::User, ActorType::System, ActorType::Webhook] {
            assert_eq!(actor_type_from_db(actor_type_to_db(actor_type)), actor_type);
        }
    }
}
